use crate::ast::{Deck, ForceDecl, ParticleDecl, TimestepDecl};
use crate::diagnostics::Span;
use crate::execution::Execution;
use glam::DVec3;
use std::str::FromStr;
use thiserror::Error;

/// Parse error with optional span information
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{message}")]
    SyntaxError {
        message: String,
        span: Option<Span>,
    },
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Option<Span>) -> Self {
        Self::SyntaxError {
            message: message.into(),
            span,
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self::SyntaxError {
            message: message.into(),
            span: None,
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Self::SyntaxError { span, .. } => *span,
        }
    }
}

/// Helper to track byte offsets while parsing
struct ParseContext {
    line_offsets: Vec<usize>, // Byte offset of start of each line
    len: usize,
}

impl ParseContext {
    fn new(source: &str) -> Self {
        let mut line_offsets = vec![0];
        let mut offset = 0;
        for ch in source.chars() {
            offset += ch.len_utf8();
            if ch == '\n' {
                line_offsets.push(offset);
            }
        }
        Self {
            line_offsets,
            len: source.len(),
        }
    }

    fn line_start(&self, line: usize) -> usize {
        self.line_offsets.get(line).copied().unwrap_or(self.len)
    }

    /// Create a span for the entire line
    fn full_line_span(&self, line: usize) -> Span {
        Span::new(self.line_start(line), self.line_start(line + 1))
    }
}

/// Parse an input deck from source text
pub fn parse_deck(source: &str) -> Result<Deck, ParseError> {
    let ctx = ParseContext::new(source);
    let mut timestep = None;
    let mut steps = None;
    let mut execution = Execution::default();
    let mut report_every = 0;
    let mut force = ForceDecl::None;
    let mut particles = Vec::new();

    for (i, raw) in source.lines().enumerate() {
        let line = strip_comment(raw).trim();
        let span = Some(ctx.full_line_span(i));

        if line.is_empty() {
            continue;
        }

        let keyword = line.split_whitespace().next().unwrap_or("");
        match keyword {
            "timestep" => timestep = Some(parse_timestep(line, span)?),
            "steps" => steps = Some(parse_keyword_value::<u64>(line, "steps", span)?),
            "execution" => {
                let name = line["execution".len()..].trim();
                execution = name
                    .parse::<Execution>()
                    .map_err(|e| ParseError::new(e, span))?;
            }
            "report" => {
                let rest = line["report".len()..].trim();
                let every = rest.strip_prefix("every").ok_or_else(|| {
                    ParseError::new(format!("Expected 'every' in report: {}", line), span)
                })?;
                report_every = parse_number::<u64>(every.trim(), line, span)?;
            }
            "force" => force = parse_force(line, span)?,
            "particle" => particles.push(parse_particle(line, span)?),
            _ => {
                return Err(ParseError::new(
                    format!("Unexpected token: {}", keyword),
                    span,
                ));
            }
        }
    }

    let timestep = timestep
        .ok_or_else(|| ParseError::message("Missing 'timestep' declaration"))?;
    let steps = steps.ok_or_else(|| ParseError::message("Missing 'steps' declaration"))?;

    Ok(Deck {
        timestep,
        steps,
        execution,
        report_every,
        force,
        particles,
    })
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    }
}

/// Parse a timestep declaration: `timestep dt = x [mvv2e = y]`
///
/// Spaces around `=` are optional.
fn parse_timestep(line: &str, span: Option<Span>) -> Result<TimestepDecl, ParseError> {
    let rest = line
        .strip_prefix("timestep")
        .ok_or_else(|| ParseError::new("Expected 'timestep' keyword", span))?;

    let mut dt = None;
    // mvv2e is optional and defaults to 1
    let mut mvv2e = 1.0;

    for (key, value) in key_value_pairs(rest, line, span)? {
        match key {
            "dt" => dt = Some(parse_number::<f64>(value, line, span)?),
            "mvv2e" => mvv2e = parse_number::<f64>(value, line, span)?,
            other => {
                return Err(ParseError::new(
                    format!("Unexpected timestep attribute '{}': {}", other, line),
                    span,
                ));
            }
        }
    }

    let dt = dt.ok_or_else(|| {
        ParseError::new(format!("Expected 'dt =' in timestep: {}", line), span)
    })?;

    Ok(TimestepDecl { dt, mvv2e, span })
}

/// Split `a = 1 b=2` into `[("a", "1"), ("b", "2")]`
fn key_value_pairs<'a>(
    text: &'a str,
    line: &str,
    span: Option<Span>,
) -> Result<Vec<(&'a str, &'a str)>, ParseError> {
    let tokens: Vec<&str> = text
        .split(|c: char| c.is_whitespace() || c == '=')
        .filter(|t| !t.is_empty())
        .collect();

    if tokens.len() % 2 != 0 {
        return Err(ParseError::new(
            format!("Expected 'name = value' pairs: {}", line),
            span,
        ));
    }

    Ok(tokens.chunks(2).map(|pair| (pair[0], pair[1])).collect())
}

/// Parse a force declaration: `force body (fx, fy, fz)` or `force none`
fn parse_force(line: &str, span: Option<Span>) -> Result<ForceDecl, ParseError> {
    let rest = line
        .strip_prefix("force")
        .ok_or_else(|| ParseError::new("Expected 'force' keyword", span))?
        .trim();

    if rest == "none" {
        return Ok(ForceDecl::None);
    }

    let body = rest.strip_prefix("body").ok_or_else(|| {
        ParseError::new(
            format!("Unknown force type: {}", rest.split_whitespace().next().unwrap_or("")),
            span,
        )
    })?;
    let (value, _) = parse_vector(body, line, span)?;
    Ok(ForceDecl::Body(value))
}

/// Parse a particle declaration:
/// `particle at (x, y, z) [velocity (vx, vy, vz)] density d volume v [type t]`
fn parse_particle(line: &str, span: Option<Span>) -> Result<ParticleDecl, ParseError> {
    let rest = line
        .strip_prefix("particle")
        .ok_or_else(|| ParseError::new("Expected 'particle' keyword", span))?;

    let at_pos = rest.find("at ").ok_or_else(|| {
        ParseError::new(format!("Expected 'at' in particle declaration: {}", line), span)
    })?;
    let (position, rest) = parse_vector(&rest[at_pos + 3..], line, span)?;

    let (velocity, rest) = match rest.trim_start().strip_prefix("velocity") {
        Some(after) => parse_vector(after, line, span)?,
        None => (DVec3::ZERO, rest),
    };

    let mut density = None;
    let mut volume = None;
    let mut kind = 0;

    let tokens: Vec<&str> = rest.split_whitespace().collect();
    let mut t = 0;
    while t < tokens.len() {
        let value = tokens.get(t + 1).ok_or_else(|| {
            ParseError::new(format!("Expected value after '{}': {}", tokens[t], line), span)
        })?;
        match tokens[t] {
            "density" => density = Some(parse_number::<f64>(value, line, span)?),
            "volume" => volume = Some(parse_number::<f64>(value, line, span)?),
            "type" => kind = parse_number::<i32>(value, line, span)?,
            other => {
                return Err(ParseError::new(
                    format!("Unexpected particle attribute '{}': {}", other, line),
                    span,
                ));
            }
        }
        t += 2;
    }

    let density = density.ok_or_else(|| {
        ParseError::new(format!("Expected 'density' in particle declaration: {}", line), span)
    })?;
    let volume = volume.ok_or_else(|| {
        ParseError::new(format!("Expected 'volume' in particle declaration: {}", line), span)
    })?;

    Ok(ParticleDecl {
        position,
        velocity,
        density,
        volume,
        kind,
        span,
    })
}

/// Parse `(a, b, c)` at the start of `text`, returning the vector and the remainder
fn parse_vector<'a>(
    text: &'a str,
    line: &str,
    span: Option<Span>,
) -> Result<(DVec3, &'a str), ParseError> {
    let text = text.trim_start();
    let inner = text.strip_prefix('(').ok_or_else(|| {
        ParseError::new(format!("Expected '(' in vector: {}", line), span)
    })?;
    let end = inner.find(')').ok_or_else(|| {
        ParseError::new(format!("Expected ')' in vector: {}", line), span)
    })?;

    let coords: Vec<&str> = inner[..end].split(',').map(|s| s.trim()).collect();
    if coords.len() != 3 {
        return Err(ParseError::new(
            format!("Expected three components in vector: {}", line),
            span,
        ));
    }

    let x = parse_number::<f64>(coords[0], line, span)?;
    let y = parse_number::<f64>(coords[1], line, span)?;
    let z = parse_number::<f64>(coords[2], line, span)?;

    Ok((DVec3::new(x, y, z), &inner[end + 1..]))
}

/// Parse `keyword value` where the whole remainder is a single number
fn parse_keyword_value<T: FromStr>(
    line: &str,
    keyword: &str,
    span: Option<Span>,
) -> Result<T, ParseError> {
    let rest = line
        .strip_prefix(keyword)
        .ok_or_else(|| ParseError::new(format!("Expected '{}' keyword", keyword), span))?;
    parse_number(rest.trim(), line, span)
}

fn parse_number<T: FromStr>(text: &str, line: &str, span: Option<Span>) -> Result<T, ParseError> {
    text.parse::<T>().map_err(|_| {
        ParseError::new(format!("Invalid number '{}': {}", text, line), span)
    })
}
