//! Rank-gated status and fatal reporting
//!
//! When many processes run the same program in lockstep only the
//! coordinating rank writes; every other rank treats a report as a no-op.

use crate::error::{Error, Result};
use std::env;
use std::fmt;
use std::io::{self, Write};

/// Rank that performs all non-duplicated output
pub const COORDINATOR_RANK: usize = 0;

/// Message carried by the fatal result of [`Reporter::log_err`]
pub const FATAL_INPUT_MESSAGE: &str = "Aborting after error from input. See error file.";

/// Launcher variables checked by [`ProcessContext::from_env`], rank first
const LAUNCHER_VARS: [(&str, &str); 3] = [
    ("OMPI_COMM_WORLD_RANK", "OMPI_COMM_WORLD_SIZE"),
    ("PMI_RANK", "PMI_SIZE"),
    ("SLURM_PROCID", "SLURM_NTASKS"),
];

/// Identity of this process among its cooperating peers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessContext {
    rank: usize,
    size: usize,
}

impl ProcessContext {
    pub fn new(rank: usize, size: usize) -> Self {
        Self { rank, size }
    }

    /// A lone process, which is also the coordinator
    pub fn single() -> Self {
        Self::new(COORDINATOR_RANK, 1)
    }

    /// Read rank and size exported by common MPI and batch launchers.
    ///
    /// Falls back to [`ProcessContext::single`] outside a launcher.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        for (rank_var, size_var) in LAUNCHER_VARS {
            let rank = lookup(rank_var).and_then(|s| s.trim().parse::<usize>().ok());
            if let Some(rank) = rank {
                let size = lookup(size_var)
                    .and_then(|s| s.trim().parse::<usize>().ok())
                    .unwrap_or(rank + 1);
                return Self::new(rank, size.max(rank + 1));
            }
        }
        Self::single()
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_coordinator(&self) -> bool {
        self.rank == COORDINATOR_RANK
    }
}

impl Default for ProcessContext {
    fn default() -> Self {
        Self::single()
    }
}

/// Writes to a stream only on the coordinating rank
#[derive(Debug)]
pub struct Reporter<W: Write> {
    context: ProcessContext,
    stream: W,
}

impl Reporter<io::Stdout> {
    pub fn stdout(context: ProcessContext) -> Self {
        Self::new(context, io::stdout())
    }
}

impl Reporter<io::Stderr> {
    pub fn stderr(context: ProcessContext) -> Self {
        Self::new(context, io::stderr())
    }
}

impl<W: Write> Reporter<W> {
    pub fn new(context: ProcessContext, stream: W) -> Self {
        Self { context, stream }
    }

    pub fn context(&self) -> ProcessContext {
        self.context
    }

    pub fn stream(&self) -> &W {
        &self.stream
    }

    pub fn into_inner(self) -> W {
        self.stream
    }

    /// Write the fragments in order followed by a newline
    pub fn log(&mut self, fragments: &[&dyn fmt::Display]) -> io::Result<()> {
        if !self.context.is_coordinator() {
            return Ok(());
        }
        self.write_fragments(fragments)
    }

    /// Format-string flavour of [`Reporter::log`], see [`report!`](crate::report!)
    pub fn log_fmt(&mut self, args: fmt::Arguments<'_>) -> io::Result<()> {
        if !self.context.is_coordinator() {
            return Ok(());
        }
        self.stream.write_fmt(args)?;
        writeln!(self.stream)
    }

    /// Report a fatal input error.
    ///
    /// The coordinator writes the fragments and gets back
    /// [`Error::FatalInput`]. Other ranks write nothing and get `Ok(())`;
    /// bringing them down is up to the launcher.
    pub fn log_err(&mut self, fragments: &[&dyn fmt::Display]) -> Result<()> {
        if !self.context.is_coordinator() {
            return Ok(());
        }
        self.write_fragments(fragments)?;
        self.stream.flush()?;
        Err(Error::FatalInput(FATAL_INPUT_MESSAGE.to_string()))
    }

    fn write_fragments(&mut self, fragments: &[&dyn fmt::Display]) -> io::Result<()> {
        for fragment in fragments {
            write!(self.stream, "{}", fragment)?;
        }
        writeln!(self.stream)
    }
}

/// `report!(reporter, "step {} done", n)` writes a line on the coordinator only
#[macro_export]
macro_rules! report {
    ($reporter:expr, $($arg:tt)*) => {
        $reporter.log_fmt(format_args!($($arg)*))
    };
}
