//! Precondition checks run before any integration
//!
//! The integrator trusts its inputs, so every division-domain and
//! finiteness requirement is enforced here at the boundary.

use crate::ast::{Deck, ForceDecl};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::particles::Particles;

/// Check deck-level parameters and every declared particle
pub fn check_deck(deck: &Deck) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();
    let ts = &deck.timestep;

    if !ts.dt.is_finite() || ts.dt <= 0.0 {
        diagnostics.push(Diagnostic::error(
            format!("timestep dt must be finite and > 0, got {}", ts.dt),
            ts.span,
        ));
    }
    if !ts.mvv2e.is_finite() || ts.mvv2e <= 0.0 {
        diagnostics.push(Diagnostic::error(
            format!("mvv2e must be finite and > 0, got {}", ts.mvv2e),
            ts.span,
        ));
    }

    if let ForceDecl::Body(f) = deck.force {
        if !f.is_finite() {
            diagnostics.push(Diagnostic::error(
                format!("body force must be finite, got {}", f),
                None,
            ));
        }
    }

    if deck.steps == 0 {
        diagnostics.push(Diagnostic::warning("steps is 0, nothing will be integrated", None));
    }
    if deck.particles.is_empty() {
        diagnostics.push(Diagnostic::warning("deck declares no particles", None));
    }

    for (i, p) in deck.particles.iter().enumerate() {
        if !(p.density > 0.0) {
            diagnostics.push(Diagnostic::error(
                format!("particle {}: density must be > 0, got {}", i, p.density),
                p.span,
            ));
        }
        if !(p.volume > 0.0) {
            diagnostics.push(Diagnostic::error(
                format!("particle {}: volume must be > 0, got {}", i, p.volume),
                p.span,
            ));
        }
        if !p.position.is_finite() || !p.velocity.is_finite() {
            diagnostics.push(Diagnostic::error(
                format!("particle {}: position and velocity must be finite", i),
                p.span,
            ));
        }
    }

    diagnostics
}

/// Check the live particle store before an integration call
pub fn check_particles(particles: &Particles) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();

    let density = particles.density();
    let volume = particles.volume();
    for i in 0..particles.len() {
        // `!(a > 0)` also rejects NaN
        if !(density[i] > 0.0) {
            diagnostics.push(Diagnostic::error(
                format!("particle {}: density must be > 0, got {}", i, density[i]),
                None,
            ));
        }
        if !(volume[i] > 0.0) {
            diagnostics.push(Diagnostic::error(
                format!("particle {}: volume must be > 0, got {}", i, volume[i]),
                None,
            ));
        }
        if !particles.x()[i].is_finite() || !particles.v()[i].is_finite() {
            diagnostics.push(Diagnostic::error(
                format!("particle {}: position and velocity must be finite", i),
                None,
            ));
        }
    }

    diagnostics
}
