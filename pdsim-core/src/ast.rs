use crate::diagnostics::Span;
use crate::execution::Execution;
use glam::DVec3;

/// A parsed input deck
#[derive(Debug, Clone)]
pub struct Deck {
    pub timestep: TimestepDecl,
    pub steps: u64,
    pub execution: Execution,
    /// Report status every this many steps; 0 reports only the summary
    pub report_every: u64,
    pub force: ForceDecl,
    pub particles: Vec<ParticleDecl>,
}

/// `timestep dt = 0.001 mvv2e = 1.0`
#[derive(Debug, Clone, Copy)]
pub struct TimestepDecl {
    pub dt: f64,
    pub mvv2e: f64,
    pub span: Option<Span>,
}

/// Force stage selected by the deck
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ForceDecl {
    #[default]
    None,
    /// `force body (fx, fy, fz)`
    Body(DVec3),
}

/// `particle at (x, y, z) velocity (vx, vy, vz) density d volume v type t`
#[derive(Debug, Clone, Copy)]
pub struct ParticleDecl {
    pub position: DVec3,
    pub velocity: DVec3,
    pub density: f64,
    pub volume: f64,
    pub kind: i32,
    pub span: Option<Span>,
}
