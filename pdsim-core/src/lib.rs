pub mod ast;
pub mod diagnostics;
pub mod error;
pub mod execution;
pub mod force;
pub mod integrator;
pub mod parser;
pub mod particles;
pub mod report;
pub mod runtime;
pub mod validate;

pub use diagnostics::{Diagnostic, DiagnosticSeverity, Diagnostics, Span};
pub use error::{Error, Result};
pub use execution::Execution;
pub use force::{BodyForce, FnForce, ForceStage, NoForce};
pub use integrator::Integrator;
pub use parser::{parse_deck, ParseError};
pub use particles::{ForceView, IntegrationView, ParticleInit, Particles};
pub use report::{ProcessContext, Reporter, COORDINATOR_RANK};
pub use runtime::{build_simulation, run_deck, run_parsed, RunSummary, Simulation};
pub use validate::{check_deck, check_particles};
