use crate::parser::ParseError;
use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced at the boundary of the integration kernel.
///
/// The kernel itself never returns one of these; they come from parsing the
/// input deck, validating particle preconditions, and fatal reporting.
#[derive(Debug, Error)]
pub enum Error {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Precondition check failed before integration started.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Fatal input error raised by the coordinating process.
    #[error("{0}")]
    FatalInput(String),

    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
