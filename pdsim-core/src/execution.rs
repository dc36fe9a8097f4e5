use std::fmt;
use std::str::FromStr;

/// Where a per-particle kernel runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Execution {
    /// One thread, particles visited in index order
    Serial,
    /// Data-parallel over the rayon global pool
    #[default]
    Threads,
}

impl fmt::Display for Execution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Execution::Serial => write!(f, "serial"),
            Execution::Threads => write!(f, "threads"),
        }
    }
}

impl FromStr for Execution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "serial" => Ok(Execution::Serial),
            "threads" => Ok(Execution::Threads),
            other => Err(format!("Unknown execution backend: {}", other)),
        }
    }
}
