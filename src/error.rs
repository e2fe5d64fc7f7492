use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the simulation core, the driver and the trajectory I/O.
///
/// Every fallible operation returns this instead of panicking. Each variant
/// carries enough context to be actionable.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid run configuration or material parameter.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Total transition rate is zero or negative (typically: no active defects left).
    ///
    /// This is recoverable; the driver turns it into an early, reported termination.
    #[error("degenerate rate state: total transition rate {gtot} <= 0")]
    DegenerateRate { gtot: f64 },

    /// The position or rate arrays could not be allocated.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Malformed trajectory input.
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Propagated I/O errors from trajectory sinks and readers.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<std::collections::TryReserveError> for Error {
    fn from(e: std::collections::TryReserveError) -> Self {
        Error::ResourceExhausted(e.to_string())
    }
}
