use thiserror::Error;

/// Errors raised when a simulation cannot be set up or its results cannot be
/// exported.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CsmaError {
    /// Poisson arrival rate must be a positive, finite number of packets/s.
    #[error("Invalid arrival rate: {0} (must be > 0)")]
    InvalidArrivalRate(f64),
    /// Simulation horizon must be a non-negative, finite number of seconds.
    #[error("Invalid horizon: {0} (must be >= 0)")]
    InvalidHorizon(f64),
    /// A channel constant is out of range.
    #[error("Invalid channel configuration: {0}")]
    InvalidChannel(String),
    /// An explicit arrival schedule is negative, non-finite or out of order.
    #[error("Invalid schedule for node {node}: {reason}")]
    InvalidSchedule { node: usize, reason: String },
    /// Scenario file could not be parsed.
    #[error("Scenario error: {0}")]
    Scenario(String),
    /// An I/O error occurred while reading scenarios or writing results.
    #[error("I/O error: {0}")]
    Io(String),
}

/// A type alias for `Result<T, CsmaError>`.
pub type CsmaResult<T> = Result<T, CsmaError>;

impl From<std::io::Error> for CsmaError {
    fn from(err: std::io::Error) -> Self {
        CsmaError::Io(err.to_string())
    }
}

impl From<serde_yaml::Error> for CsmaError {
    fn from(err: serde_yaml::Error) -> Self {
        CsmaError::Scenario(err.to_string())
    }
}
