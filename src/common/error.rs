//! Error types for trolley_sim
//!
//! Geometric degeneracies (too few waypoints, coincident points) and DARE
//! non-convergence are handled with fallbacks and never surface here.

use thiserror::Error;

/// Main error type for the simulation core
#[derive(Debug, Error)]
pub enum SimError {
    /// A parameter struct failed validation
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The tick time step was zero, negative or not finite
    #[error("Invalid time step: {0} s")]
    InvalidTimeStep(f64),

    /// Numerical computation failed (matrix inversion, etc.)
    #[error("Numerical error: {0}")]
    Numerical(String),

    /// A configuration file could not be parsed
    #[error("Cannot read the configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// gnuplot could not render a figure
    #[error("Plot error: {0}")]
    Plot(String),

    /// The global logger was already installed
    #[error("Logger error: {0}")]
    Logger(#[from] log::SetLoggerError),
}

/// Result type alias for simulation operations
pub type SimResult<T> = Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SimError::InvalidParameter("mass must be positive".to_string());
        assert_eq!(format!("{}", err), "Invalid parameter: mass must be positive");
        assert_eq!(format!("{}", SimError::InvalidTimeStep(-0.1)), "Invalid time step: -0.1 s");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SimError = io_err.into();
        assert!(matches!(err, SimError::Io(_)));
    }
}
