use thiserror::Error;

/// Errors raised validating a [`crate::config::Config`] before it is handed
/// to the engine. These are boundary errors -- malformed input from whatever
/// assembled the configuration record -- not simulation invariant failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field}: range minimum {min} exceeds maximum {max}")]
    InvalidRange { field: &'static str, min: i64, max: i64 },

    #[error("{field}: probability {value} is outside [0.0, 1.0]")]
    InvalidProbability { field: &'static str, value: String },

    #[error("grid dimensions must be positive, got {width}x{height}")]
    InvalidGridSize { width: i32, height: i32 },

    #[error("teams must be non-empty and every team needs at least one agent")]
    EmptyTeams,
}
