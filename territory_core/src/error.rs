//! Error types for the territory engine.
//!
//! Tracking outcomes (speed aborts, validation failures) are reported as
//! values, not errors. This type only covers inputs the engine refuses to
//! touch and configuration problems.

use thiserror::Error;

/// Errors surfaced by the territory engine.
#[derive(Debug, Error)]
pub enum TerritoryError {
    /// A coordinate or timestamp that cannot be used (NaN, out of range)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration values that contradict each other or are out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration document could not be parsed
    #[error("Config parse error: {0}")]
    Config(#[from] serde_json::Error),
}

impl TerritoryError {
    /// Creates an invalid-input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Creates an invalid-config error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

/// Convenience alias used throughout the engine.
pub type Result<T> = std::result::Result<T, TerritoryError>;
