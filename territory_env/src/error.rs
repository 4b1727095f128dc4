//! Error types for the territory environment abstraction.

use thiserror::Error;

/// Errors that can occur in the environment abstraction layer.
#[derive(Debug, Error)]
pub enum EnvError {
    /// The location feed has been closed by the host
    #[error("Location source closed")]
    SourceClosed,

    /// The location provider could not deliver a fix (permissions, no signal)
    #[error("Location unavailable: {0}")]
    LocationUnavailable(String),
}

impl EnvError {
    /// Creates a location-unavailable error.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::LocationUnavailable(msg.into())
    }
}
