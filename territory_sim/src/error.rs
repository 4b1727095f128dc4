//! Error type for the simulation CLI.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid tracking config: {0}")]
    Config(#[from] territory_core::TerritoryError),

    #[error("{0}")]
    UnknownScenario(String),

    #[error("Usage: {0}")]
    Usage(String),
}

pub type Result<T> = std::result::Result<T, SimError>;
