//! Error types for PulseChain

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    /// A freshly built or submitted block does not link to its predecessor.
    #[error("Invalid block: {0}")]
    InvalidBlock(String),

    /// A candidate chain failed integrity checks.
    #[error("Invalid chain: {0}")]
    InvalidChain(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for ChainError {
    fn from(err: toml::de::Error) -> Self {
        ChainError::Config(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ChainError>;
