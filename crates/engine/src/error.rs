//! Engine error types

use slowsql_core::ConfigError;
use thiserror::Error;

/// Errors raised while building or running a sampler
#[derive(Debug, Error)]
pub enum EngineError {
    /// Rejected configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The harvester thread could not be started
    #[error("failed to spawn harvester: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Delivery failure reported by a [`Transport`](crate::Transport)
#[derive(Debug, Error)]
#[error("transport error: {message}")]
pub struct TransportError {
    /// What went wrong
    pub message: String,
}

impl TransportError {
    /// Create a transport error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
