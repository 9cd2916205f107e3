//! Unified error types for slowsql.
//!
//! Wraps the error of each layer so callers can use `?` across the crates.

use thiserror::Error;

/// All slowsql errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or unparsable configuration
    #[error("configuration error: {0}")]
    Config(#[from] slowsql_core::ConfigError),

    /// A plan probe failed
    #[error("explain error: {0}")]
    Explain(#[from] slowsql_core::ExplainError),

    /// Plan parameters could not be encoded
    #[error("encode error: {0}")]
    Encode(#[from] slowsql_wire::EncodeError),

    /// A harvested batch could not be delivered
    #[error(transparent)]
    Transport(#[from] slowsql_engine::TransportError),

    /// The harvester thread could not be started
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Wire payload (de)serialization failed
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type for slowsql operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether retrying the same call may succeed.
    ///
    /// Delivery and probe connection failures are transient; configuration
    /// and encoding errors are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Transport(_) | Error::Explain(slowsql_core::ExplainError::Connection(_))
        )
    }
}

// Flatten engine errors into the matching variants
impl From<slowsql_engine::EngineError> for Error {
    fn from(e: slowsql_engine::EngineError) -> Self {
        use slowsql_engine::EngineError;
        match e {
            EngineError::Config(c) => Error::Config(c),
            EngineError::Spawn(io) => Error::Io(io),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
