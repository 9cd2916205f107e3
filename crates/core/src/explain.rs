//! Execution-plan probe abstraction
//!
//! The sampler never talks to a database driver directly. Hosts that want
//! plan capture implement [`ExplainProbe`] for their connection type and
//! attach it to the [`QueryContext`](crate::QueryContext) of each query.

use thiserror::Error;

/// Tabular result of a probe, exactly as the database returned it
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProbeResult {
    /// Column names in result-set order
    pub columns: Vec<String>,
    /// Rows in result-set order
    pub rows: Vec<Vec<serde_json::Value>>,
}

/// Errors raised while running or interpreting a plan probe
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExplainError {
    /// The connection could not run the probe
    #[error("connection error: {0}")]
    Connection(String),

    /// The database rejected the probe statement
    #[error("unsupported statement: {0}")]
    Unsupported(String),

    /// The result set did not have a tabular shape
    #[error("malformed probe result: {0}")]
    Malformed(String),
}

/// A database connection able to run `EXPLAIN` probes
///
/// Implementations may block on I/O. The sampler never calls a probe while
/// holding the aggregation lock.
pub trait ExplainProbe: Send + Sync {
    /// Run `statement` (already prefixed with `EXPLAIN`) and return its rows
    fn run_explain(&self, statement: &str) -> Result<ProbeResult, ExplainError>;
}
