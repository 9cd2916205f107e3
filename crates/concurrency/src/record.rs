//! Per-transaction observation buffer

use chrono::{DateTime, Utc};
use slowsql_core::Observation;
use uuid::Uuid;

/// Observations and metadata of one logical transaction
///
/// A record is owned by exactly one execution context from `start` until
/// `finish`. Observations are kept in arrival order.
#[derive(Debug, Clone)]
pub struct TransactionRecord {
    /// Recorded queries, in arrival order
    pub observations: Vec<Observation>,
    /// Request path (e.g. `/users/42`)
    pub uri: Option<String>,
    /// Transaction name, stamped at finish (e.g. `WebTransaction/Controller/users/show`)
    pub transaction_name: Option<String>,
    /// Transaction guid, used to correlate with transaction traces
    pub guid: String,
    /// When the transaction started
    pub started_at: DateTime<Utc>,
    /// Whether queries are currently being recorded
    pub sql_recorded: bool,
}

impl TransactionRecord {
    /// Create an empty record with a fresh guid
    pub fn new(started_at: DateTime<Utc>, uri: Option<String>) -> Self {
        Self {
            observations: Vec::new(),
            uri,
            transaction_name: None,
            guid: Uuid::new_v4().simple().to_string(),
            started_at,
            sql_recorded: true,
        }
    }

    /// Number of buffered observations
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Whether no observation was buffered
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Transaction name, or empty if never stamped
    pub fn name(&self) -> &str {
        self.transaction_name.as_deref().unwrap_or("")
    }

    /// Request path, or empty if unknown
    pub fn request_path(&self) -> &str {
        self.uri.as_deref().unwrap_or("")
    }
}
