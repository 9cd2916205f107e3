//! A single observed query execution

use crate::types::QueryContext;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// One query execution recorded inside a transaction
///
/// Observations are immutable once created. `query_text` has already been
/// truncated to the configured ceiling when the observation is built by the
/// transaction registry.
#[derive(Debug, Clone)]
pub struct Observation {
    /// Captured statement text
    pub query_text: String,
    /// Aggregation identity (e.g. `Database/users/select`)
    pub operation_name: String,
    /// Database context the query ran on
    pub context: QueryContext,
    /// Execution time
    pub duration: Duration,
    /// Wall-clock time of capture
    pub captured_at: DateTime<Utc>,
}

impl Observation {
    /// Create an observation captured now
    pub fn new(
        query_text: impl Into<String>,
        operation_name: impl Into<String>,
        context: QueryContext,
        duration: Duration,
    ) -> Self {
        Self {
            query_text: query_text.into(),
            operation_name: operation_name.into(),
            context,
            duration,
            captured_at: Utc::now(),
        }
    }

    /// Execution time in fractional seconds (the internal cost unit)
    pub fn cost(&self) -> f64 {
        self.duration.as_secs_f64()
    }
}
