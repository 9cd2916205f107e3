//! Positional wire tuple
//!
//! Each harvested trace travels as a 10-element JSON array. The position of
//! every field is part of the collector contract and must not change:
//!
//! | # | Field | Type |
//! |---|-------|------|
//! | 0 | transaction name | string |
//! | 1 | request path | string |
//! | 2 | statement id | int32 |
//! | 3 | sql (or redaction marker) | string |
//! | 4 | operation name | string |
//! | 5 | call count | int |
//! | 6 | total cost, ms | int |
//! | 7 | min cost, ms | int |
//! | 8 | max cost, ms | int |
//! | 9 | encoded parameters | encoder-specific |
//!
//! The same array form is used for any in-process or cross-process handoff
//! of harvested traces, so there is a single serialization format.

use crate::encoder::{trace_params, PlanEncoder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use slowsql_core::AggregatedTrace;
use tracing::warn;

type Tuple = (String, String, i32, String, String, u64, i64, i64, i64, Value);

/// One trace in wire form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "Tuple", from = "Tuple")]
pub struct WireTrace {
    /// Transaction name of the slowest constituent
    pub transaction_name: String,
    /// Request path of the slowest constituent
    pub request_path: String,
    /// Stable statement id
    pub id: i32,
    /// Statement text
    pub sql: String,
    /// Aggregation identity
    pub operation_name: String,
    /// Number of executions
    pub call_count: u64,
    /// Total cost in milliseconds
    pub total_cost_ms: i64,
    /// Minimum cost in milliseconds
    pub min_cost_ms: i64,
    /// Maximum cost in milliseconds
    pub max_cost_ms: i64,
    /// Encoded parameters (plan)
    pub params: Value,
}

impl From<WireTrace> for Tuple {
    fn from(w: WireTrace) -> Self {
        (
            w.transaction_name,
            w.request_path,
            w.id,
            w.sql,
            w.operation_name,
            w.call_count,
            w.total_cost_ms,
            w.min_cost_ms,
            w.max_cost_ms,
            w.params,
        )
    }
}

impl From<Tuple> for WireTrace {
    fn from(t: Tuple) -> Self {
        WireTrace {
            transaction_name: t.0,
            request_path: t.1,
            id: t.2,
            sql: t.3,
            operation_name: t.4,
            call_count: t.5,
            total_cost_ms: t.6,
            min_cost_ms: t.7,
            max_cost_ms: t.8,
            params: t.9,
        }
    }
}

/// Convert fractional seconds to whole milliseconds, rounding half away from zero
pub fn to_millis(seconds: f64) -> i64 {
    (seconds * 1000.0).round() as i64
}

/// Convert a trace to its wire tuple
///
/// Costs are rounded independently. A plan that fails to encode is replaced
/// by the encoder's empty representation; the tuple is still produced.
pub fn to_wire(trace: &AggregatedTrace, encoder: &dyn PlanEncoder) -> WireTrace {
    let params = match &trace.plan {
        Some(plan) => encoder.encode(&trace_params(Some(plan))).unwrap_or_else(|e| {
            warn!(
                operation = %trace.operation_name,
                error = %e,
                "Failed to encode plan, sending trace without it"
            );
            encoder.empty()
        }),
        None => encoder.empty(),
    };

    WireTrace {
        transaction_name: trace.path.clone(),
        request_path: trace.uri.clone(),
        id: trace.sql_id(),
        sql: trace.representative_sql.clone(),
        operation_name: trace.operation_name.clone(),
        call_count: trace.call_count,
        total_cost_ms: to_millis(trace.total_cost),
        min_cost_ms: to_millis(trace.min_cost),
        max_cost_ms: to_millis(trace.max_cost),
        params,
    }
}

/// Convert a harvested batch, preserving order
pub fn encode_batch(traces: &[AggregatedTrace], encoder: &dyn PlanEncoder) -> Vec<WireTrace> {
    traces.iter().map(|t| to_wire(t, encoder)).collect()
}

/// Serialize a batch to its JSON payload
pub fn to_payload(batch: &[WireTrace]) -> Result<String, serde_json::Error> {
    serde_json::to_string(batch)
}

/// Parse a JSON payload produced by [`to_payload`]
pub fn from_payload(payload: &str) -> Result<Vec<WireTrace>, serde_json::Error> {
    serde_json::from_str(payload)
}
