//! Sampler Integration Test Suite
//!
//! Drives the public `slowsql` API end to end: transaction hooks, flush,
//! the bounded store, plan capture and the collector wire format.
//!
//! ## Modules
//!
//! - `capture`: observation thresholds and per-context buffers
//! - `aggregation`: merge arithmetic and representative selection
//! - `normalization`: truncation, obfuscation, statement ids
//! - `plans`: `EXPLAIN` capture and its failure modes
//! - `harvest`: top-N bound, re-merge and the harvester thread
//! - `wire`: tuple layout and plan encoding
//! - `concurrency`: many finishers against one store
//! - `logging`: tracing output of recovered failures
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test sampler
//! cargo test --test sampler harvest::
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use slowsql::prelude::*;

pub mod aggregation;
pub mod capture;
pub mod logging;

// =============================================================================
// SHARED TEST UTILITIES
// =============================================================================

/// Sampler with plain JSON plan encoding
pub fn create_sampler(config: SamplerConfig) -> Sampler {
    Sampler::builder()
        .config(config)
        .encoder(IdentityEncoder)
        .build()
        .expect("Failed to build sampler")
}

/// Sampler with the collector's default zlib encoding
pub fn create_collector_sampler(config: SamplerConfig) -> Sampler {
    Sampler::builder()
        .config(config)
        .build()
        .expect("Failed to build sampler")
}

/// Duration from fractional seconds
pub fn secs(s: f64) -> Duration {
    Duration::from_secs_f64(s)
}

/// Run one transaction of `(sql, operation, seconds)` queries to completion
pub fn run_transaction(sampler: &Sampler, name: &str, uri: &str, queries: &[(&str, &str, f64)]) -> ContextId {
    run_transaction_with(sampler, name, uri, QueryContext::default(), queries)
}

/// Same as [`run_transaction`] with an explicit query context
pub fn run_transaction_with(
    sampler: &Sampler,
    name: &str,
    uri: &str,
    context: QueryContext,
    queries: &[(&str, &str, f64)],
) -> ContextId {
    let ctx = ContextId::next();
    sampler.on_start_transaction(ctx, Utc::now(), Some(uri.to_string()));
    for (sql, op, d) in queries {
        sampler.notice_sql(ctx, sql, op, context.clone(), secs(*d));
    }
    sampler.on_finishing_transaction(ctx, name);
    ctx
}

/// Probe that answers every `EXPLAIN` with a fixed table and remembers calls
pub struct FakeProbe {
    pub statements: Mutex<Vec<String>>,
    columns: Vec<String>,
    rows: Vec<Vec<serde_json::Value>>,
    fail_with: Option<ExplainError>,
}

impl FakeProbe {
    pub fn table(columns: &[&str], rows: Vec<Vec<serde_json::Value>>) -> Arc<Self> {
        Arc::new(Self {
            statements: Mutex::new(Vec::new()),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
            fail_with: None,
        })
    }

    pub fn failing(error: ExplainError) -> Arc<Self> {
        Arc::new(Self {
            statements: Mutex::new(Vec::new()),
            columns: Vec::new(),
            rows: Vec::new(),
            fail_with: Some(error),
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.statements.lock().clone()
    }
}

impl ExplainProbe for FakeProbe {
    fn run_explain(&self, statement: &str) -> std::result::Result<ProbeResult, ExplainError> {
        self.statements.lock().push(statement.to_string());
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        Ok(ProbeResult {
            columns: self.columns.clone(),
            rows: self.rows.clone(),
        })
    }
}

/// Transport that keeps every delivered batch
#[derive(Default)]
pub struct RecordingTransport {
    pub batches: Mutex<Vec<Vec<WireTrace>>>,
}

impl Transport for RecordingTransport {
    fn send(&self, batch: &[WireTrace]) -> std::result::Result<(), TransportError> {
        self.batches.lock().push(batch.to_vec());
        Ok(())
    }
}
