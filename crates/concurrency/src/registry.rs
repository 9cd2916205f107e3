//! Transaction registry
//!
//! Maps each execution context to the [`TransactionRecord`] it currently
//! owns. Capture and buffering never touch the aggregation store, and
//! different contexts never share a record, so the only synchronization is
//! the registry's own sharding.
//!
//! ## Lifecycle
//!
//! ```text
//! start(ctx)  ──► active[ctx] = new record        (replaces any prior record)
//! notice(ctx) ──► active[ctx].observations.push   (no-op without a record)
//! finish(ctx) ──► finished[ctx] = active.remove(ctx), returned for flushing
//! start(ctx)  ──► finished[ctx] dropped
//! ```
//!
//! The finished record stays readable through [`TransactionRegistry::with_transaction`]
//! until the context starts its next transaction, is cleared, or ages out
//! of the retention window. The window holds the most recently finished
//! records only ([`DEFAULT_FINISHED_RETENTION`] by default), so hosts that
//! use a fresh context per request do not accumulate records.
//!
//! # Thread Safety
//!
//! Active records live in a `DashMap`: contexts on different shards never
//! contend, and a context only ever touches its own entry. The retention
//! window is a small `parking_lot::Mutex`-guarded queue touched once per
//! finish.

use crate::record::TransactionRecord;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use slowsql_core::normalize::truncate;
use slowsql_core::{ContextId, Observation, QueryContext, SamplerConfig};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Finished records kept for inspection by default
pub const DEFAULT_FINISHED_RETENTION: usize = 64;

/// Registry of in-flight and just-finished transactions
#[derive(Debug)]
pub struct TransactionRegistry {
    active: DashMap<ContextId, TransactionRecord>,
    finished: Mutex<VecDeque<(ContextId, Arc<TransactionRecord>)>>,
    retention: usize,
}

impl TransactionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_FINISHED_RETENTION)
    }

    /// Create a registry keeping at most `retention` finished records
    pub fn with_retention(retention: usize) -> Self {
        Self {
            active: DashMap::new(),
            finished: Mutex::new(VecDeque::with_capacity(retention)),
            retention,
        }
    }

    /// Open a transaction for `state`
    ///
    /// Any record already associated with `state` is replaced: transactions
    /// do not nest.
    pub fn start(&self, state: ContextId, started_at: DateTime<Utc>, uri: Option<String>) {
        self.forget_finished(state);
        let replaced = self
            .active
            .insert(state, TransactionRecord::new(started_at, uri));
        if let Some(old) = replaced {
            debug!(
                context = %state,
                dropped_observations = old.len(),
                "Transaction restarted before finish, previous record replaced"
            );
        }
    }

    /// Update the request path and guid of the active transaction
    pub fn set_transaction_info(&self, state: ContextId, uri: impl Into<String>, guid: impl Into<String>) {
        if let Some(mut record) = self.active.get_mut(&state) {
            record.uri = Some(uri.into());
            record.guid = guid.into();
        }
    }

    /// Suspend or resume query capture for the active transaction
    pub fn set_sql_recorded(&self, state: ContextId, recorded: bool) {
        if let Some(mut record) = self.active.get_mut(&state) {
            record.sql_recorded = recorded;
        }
    }

    /// Record one query execution
    ///
    /// Returns `true` if an observation was appended. Nothing is recorded
    /// when `state` has no active transaction, capture is suspended, the
    /// operation is unnamed, or the duration is at or below the configured
    /// minimum.
    pub fn notice(
        &self,
        state: ContextId,
        query_text: &str,
        operation_name: &str,
        context: QueryContext,
        duration: Duration,
        config: &SamplerConfig,
    ) -> bool {
        let Some(mut record) = self.active.get_mut(&state) else {
            return false;
        };
        if !record.sql_recorded || operation_name.is_empty() || !config.is_reportable(duration) {
            return false;
        }

        let query_text = truncate(query_text, config.max_sql_length);
        record
            .observations
            .push(Observation::new(query_text, operation_name, context, duration));
        true
    }

    /// Close the transaction of `state`
    ///
    /// Stamps `transaction_name`, detaches the record and returns it for
    /// flushing. Returns `None` if `state` had no active transaction.
    pub fn finish(&self, state: ContextId, transaction_name: &str) -> Option<Arc<TransactionRecord>> {
        let (_, mut record) = self.active.remove(&state)?;
        record.transaction_name = Some(transaction_name.to_string());
        let record = Arc::new(record);

        let mut finished = self.finished.lock();
        finished.retain(|(ctx, _)| *ctx != state);
        if self.retention > 0 {
            if finished.len() == self.retention {
                finished.pop_front();
            }
            finished.push_back((state, Arc::clone(&record)));
        }
        Some(record)
    }

    /// Inspect the record of `state`
    ///
    /// Sees the active record if there is one, otherwise the last finished
    /// record for that context.
    pub fn with_transaction<R>(&self, state: ContextId, f: impl FnOnce(&TransactionRecord) -> R) -> Option<R> {
        if let Some(record) = self.active.get(&state) {
            return Some(f(&record));
        }
        let record = self
            .finished
            .lock()
            .iter()
            .find(|(ctx, _)| *ctx == state)
            .map(|(_, record)| Arc::clone(record))?;
        Some(f(&record))
    }

    /// Whether `state` has an open transaction
    pub fn is_active(&self, state: ContextId) -> bool {
        self.active.contains_key(&state)
    }

    /// Forget everything held for `state`
    pub fn clear(&self, state: ContextId) {
        self.active.remove(&state);
        self.forget_finished(state);
    }

    /// Number of open transactions
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Number of finished records kept for inspection
    pub fn finished_count(&self) -> usize {
        self.finished.lock().len()
    }

    fn forget_finished(&self, state: ContextId) {
        self.finished.lock().retain(|(ctx, _)| *ctx != state);
    }
}

impl Default for TransactionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
