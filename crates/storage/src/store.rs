//! Aggregation store
//!
//! Process-wide mapping from operation identity to [`AggregatedTrace`].
//! Every finishing transaction merges into it and the harvester drains it.
//!
//! # Design
//!
//! - `parking_lot::Mutex` around an `FxHashMap`: one critical section per
//!   `merge` or `harvest` call, so concurrent finishers can never interleave
//!   inside a sum/min/max update
//! - Insertion sequence numbers: harvest output and eviction ties are
//!   ordered by first insertion, independent of hash iteration order
//! - Harvest swaps the map out under the lock and does the top-N selection
//!   after releasing it
//!
//! # Example
//!
//! ```
//! use slowsql_core::AggregatedTrace;
//! use slowsql_storage::TraceStore;
//!
//! let store = TraceStore::new();
//! store.merge([AggregatedTrace::new("Database/test/select", "select * from test", 1.0, "txn", "/")]);
//! store.merge([AggregatedTrace::new("Database/test/select", "select * from test", 2.0, "txn", "/")]);
//!
//! let traces = store.harvest();
//! assert_eq!(traces.len(), 1);
//! assert_eq!(traces[0].call_count, 2);
//! assert_eq!(traces[0].total_cost, 3.0);
//! assert!(store.is_empty());
//! ```

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use slowsql_core::AggregatedTrace;
use std::fmt;
use tracing::debug;

/// Maximum number of traces returned by one harvest
pub const MAX_HARVEST_TRACES: usize = 10;

#[derive(Debug)]
struct Slot {
    seq: u64,
    trace: AggregatedTrace,
}

#[derive(Debug, Default)]
struct StoreInner {
    traces: FxHashMap<String, Slot>,
    next_seq: u64,
}

/// Bounded store of aggregated traces, keyed by operation name
pub struct TraceStore {
    inner: Mutex<StoreInner>,
    limit: usize,
}

impl TraceStore {
    /// Create a store that harvests at most [`MAX_HARVEST_TRACES`] traces
    pub fn new() -> Self {
        Self::with_limit(MAX_HARVEST_TRACES)
    }

    /// Create a store with a custom harvest bound
    pub fn with_limit(limit: usize) -> Self {
        Self {
            inner: Mutex::new(StoreInner::default()),
            limit,
        }
    }

    /// Harvest bound
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Merge traces into the store
    ///
    /// A trace whose operation is not present is inserted as-is; otherwise it
    /// is folded into the existing trace (see [`AggregatedTrace::absorb`]).
    /// The whole batch is applied in one critical section.
    pub fn merge<I>(&self, traces: I)
    where
        I: IntoIterator<Item = AggregatedTrace>,
    {
        let mut inner = self.inner.lock();
        for trace in traces {
            if let Some(slot) = inner.traces.get_mut(&trace.operation_name) {
                slot.trace.absorb(trace);
                continue;
            }
            let seq = inner.next_seq;
            inner.next_seq += 1;
            inner
                .traces
                .insert(trace.operation_name.clone(), Slot { seq, trace });
        }
    }

    /// Drain the store
    ///
    /// Returns at most [`limit`](Self::limit) traces: when more are held, the
    /// ones with the largest `max_cost` survive (ties go to the earlier
    /// insertion). Survivors come back in insertion order. The store is
    /// always left empty.
    pub fn harvest(&self) -> Vec<AggregatedTrace> {
        let drained = {
            let mut inner = self.inner.lock();
            std::mem::take(&mut inner.traces)
        };

        let mut slots: Vec<Slot> = drained.into_values().collect();
        if slots.len() > self.limit {
            slots.sort_by(|a, b| {
                b.trace
                    .max_cost
                    .total_cmp(&a.trace.max_cost)
                    .then(a.seq.cmp(&b.seq))
            });
            debug!(
                held = slots.len(),
                kept = self.limit,
                "Harvest over capacity, evicting fastest traces"
            );
            slots.truncate(self.limit);
        }
        slots.sort_by_key(|slot| slot.seq);
        slots.into_iter().map(|slot| slot.trace).collect()
    }

    /// Discard everything without harvesting
    pub fn reset(&self) {
        self.inner.lock().traces.clear();
    }

    /// Number of distinct operations held
    pub fn len(&self) -> usize {
        self.inner.lock().traces.len()
    }

    /// Whether the store holds nothing
    pub fn is_empty(&self) -> bool {
        self.inner.lock().traces.is_empty()
    }

    /// Copy of the trace held for `operation_name`
    pub fn get(&self, operation_name: &str) -> Option<AggregatedTrace> {
        self.inner
            .lock()
            .traces
            .get(operation_name)
            .map(|slot| slot.trace.clone())
    }
}

impl Default for TraceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TraceStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraceStore")
            .field("len", &self.len())
            .field("limit", &self.limit)
            .finish()
    }
}
