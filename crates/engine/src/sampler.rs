//! Sampler
//!
//! Ties the layers together:
//!
//! ```text
//! on_start_transaction ──► TransactionRegistry::start
//! notice_sql           ──► TransactionRegistry::notice
//! on_finishing_transaction
//!   1. TransactionRegistry::finish           (detach record)
//!   2. normalize + pre-aggregate per operation (no locks)
//!   3. PlanCollector for each slowest statement (may block on I/O, no locks)
//!   4. TraceStore::merge                      (single critical section)
//! harvest_and_send
//!   1. TraceStore::harvest                    (drain, top-N)
//!   2. encode to wire tuples
//!   3. Transport::send, re-merge on failure
//! ```
//!
//! Configuration is read once per call from an `Arc` snapshot, so
//! [`Sampler::update_config`] takes effect for the next transaction without
//! blocking in-flight work.

use crate::error::{EngineError, Result};
use crate::plan::PlanCollector;
use crate::transport::{HarvestOutcome, Transport};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use slowsql_concurrency::{TransactionRecord, TransactionRegistry, DEFAULT_FINISHED_RETENTION};
use slowsql_core::normalize::normalize;
use slowsql_core::{sql_id, AggregatedTrace, ContextId, Observation, QueryContext, SamplerConfig};
use slowsql_storage::{TraceStore, MAX_HARVEST_TRACES};
use slowsql_wire::{encode_batch, CompressedEncoder, PlanEncoder, WireTrace};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// In-process slow SQL sampler
pub struct Sampler {
    config: RwLock<Arc<SamplerConfig>>,
    registry: TransactionRegistry,
    store: TraceStore,
    encoder: Box<dyn PlanEncoder>,
}

impl Sampler {
    /// Sampler with the given configuration and default encoder
    pub fn new(config: SamplerConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    /// Create a builder for sampler configuration
    pub fn builder() -> SamplerBuilder {
        SamplerBuilder::new()
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Current configuration snapshot
    pub fn config(&self) -> Arc<SamplerConfig> {
        Arc::clone(&self.config.read())
    }

    /// Replace the configuration
    ///
    /// Transactions already in flight keep buffering; the new values apply
    /// from the next call that reads the config.
    pub fn update_config(&self, config: SamplerConfig) -> Result<()> {
        config.validate()?;
        *self.config.write() = Arc::new(config);
        Ok(())
    }

    /// Whether sampling is switched on
    pub fn is_enabled(&self) -> bool {
        self.config.read().enabled
    }

    // ========================================================================
    // Capture
    // ========================================================================

    /// Open a transaction buffer for `state`
    ///
    /// Does nothing while the sampler is disabled, which turns every
    /// subsequent `notice_sql` for that context into a no-op.
    pub fn on_start_transaction(&self, state: ContextId, started_at: DateTime<Utc>, uri: Option<String>) {
        if !self.is_enabled() {
            return;
        }
        self.registry.start(state, started_at, uri);
    }

    /// Set the request path and guid of the open transaction
    pub fn set_transaction_info(&self, state: ContextId, uri: impl Into<String>, guid: impl Into<String>) {
        self.registry.set_transaction_info(state, uri, guid);
    }

    /// Suspend or resume capture for the open transaction
    pub fn set_sql_recorded(&self, state: ContextId, recorded: bool) {
        self.registry.set_sql_recorded(state, recorded);
    }

    /// Record one query execution
    ///
    /// Returns whether the query was buffered. Outside a transaction, or at
    /// or below the reporting threshold, nothing happens.
    pub fn notice_sql(
        &self,
        state: ContextId,
        sql: &str,
        operation_name: &str,
        context: QueryContext,
        duration: Duration,
    ) -> bool {
        let config = self.config();
        self.registry
            .notice(state, sql, operation_name, context, duration, &config)
    }

    /// Close the transaction of `state` and merge its queries into the store
    pub fn on_finishing_transaction(&self, state: ContextId, transaction_name: &str) {
        if let Some(record) = self.registry.finish(state, transaction_name) {
            self.harvest_transaction(&record);
        }
    }

    /// Inspect the open (or last finished) transaction of `state`
    pub fn with_transaction<R>(&self, state: ContextId, f: impl FnOnce(&TransactionRecord) -> R) -> Option<R> {
        self.registry.with_transaction(state, f)
    }

    /// Number of finished transactions still held for inspection
    pub fn retained_transactions(&self) -> usize {
        self.registry.finished_count()
    }

    /// Drop everything held for `state`
    pub fn clear_transaction(&self, state: ContextId) {
        self.registry.clear(state);
    }

    // ========================================================================
    // Flush
    // ========================================================================

    /// Normalize a finished transaction's queries and merge them
    ///
    /// Queries are first aggregated per operation inside the transaction, so
    /// a plan is probed at most once per operation (for its slowest
    /// statement). Plan failures are logged and leave that trace without a
    /// plan; the rest of the transaction is still merged.
    pub fn harvest_transaction(&self, record: &TransactionRecord) {
        if record.is_empty() {
            return;
        }
        let config = self.config();
        let collector = PlanCollector::from_config(&config);

        let mut groups: Vec<(AggregatedTrace, &Observation)> = Vec::new();
        let mut index: FxHashMap<&str, usize> = FxHashMap::default();

        for observation in &record.observations {
            let trace = trace_for(observation, record, &config);
            match index.get(observation.operation_name.as_str()) {
                Some(&i) => {
                    let (existing, slowest) = &mut groups[i];
                    if trace.max_cost > existing.max_cost {
                        *slowest = observation;
                    }
                    existing.absorb(trace);
                }
                None => {
                    index.insert(observation.operation_name.as_str(), groups.len());
                    groups.push((trace, observation));
                }
            }
        }

        if collector.is_enabled() {
            for (trace, slowest) in groups.iter_mut() {
                let Some(probe) = slowest.context.probe.as_deref() else {
                    continue;
                };
                match collector.collect_plan(*slowest, probe) {
                    Ok(plan) => trace.plan = plan,
                    Err(e) => warn!(
                        operation = %trace.operation_name,
                        error = %e,
                        "Plan collection failed, keeping trace without plan"
                    ),
                }
            }
        }

        debug!(
            transaction = record.name(),
            observations = record.len(),
            traces = groups.len(),
            "Merging transaction into store"
        );
        self.store.merge(groups.into_iter().map(|(trace, _)| trace));
    }

    // ========================================================================
    // Harvest
    // ========================================================================

    /// Merge traces into the store (e.g. a batch that failed delivery)
    pub fn merge<I>(&self, traces: I)
    where
        I: IntoIterator<Item = AggregatedTrace>,
    {
        self.store.merge(traces);
    }

    /// Drain the store, returning at most the harvest bound of traces
    pub fn harvest(&self) -> Vec<AggregatedTrace> {
        self.store.harvest()
    }

    /// Drain the store and encode the result
    pub fn harvest_wire(&self) -> Vec<WireTrace> {
        self.to_wire(&self.harvest())
    }

    /// Encode traces with this sampler's plan encoder
    pub fn to_wire(&self, traces: &[AggregatedTrace]) -> Vec<WireTrace> {
        encode_batch(traces, self.encoder.as_ref())
    }

    /// Run one harvest cycle against `transport`
    ///
    /// On delivery failure the harvested traces are merged back, together
    /// with anything recorded since, and go out with the next cycle.
    pub fn harvest_and_send(&self, transport: &dyn Transport) -> HarvestOutcome {
        let traces = self.harvest();
        if traces.is_empty() {
            return HarvestOutcome::Empty;
        }

        let batch = self.to_wire(&traces);
        match transport.send(&batch) {
            Ok(()) => {
                debug!(traces = traces.len(), "Harvest delivered");
                HarvestOutcome::Sent(traces.len())
            }
            Err(e) => {
                let count = traces.len();
                warn!(traces = count, error = %e, "Harvest delivery failed, requeueing traces");
                self.store.merge(traces);
                HarvestOutcome::Requeued(count)
            }
        }
    }

    /// Discard all pending traces
    pub fn reset(&self) {
        self.store.reset();
    }

    /// Number of distinct operations waiting for harvest
    pub fn pending(&self) -> usize {
        self.store.len()
    }

    /// Copy of the pending trace for `operation_name`
    pub fn pending_trace(&self, operation_name: &str) -> Option<AggregatedTrace> {
        self.store.get(operation_name)
    }
}

/// Single-execution trace for one observation
///
/// The id is hashed from the text that will be sent, so it never carries
/// anything the record mode withholds.
fn trace_for(observation: &Observation, record: &TransactionRecord, config: &SamplerConfig) -> AggregatedTrace {
    let normalized = normalize(
        &observation.query_text,
        config.record_sql,
        observation.context.adapter,
        config.max_sql_length,
    );
    let id = sql_id(&normalized.text);
    AggregatedTrace::new(
        observation.operation_name.as_str(),
        normalized.text,
        observation.cost(),
        record.name(),
        record.request_path(),
    )
    .with_id(id)
}

impl fmt::Debug for Sampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sampler")
            .field("config", &self.config())
            .field("active_transactions", &self.registry.active_count())
            .field("pending", &self.store.len())
            .finish()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`Sampler`]
///
/// # Example
///
/// ```
/// use slowsql_engine::Sampler;
/// use slowsql_core::SamplerConfig;
/// use slowsql_wire::IdentityEncoder;
///
/// let sampler = Sampler::builder()
///     .config(SamplerConfig::raw_without_plans())
///     .encoder(IdentityEncoder)
///     .trace_limit(20)
///     .build()
///     .unwrap();
/// assert!(sampler.is_enabled());
/// ```
pub struct SamplerBuilder {
    config: SamplerConfig,
    encoder: Box<dyn PlanEncoder>,
    trace_limit: usize,
    finished_retention: usize,
}

impl SamplerBuilder {
    /// Builder with default config, zlib plan encoding and a bound of 10
    pub fn new() -> Self {
        Self {
            config: SamplerConfig::default(),
            encoder: Box::new(CompressedEncoder::deflate()),
            trace_limit: MAX_HARVEST_TRACES,
            finished_retention: DEFAULT_FINISHED_RETENTION,
        }
    }

    /// Use this configuration
    pub fn config(mut self, config: SamplerConfig) -> Self {
        self.config = config;
        self
    }

    /// Parse the configuration from TOML
    pub fn config_toml(mut self, text: &str) -> Result<Self> {
        self.config = SamplerConfig::from_toml_str(text).map_err(EngineError::from)?;
        Ok(self)
    }

    /// Use this plan encoder
    pub fn encoder(mut self, encoder: impl PlanEncoder + 'static) -> Self {
        self.encoder = Box::new(encoder);
        self
    }

    /// Harvest at most `limit` traces per cycle
    pub fn trace_limit(mut self, limit: usize) -> Self {
        self.trace_limit = limit;
        self
    }

    /// Keep at most `retention` finished transactions for inspection
    pub fn finished_retention(mut self, retention: usize) -> Self {
        self.finished_retention = retention;
        self
    }

    /// Validate the configuration and build the sampler
    pub fn build(self) -> Result<Sampler> {
        self.config.validate()?;
        Ok(Sampler {
            config: RwLock::new(Arc::new(self.config)),
            registry: TransactionRegistry::with_retention(self.finished_retention),
            store: TraceStore::with_limit(self.trace_limit),
            encoder: self.encoder,
        })
    }
}

impl Default for SamplerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
