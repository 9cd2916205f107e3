//! Aggregated trace
//!
//! An [`AggregatedTrace`] summarizes every observation that shares one
//! operation identity within a harvest cycle.
//!
//! ## Invariants
//!
//! - `min_cost <= every constituent cost <= max_cost`
//! - `total_cost` is the sum of constituent costs
//! - `call_count` is the number of constituent occurrences
//! - `representative_sql`, `id`, `path`, `uri` and `plan` come from the
//!   constituent holding `max_cost`
//!
//! Costs are fractional seconds.

use crate::sql_id::sql_id;
use crate::types::Plan;

/// Harvest-ready summary of one operation
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedTrace {
    /// Aggregation identity
    pub operation_name: String,
    /// Statement text of the slowest constituent
    pub representative_sql: String,
    /// Cached statement id; recomputed from `representative_sql` when absent
    pub id: Option<i32>,
    /// Number of constituent executions
    pub call_count: u64,
    /// Sum of constituent costs
    pub total_cost: f64,
    /// Smallest constituent cost
    pub min_cost: f64,
    /// Largest constituent cost
    pub max_cost: f64,
    /// Transaction name of the slowest constituent
    pub path: String,
    /// Request path of the slowest constituent
    pub uri: String,
    /// Execution plan of the slowest constituent
    pub plan: Option<Plan>,
}

impl AggregatedTrace {
    /// A trace for a single execution
    pub fn new(
        operation_name: impl Into<String>,
        representative_sql: impl Into<String>,
        cost: f64,
        path: impl Into<String>,
        uri: impl Into<String>,
    ) -> Self {
        Self {
            operation_name: operation_name.into(),
            representative_sql: representative_sql.into(),
            id: None,
            call_count: 1,
            total_cost: cost,
            min_cost: cost,
            max_cost: cost,
            path: path.into(),
            uri: uri.into(),
            plan: None,
        }
    }

    /// Attach a plan
    pub fn with_plan(mut self, plan: Option<Plan>) -> Self {
        self.plan = plan;
        self
    }

    /// Cache a precomputed statement id
    pub fn with_id(mut self, id: i32) -> Self {
        self.id = Some(id);
        self
    }

    /// Statement id, computing it from the representative text if not cached
    pub fn sql_id(&self) -> i32 {
        self.id.unwrap_or_else(|| sql_id(&self.representative_sql))
    }

    /// Fold `other` into this trace
    ///
    /// Counts and totals add, the minimum is kept, and the representative
    /// fields move to `other` only when it strictly exceeds the current
    /// maximum.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if either trace carries a non-finite or
    /// negative cost, or an inverted min/max pair. Such a trace can only come
    /// from a caller bug.
    pub fn absorb(&mut self, other: AggregatedTrace) {
        debug_assert!(self.costs_are_well_formed(), "corrupt trace in store: {:?}", self);
        debug_assert!(other.costs_are_well_formed(), "corrupt incoming trace: {:?}", other);

        self.call_count += other.call_count;
        self.total_cost += other.total_cost;
        if other.min_cost < self.min_cost {
            self.min_cost = other.min_cost;
        }
        if other.max_cost > self.max_cost {
            self.max_cost = other.max_cost;
            self.representative_sql = other.representative_sql;
            self.id = other.id;
            self.path = other.path;
            self.uri = other.uri;
            self.plan = other.plan;
        }
    }

    /// Whether the cost fields satisfy the trace invariants
    pub fn costs_are_well_formed(&self) -> bool {
        [self.total_cost, self.min_cost, self.max_cost]
            .iter()
            .all(|c| c.is_finite() && *c >= 0.0)
            && self.min_cost <= self.max_cost
    }
}
