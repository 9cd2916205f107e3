//! Shared identity and context types
//!
//! - [`ContextId`]: identity of one execution context (request thread, task)
//! - [`DatabaseAdapter`]: which SQL dialect a query was issued against
//! - [`QueryContext`]: per-query database context handed to the sampler
//! - [`Plan`]: structured result of an execution-plan probe

use crate::explain::ExplainProbe;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one execution context
///
/// Every in-flight transaction is keyed by the context that runs it. The host
/// decides what a context is (an OS thread, an async task, a request id); the
/// sampler only needs the identity to be stable for the transaction's lifetime
/// and distinct between concurrently running transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContextId(u64);

impl ContextId {
    /// Allocate a fresh, process-unique context id
    pub fn next() -> Self {
        ContextId(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Wrap a host-provided identity
    pub const fn from_raw(raw: u64) -> Self {
        ContextId(raw)
    }

    /// Get the raw identity
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx-{}", self.0)
    }
}

/// SQL dialect of the connection a query ran on
///
/// Only affects obfuscation: PostgreSQL and SQLite use double quotes for
/// identifiers, everyone else treats them as string literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseAdapter {
    /// MySQL and compatible servers
    Mysql,
    /// PostgreSQL
    Postgres,
    /// SQLite
    Sqlite,
    /// Unknown or unspecified adapter
    #[default]
    Other,
}

impl DatabaseAdapter {
    /// Classify a driver/adapter name such as `"mysql2"` or `"postgresql"`
    pub fn from_name(name: &str) -> Self {
        let name = name.to_ascii_lowercase();
        if name.contains("postgres") || name.contains("postgis") {
            DatabaseAdapter::Postgres
        } else if name.contains("sqlite") {
            DatabaseAdapter::Sqlite
        } else if name.contains("mysql") {
            DatabaseAdapter::Mysql
        } else {
            DatabaseAdapter::Other
        }
    }

    /// Whether a backslash escapes the next character inside a literal
    pub fn backslash_escapes(&self) -> bool {
        !matches!(self, DatabaseAdapter::Postgres | DatabaseAdapter::Sqlite)
    }

    /// Whether `"..."` delimits an identifier rather than a string literal
    pub fn double_quotes_are_identifiers(&self) -> bool {
        matches!(self, DatabaseAdapter::Postgres | DatabaseAdapter::Sqlite)
    }
}

/// Database context attached to an observed query
///
/// Carries the dialect used for obfuscation and, optionally, a handle to the
/// connection that can run `EXPLAIN` probes for plan capture.
#[derive(Clone, Default)]
pub struct QueryContext {
    /// Dialect of the connection
    pub adapter: DatabaseAdapter,
    /// Connection able to run plan probes, if plan capture is possible
    pub probe: Option<Arc<dyn ExplainProbe>>,
}

impl QueryContext {
    /// Context with a known adapter and no plan probe
    pub fn new(adapter: DatabaseAdapter) -> Self {
        Self {
            adapter,
            probe: None,
        }
    }

    /// Attach a plan probe
    pub fn with_probe(mut self, probe: Arc<dyn ExplainProbe>) -> Self {
        self.probe = Some(probe);
        self
    }
}

impl fmt::Debug for QueryContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryContext")
            .field("adapter", &self.adapter)
            .field("has_probe", &self.probe.is_some())
            .finish()
    }
}

/// Execution plan captured for a statement
///
/// Column order mirrors the probe's result set exactly, and every row lists
/// its values in column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// Column names in result-set order
    pub column_headers: Vec<String>,
    /// Rows, each in column order
    pub rows: Vec<Vec<serde_json::Value>>,
}

impl Plan {
    /// Create a plan from headers and rows
    pub fn new(column_headers: Vec<String>, rows: Vec<Vec<serde_json::Value>>) -> Self {
        Self {
            column_headers,
            rows,
        }
    }

    /// Positional `[headers, rows]` form used in trace parameters
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!([self.column_headers, self.rows])
    }
}
