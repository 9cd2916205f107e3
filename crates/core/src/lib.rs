//! Core types for slowsql
//!
//! This crate defines the data model shared by every layer of the sampler:
//! - [`Observation`]: one recorded query execution inside a transaction
//! - [`AggregatedTrace`]: the harvest-ready summary of one operation
//! - [`Plan`]: structured result of an `EXPLAIN` probe
//! - [`SamplerConfig`]: thresholds and feature flags
//!
//! It also owns the pure text transformations applied to captured SQL
//! ([`normalize`]) and the stable statement hash ([`sql_id`]).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod explain;
pub mod normalize;
pub mod observation;
pub mod sql_id;
pub mod trace;
pub mod types;

pub use config::{ConfigError, RecordSql, SamplerConfig};
pub use explain::{ExplainError, ExplainProbe, ProbeResult};
pub use normalize::{
    normalize, obfuscate, truncate, NormalizedQuery, ELLIPSIS, MAX_SQL_LENGTH, SQL_NOT_RECORDED,
};
pub use observation::Observation;
pub use sql_id::sql_id;
pub use trace::AggregatedTrace;
pub use types::{ContextId, DatabaseAdapter, Plan, QueryContext};
