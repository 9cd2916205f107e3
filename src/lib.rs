//! # slowsql
//!
//! In-process slow SQL sampler.
//!
//! slowsql buffers the slow queries of each transaction, normalizes and
//! aggregates them per operation, captures execution plans for slow reads,
//! and hands the slowest operations to a collector on a fixed harvest
//! period.
//!
//! ## Quick Start
//!
//! ```
//! use slowsql::prelude::*;
//! use std::time::Duration;
//!
//! let sampler = Sampler::new(SamplerConfig::default())?;
//!
//! let ctx = ContextId::next();
//! sampler.on_start_transaction(ctx, chrono::Utc::now(), Some("/users".to_string()));
//! sampler.notice_sql(
//!     ctx,
//!     "select * from users where id = 42",
//!     "Database/users/select",
//!     QueryContext::default(),
//!     Duration::from_millis(750),
//! );
//! sampler.on_finishing_transaction(ctx, "WebTransaction/Controller/users/show");
//!
//! let batch = sampler.harvest_wire();
//! assert_eq!(batch.len(), 1);
//! assert_eq!(batch[0].sql, "select * from users where id = ?");
//! # Ok::<(), slowsql::Error>(())
//! ```
//!
//! ## Crates
//!
//! - `slowsql-core`: configuration, normalization, statement ids, traces
//! - `slowsql-concurrency`: per-context transaction buffers
//! - `slowsql-storage`: the bounded trace store
//! - `slowsql-wire`: collector tuple and plan encoding
//! - `slowsql-engine`: sampler, plan capture, harvester thread

#![warn(missing_docs)]

mod error;

pub mod prelude;

pub use error::{Error, Result};

pub use slowsql_core::{
    AggregatedTrace, ContextId, DatabaseAdapter, ExplainError, ExplainProbe, Plan, ProbeResult,
    QueryContext, RecordSql, SamplerConfig,
};
pub use slowsql_engine::{HarvestOutcome, Harvester, Sampler, SamplerBuilder, Transport, TransportError};
pub use slowsql_wire::{CompressedEncoder, IdentityEncoder, PlanEncoder, WireTrace};
