//! Sampler orchestration for slowsql
//!
//! This crate wires the lower layers into a running sampler:
//! - [`Sampler`]: transaction hooks, per-transaction flush, harvest
//! - [`PlanCollector`]: `EXPLAIN` capture for slow reads
//! - [`Harvester`]: background thread driving periodic harvests
//! - [`Transport`]: delivery seam for harvested batches
//!
//! ## Locking
//!
//! | Structure            | Lock                   | Held during            |
//! |----------------------|------------------------|------------------------|
//! | transaction buffers  | DashMap shard          | one append             |
//! | trace store          | `parking_lot::Mutex`   | merge / drain only     |
//! | configuration        | `parking_lot::RwLock`  | `Arc` clone            |
//!
//! Plan probes and wire encoding run with no lock held.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod harvester;
pub mod plan;
pub mod sampler;
pub mod transport;

pub use error::{EngineError, Result, TransportError};
pub use harvester::Harvester;
pub use plan::{explain_statement, is_plan_eligible, PlanCollector};
pub use sampler::{Sampler, SamplerBuilder};
pub use transport::{HarvestOutcome, Transport};
