//! Convenient imports for slowsql.
//!
//! ```
//! use slowsql::prelude::*;
//!
//! let sampler = Sampler::builder().encoder(IdentityEncoder).build()?;
//! assert_eq!(sampler.pending(), 0);
//! # Ok::<(), slowsql::Error>(())
//! ```

// Main entry points
pub use slowsql_engine::{HarvestOutcome, Harvester, Sampler, SamplerBuilder, Transport, TransportError};

// Error handling
pub use crate::error::{Error, Result};

// Capture types
pub use slowsql_core::{
    ContextId, DatabaseAdapter, ExplainError, ExplainProbe, ProbeResult, QueryContext, RecordSql,
    SamplerConfig,
};

// Harvest types
pub use slowsql_core::{AggregatedTrace, Plan};
pub use slowsql_wire::{CompressedEncoder, IdentityEncoder, PlanEncoder, WireTrace};
