//! Wire encoding for slowsql
//!
//! This crate turns harvested traces into the collector's positional format:
//!
//! - [`WireTrace`]: the 10-field tuple, serialized as a JSON array
//! - [`PlanEncoder`]: pluggable encoding of the trailing parameters field
//!   ([`IdentityEncoder`], [`CompressedEncoder`])
//!
//! ## Example
//!
//! ```
//! use slowsql_core::AggregatedTrace;
//! use slowsql_wire::{to_wire, CompressedEncoder};
//!
//! let trace = AggregatedTrace::new(
//!     "Database/test/select",
//!     "select * from test",
//!     1.5,
//!     "WebTransaction/Controller/c/a",
//!     "/c/a",
//! );
//! let wire = to_wire(&trace, &CompressedEncoder::deflate());
//!
//! assert_eq!(wire.id, 526336943);
//! assert_eq!(wire.max_cost_ms, 1500);
//! assert_eq!(wire.params, "eJyrrgUAAXUA+Q==\n");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod encoder;
pub mod tuple;

pub use encoder::{
    trace_params, Codec, CompressedEncoder, EncodeError, IdentityEncoder, PlanEncoder,
    EXPLAIN_PLAN_KEY,
};
pub use tuple::{encode_batch, from_payload, to_millis, to_payload, to_wire, WireTrace};
