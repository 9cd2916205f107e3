//! Storage layer for slowsql
//!
//! This crate implements the aggregation store that every finishing
//! transaction merges into:
//! - TraceStore: mutex-guarded operation → trace map
//! - Top-N eviction by `max_cost` at harvest time
//! - Re-merge of traces that failed delivery

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod store;

pub use store::{TraceStore, MAX_HARVEST_TRACES};
