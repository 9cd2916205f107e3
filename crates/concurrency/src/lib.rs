//! Capture layer for slowsql
//!
//! This crate records query executions while a transaction is running:
//! - TransactionRecord: ordered observations plus transaction metadata
//! - TransactionRegistry: execution context → record, start/notice/finish
//!
//! Nothing here aggregates. A finished record is handed back to the caller,
//! which normalizes it and merges it into the shared store.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod record;
pub mod registry;

pub use record::TransactionRecord;
pub use registry::{TransactionRegistry, DEFAULT_FINISHED_RETENTION};
