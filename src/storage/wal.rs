//! Write-Ahead Logging (WAL) module.
//!
//! This module implements the block-packed write-ahead log:
//! - Length-prefixed opaque records
//! - Backward packing of records into the tail block
//! - Flushing and durable LSN tracking
//! - Newest-first iteration for recovery

pub mod iterator;
pub mod manager;
pub mod record;

pub use iterator::LogIterator;
pub use manager::LogManager;
pub use record::{Record, LENGTH_PREFIX_SIZE, LSN};
