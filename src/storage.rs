//! Storage layer implementation for blocklog.
//!
//! This module provides block-addressed file storage and the write-ahead log
//! built on top of it. Key components:
//!
//! - **BlockId**: Names one fixed-size block of a file
//! - **Page**: In-memory image of exactly one block
//! - **FileManager**: Durable block reads and writes, one handle per file
//! - **LogManager**: Appends records to the log and flushes its tail block
//! - **LogIterator**: Replays logged records newest-first
//!
//! Block size is fixed per `FileManager` and is not persisted; a data
//! directory must always be reopened with the block size it was written with.

pub mod block;
pub mod disk;
pub mod error;
pub mod page;
pub mod wal;

pub use block::BlockId;
pub use disk::FileManager;
pub use error::{StorageError, StorageResult};
pub use page::Page;
pub use wal::{LogIterator, LogManager, Record, LSN};
