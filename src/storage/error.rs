//! Storage layer error types.

use thiserror::Error;

use crate::storage::block::BlockId;

/// Errors that can occur in the storage layer.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Block out of bounds: {block} (file has {num_blocks} blocks)")]
    BlockOutOfBounds { block: BlockId, num_blocks: u64 },

    #[error("Buffer overflow: {len} bytes at offset {offset} exceed page size {size}")]
    BufferOverflow {
        offset: usize,
        len: usize,
        size: usize,
    },

    #[error("Page size mismatch: expected {expected} bytes, got {actual}")]
    PageSizeMismatch { expected: usize, actual: usize },

    #[error("Record too large: {size} bytes (max: {max})")]
    RecordTooLarge { size: usize, max: usize },

    #[error("Invalid block size: {0}")]
    InvalidBlockSize(usize),

    #[error("Corrupted log block {block}: {reason}")]
    CorruptedBlock { block: BlockId, reason: String },

    #[error("Log iterator exhausted")]
    IteratorExhausted,

    #[error("IO error while {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Attaches operation context to raw I/O errors.
pub(crate) trait IoResultExt<T> {
    fn with_io_context<F>(self, f: F) -> StorageResult<T>
    where
        F: FnOnce() -> String;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_io_context<F>(self, f: F) -> StorageResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|source| StorageError::Io {
            context: f(),
            source,
        })
    }
}
