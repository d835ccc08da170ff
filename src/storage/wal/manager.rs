//! Log manager implementation.
//!
//! The log manager packs records into the tail block of the log file. Each
//! block starts with a 4-byte little-endian *boundary*: the offset of the most
//! recently appended record. Records are placed backward from the end of the
//! block toward the boundary field, so free space is always `[4, boundary)`.
//! When a record no longer fits, the tail is flushed and a fresh block is
//! allocated.

use std::sync::Arc;

use log::{debug, info};
use parking_lot::Mutex;

use super::iterator::LogIterator;
use super::record::{Record, LSN};
use crate::storage::block::BlockId;
use crate::storage::disk::FileManager;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::page::{Page, U32_SIZE};

/// Offset of the boundary field within a log block.
pub(crate) const BOUNDARY_OFFSET: usize = 0;

/// Reads and validates the boundary stored in a log block.
pub(crate) fn read_boundary(page: &Page, block: &BlockId) -> StorageResult<usize> {
    let boundary = page.read_u32(BOUNDARY_OFFSET)? as usize;
    if boundary < U32_SIZE || boundary > page.size() {
        return Err(StorageError::CorruptedBlock {
            block: block.clone(),
            reason: format!(
                "boundary {} outside [{}, {}]",
                boundary,
                U32_SIZE,
                page.size()
            ),
        });
    }
    Ok(boundary)
}

/// Mutable log state, guarded by the manager lock.
struct LogState {
    /// In-memory image of the tail block.
    tail_page: Page,
    /// Highest block allocated for the log file.
    current_block: BlockId,
    /// LSN of the most recent append.
    latest_lsn: LSN,
    /// All appends up to this LSN are on disk.
    latest_durable_lsn: LSN,
}

/// Append-only write-ahead log over a single file.
pub struct LogManager {
    file_manager: Arc<FileManager>,
    log_file: String,
    state: Mutex<LogState>,
}

impl LogManager {
    /// Opens the log file, allocating its first block if it is empty.
    pub fn new(file_manager: Arc<FileManager>, log_file: impl Into<String>) -> StorageResult<Self> {
        let log_file = log_file.into();
        let block_size = file_manager.block_size();
        let num_blocks = file_manager.file_size_in_blocks(&log_file)?;

        let mut tail_page = Page::new(block_size);
        let current_block = if num_blocks == 0 {
            let block = BlockId::new(&log_file, 0);
            tail_page.write_u32(BOUNDARY_OFFSET, block_size as u32)?;
            file_manager.write(&block, &tail_page)?;
            block
        } else {
            let block = BlockId::new(&log_file, num_blocks - 1);
            file_manager.read(&block, &mut tail_page)?;
            read_boundary(&tail_page, &block)?;
            block
        };

        info!(
            "Log manager opened {} ({} existing blocks, tail {})",
            log_file, num_blocks, current_block
        );

        Ok(Self {
            file_manager,
            log_file,
            state: Mutex::new(LogState {
                tail_page,
                current_block,
                latest_lsn: LSN::new(),
                latest_durable_lsn: LSN::new(),
            }),
        })
    }

    pub fn log_file(&self) -> &str {
        &self.log_file
    }

    pub fn file_manager(&self) -> &Arc<FileManager> {
        &self.file_manager
    }

    pub fn latest_lsn(&self) -> LSN {
        self.state.lock().latest_lsn
    }

    pub fn latest_durable_lsn(&self) -> LSN {
        self.state.lock().latest_durable_lsn
    }

    pub fn current_block(&self) -> BlockId {
        self.state.lock().current_block.clone()
    }

    /// Largest record payload a single block can hold.
    pub fn max_record_length(&self) -> usize {
        self.file_manager.block_size() - 2 * U32_SIZE
    }

    /// Boundary of the in-memory tail block.
    pub fn tail_boundary(&self) -> StorageResult<usize> {
        let state = self.state.lock();
        read_boundary(&state.tail_page, &state.current_block)
    }

    /// Appends `record` to the log and returns its LSN.
    ///
    /// The record is only in memory until the next flush.
    pub fn log(&self, record: &Record) -> StorageResult<LSN> {
        let block_size = self.file_manager.block_size();
        let capacity = block_size - U32_SIZE;
        if record.total_length() > capacity {
            return Err(StorageError::RecordTooLarge {
                size: record.total_length(),
                max: capacity,
            });
        }

        let mut state = self.state.lock();
        let mut boundary = read_boundary(&state.tail_page, &state.current_block)?;
        if record.total_length() > boundary - U32_SIZE {
            self.flush_locked(&mut state)?;
            self.roll_over(&mut state)?;
            boundary = block_size;
        }

        let position = boundary - record.total_length();
        state.tail_page.write(position, &record.to_bytes())?;
        state.tail_page.write_u32(BOUNDARY_OFFSET, position as u32)?;

        state.latest_lsn = state.latest_lsn.next();
        Ok(state.latest_lsn)
    }

    /// Writes the tail block to disk, making every append so far durable.
    pub fn flush(&self) -> StorageResult<()> {
        let mut state = self.state.lock();
        self.flush_locked(&mut state)
    }

    /// Flushes only if `lsn` is not yet durable.
    pub fn flush_to(&self, lsn: LSN) -> StorageResult<()> {
        let mut state = self.state.lock();
        if lsn > state.latest_durable_lsn {
            self.flush_locked(&mut state)?;
        }
        Ok(())
    }

    /// Flushes the log and returns an iterator over every record, newest first.
    pub fn iterator(&self) -> StorageResult<LogIterator> {
        let mut state = self.state.lock();
        self.flush_locked(&mut state)?;
        LogIterator::new(
            self.file_manager.clone(),
            state.current_block.clone(),
            state.tail_page.clone(),
        )
    }

    fn flush_locked(&self, state: &mut LogState) -> StorageResult<()> {
        self.file_manager
            .write(&state.current_block, &state.tail_page)?;
        state.latest_durable_lsn = state.latest_lsn;
        debug!(
            "Flushed {} up to {}",
            state.current_block, state.latest_durable_lsn
        );
        Ok(())
    }

    /// Allocates and persists an empty block after the current tail.
    fn roll_over(&self, state: &mut LogState) -> StorageResult<()> {
        let block_size = self.file_manager.block_size();
        let block = state.current_block.with_number(state.current_block.number() + 1);

        let mut page = Page::new(block_size);
        page.write_u32(BOUNDARY_OFFSET, block_size as u32)?;
        self.file_manager.write(&block, &page)?;

        debug!("Allocated log block {}", block);
        state.tail_page = page;
        state.current_block = block;
        Ok(())
    }
}
