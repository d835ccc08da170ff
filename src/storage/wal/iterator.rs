//! Newest-first traversal of a flushed log.

use std::sync::Arc;

use log::debug;

use super::manager::read_boundary;
use super::record::{Record, LENGTH_PREFIX_SIZE};
use crate::storage::block::BlockId;
use crate::storage::disk::FileManager;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::page::Page;

/// Walks log records in reverse append order.
///
/// Within a block records are read from the boundary toward the end of the
/// block, which visits them newest to oldest; exhausted blocks are left for
/// the next lower block number. The iterator is single-pass.
pub struct LogIterator {
    file_manager: Arc<FileManager>,
    current_block: BlockId,
    current_position: usize,
    page: Page,
}

impl LogIterator {
    /// Starts at `block`, whose contents are already in `page`.
    pub(crate) fn new(
        file_manager: Arc<FileManager>,
        block: BlockId,
        page: Page,
    ) -> StorageResult<Self> {
        let current_position = read_boundary(&page, &block)?;
        Ok(Self {
            file_manager,
            current_block: block,
            current_position,
            page,
        })
    }

    /// Block the iterator is currently reading.
    pub fn current_block(&self) -> &BlockId {
        &self.current_block
    }

    pub fn has_next(&self) -> bool {
        self.current_position < self.page.size() || self.current_block.number() > 0
    }

    /// Returns the next older record.
    ///
    /// Fails with [`StorageError::IteratorExhausted`] once every record has
    /// been returned.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> StorageResult<Record> {
        while self.current_position >= self.page.size() {
            if self.current_block.number() == 0 {
                return Err(StorageError::IteratorExhausted);
            }
            self.move_to_block(self.current_block.number() - 1)?;
        }

        let length = self.page.read_u32(self.current_position)? as usize;
        let data_start = self.current_position + LENGTH_PREFIX_SIZE;
        let data_end = data_start + length;
        if data_end > self.page.size() {
            return Err(StorageError::CorruptedBlock {
                block: self.current_block.clone(),
                reason: format!(
                    "record at offset {} with length {} overruns the block",
                    self.current_position, length
                ),
            });
        }

        let mut data = vec![0u8; length];
        self.page.read(data_start, &mut data);
        self.current_position = data_end;

        Ok(Record::new(data))
    }

    fn move_to_block(&mut self, number: u64) -> StorageResult<()> {
        let block = self.current_block.with_number(number);
        self.file_manager.read(&block, &mut self.page)?;
        self.current_position = read_boundary(&self.page, &block)?;

        debug!(
            "Log iterator moved to {} (boundary {})",
            block, self.current_position
        );
        self.current_block = block;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::wal::manager::{LogManager, BOUNDARY_OFFSET};
    use anyhow::Result;
    use tempfile::tempdir;

    const BLOCK_SIZE: usize = 32;
    const LOG_FILE: &str = "test.log";

    fn collect(iter: &mut LogIterator) -> Result<Vec<Vec<u8>>> {
        let mut records = Vec::new();
        while iter.has_next() {
            records.push(iter.next()?.data().to_vec());
        }
        Ok(records)
    }

    #[test]
    fn test_reverse_order_across_blocks() -> Result<()> {
        let dir = tempdir()?;
        let fm = Arc::new(FileManager::new(dir.path(), BLOCK_SIZE)?);
        let lm = LogManager::new(fm.clone(), LOG_FILE)?;

        let payloads = [
            "record one",
            "record two",
            "record three",
            "record four",
            "record five",
            "record six",
            "record seven",
            "record eight",
            "record nine",
        ];
        for payload in payloads {
            lm.log(&Record::new(payload.as_bytes().to_vec()))?;
        }
        assert!(fm.file_size_in_blocks(LOG_FILE)? > 1);

        let mut iter = lm.iterator()?;
        let got = collect(&mut iter)?;
        let want: Vec<Vec<u8>> = payloads
            .iter()
            .rev()
            .map(|p| p.as_bytes().to_vec())
            .collect();
        assert_eq!(got, want);
        assert_eq!(iter.current_block().number(), 0);

        Ok(())
    }

    #[test]
    fn test_empty_log() -> Result<()> {
        let dir = tempdir()?;
        let fm = Arc::new(FileManager::new(dir.path(), BLOCK_SIZE)?);
        let lm = LogManager::new(fm, LOG_FILE)?;

        let mut iter = lm.iterator()?;
        assert!(!iter.has_next());
        assert!(matches!(iter.next(), Err(StorageError::IteratorExhausted)));

        Ok(())
    }

    #[test]
    fn test_next_after_exhaustion() -> Result<()> {
        let dir = tempdir()?;
        let fm = Arc::new(FileManager::new(dir.path(), BLOCK_SIZE)?);
        let lm = LogManager::new(fm, LOG_FILE)?;
        lm.log(&Record::new(&b"only"[..]))?;

        let mut iter = lm.iterator()?;
        assert!(iter.has_next());
        assert_eq!(iter.next()?.data(), b"only");
        assert!(!iter.has_next());
        assert!(matches!(iter.next(), Err(StorageError::IteratorExhausted)));

        Ok(())
    }

    #[test]
    fn test_skips_blocks_without_records() -> Result<()> {
        let dir = tempdir()?;
        let fm = Arc::new(FileManager::new(dir.path(), BLOCK_SIZE)?);

        let mut page = Page::new(BLOCK_SIZE);
        page.write_u32(BOUNDARY_OFFSET, 24)?;
        page.write(24, &Record::new(&b"old!"[..]).to_bytes())?;
        fm.write(&BlockId::new(LOG_FILE, 0), &page)?;

        // Blocks 1 and 2 were allocated but never received a record
        let mut empty = Page::new(BLOCK_SIZE);
        empty.write_u32(BOUNDARY_OFFSET, BLOCK_SIZE as u32)?;
        fm.write(&BlockId::new(LOG_FILE, 1), &empty)?;
        fm.write(&BlockId::new(LOG_FILE, 2), &empty)?;

        let lm = LogManager::new(fm, LOG_FILE)?;
        let mut iter = lm.iterator()?;
        assert_eq!(collect(&mut iter)?, vec![b"old!".to_vec()]);
        assert!(!iter.has_next());

        Ok(())
    }

    #[test]
    fn test_corrupt_record_length() -> Result<()> {
        let dir = tempdir()?;
        let fm = Arc::new(FileManager::new(dir.path(), BLOCK_SIZE)?);

        let mut page = Page::new(BLOCK_SIZE);
        page.write_u32(BOUNDARY_OFFSET, 24)?;
        page.write_u32(24, 100)?;
        fm.write(&BlockId::new(LOG_FILE, 0), &page)?;

        let lm = LogManager::new(fm, LOG_FILE)?;
        let mut iter = lm.iterator()?;
        assert!(matches!(
            iter.next(),
            Err(StorageError::CorruptedBlock { .. })
        ));

        Ok(())
    }
}
