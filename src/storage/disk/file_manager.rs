use crate::storage::block::BlockId;
use crate::storage::error::{IoResultExt, StorageError, StorageResult};
use crate::storage::page::Page;
use log::{info, trace};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Smallest usable block: a log boundary plus one record length prefix.
pub const MIN_BLOCK_SIZE: usize = 8;

/// Block-addressed access to the files of one data directory.
///
/// Every operation runs under a single manager-wide lock, so concurrent
/// callers never observe torn blocks and each file is opened at most once.
/// Writes are synced before they return.
pub struct FileManager {
    data_dir: PathBuf,
    block_size: usize,
    is_new: bool,
    open_files: Mutex<HashMap<String, File>>,
}

impl FileManager {
    pub fn new(data_dir: impl AsRef<Path>, block_size: usize) -> StorageResult<Self> {
        if block_size < MIN_BLOCK_SIZE || block_size > u32::MAX as usize {
            return Err(StorageError::InvalidBlockSize(block_size));
        }

        let data_dir = data_dir.as_ref().to_path_buf();
        let is_new = !data_dir.exists();
        if is_new {
            fs::create_dir_all(&data_dir)
                .with_io_context(|| format!("creating data directory {:?}", data_dir))?;
        }

        info!(
            "File manager opened at {:?} (block size {}, new: {})",
            data_dir, block_size, is_new
        );

        Ok(Self {
            data_dir,
            block_size,
            is_new,
            open_files: Mutex::new(HashMap::new()),
        })
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Whether the data directory was created by this manager.
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Reads `block` into `page`, returning the number of bytes read.
    pub fn read(&self, block: &BlockId, page: &mut Page) -> StorageResult<usize> {
        self.check_page(page)?;

        let mut files = self.open_files.lock();
        let file = self.file_for(&mut files, block.file_name())?;

        let num_blocks = self.num_blocks(file, block.file_name())?;
        if block.number() >= num_blocks {
            return Err(StorageError::BlockOutOfBounds {
                block: block.clone(),
                num_blocks,
            });
        }

        file.seek(SeekFrom::Start(self.block_offset(block)))
            .with_io_context(|| format!("seeking to {}", block))?;

        let buf = page.bytes_mut();
        let mut read = 0;
        while read < buf.len() {
            match file.read(&mut buf[read..]) {
                Ok(0) => break,
                Ok(n) => read += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(StorageError::Io {
                        context: format!("reading {}", block),
                        source,
                    })
                }
            }
        }

        trace!("Read {} bytes from {}", read, block);
        Ok(read)
    }

    /// Writes `page` to `block`, growing the file if needed.
    pub fn write(&self, block: &BlockId, page: &Page) -> StorageResult<usize> {
        self.check_page(page)?;

        let mut files = self.open_files.lock();
        let file = self.file_for(&mut files, block.file_name())?;
        self.write_block(file, block, page)?;

        trace!("Wrote {} bytes to {}", page.size(), block);
        Ok(page.size())
    }

    /// Allocates a zeroed block at the end of `file_name`.
    pub fn append(&self, file_name: &str) -> StorageResult<BlockId> {
        let mut files = self.open_files.lock();
        let file = self.file_for(&mut files, file_name)?;

        let block = BlockId::new(file_name, self.num_blocks(file, file_name)?);
        self.write_block(file, &block, &Page::new(self.block_size))?;

        trace!("Appended {}", block);
        Ok(block)
    }

    /// Current length of `file_name` in whole blocks.
    pub fn file_size_in_blocks(&self, file_name: &str) -> StorageResult<u64> {
        let mut files = self.open_files.lock();
        let file = self.file_for(&mut files, file_name)?;
        self.num_blocks(file, file_name)
    }

    /// Syncs and releases every open handle. Files are reopened lazily on
    /// the next access.
    pub fn close(&self) -> StorageResult<()> {
        let mut files = self.open_files.lock();
        for (name, file) in files.drain() {
            file.sync_all()
                .with_io_context(|| format!("closing file {}", name))?;
        }
        Ok(())
    }

    fn file_for<'a>(
        &self,
        files: &'a mut HashMap<String, File>,
        file_name: &str,
    ) -> StorageResult<&'a mut File> {
        if !files.contains_key(file_name) {
            let path = self.data_dir.join(file_name);
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(&path)
                .with_io_context(|| format!("opening file {:?}", path))?;
            files.insert(file_name.to_string(), file);
        }

        files
            .get_mut(file_name)
            .ok_or_else(|| StorageError::Io {
                context: format!("looking up handle for {}", file_name),
                source: std::io::Error::from(ErrorKind::NotFound),
            })
    }

    fn write_block(&self, file: &mut File, block: &BlockId, page: &Page) -> StorageResult<()> {
        file.seek(SeekFrom::Start(self.block_offset(block)))
            .with_io_context(|| format!("seeking to {}", block))?;
        file.write_all(page.bytes())
            .with_io_context(|| format!("writing {}", block))?;
        file.sync_data()
            .with_io_context(|| format!("syncing {}", block))?;
        Ok(())
    }

    fn num_blocks(&self, file: &File, file_name: &str) -> StorageResult<u64> {
        let len = file
            .metadata()
            .with_io_context(|| format!("reading metadata of {}", file_name))?
            .len();
        Ok(len / self.block_size as u64)
    }

    fn block_offset(&self, block: &BlockId) -> u64 {
        block.number() * self.block_size as u64
    }

    fn check_page(&self, page: &Page) -> StorageResult<()> {
        if page.size() != self.block_size {
            return Err(StorageError::PageSizeMismatch {
                expected: self.block_size,
                actual: page.size(),
            });
        }
        Ok(())
    }
}
