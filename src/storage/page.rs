//! In-memory image of a single block.

use byteorder::{ByteOrder, LittleEndian};

use crate::storage::error::{StorageError, StorageResult};

/// Size in bytes of the integers stored by [`Page::write_u32`].
pub const U32_SIZE: usize = 4;

/// A zero-initialised byte buffer exactly one block long.
///
/// A page has no identity of its own; callers pair it with a
/// [`BlockId`](crate::storage::BlockId) when reading or writing through the
/// [`FileManager`](crate::storage::FileManager).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    data: Box<[u8]>,
}

impl Page {
    pub fn new(size: usize) -> Self {
        Self {
            data: vec![0u8; size].into_boxed_slice(),
        }
    }

    /// Wraps an existing buffer; the page size is the buffer length.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self {
            data: data.into_boxed_slice(),
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Copies `bytes` into the page at `offset`.
    ///
    /// Fails with [`StorageError::BufferOverflow`] if the write would run past
    /// the end of the page; nothing is written in that case.
    pub fn write(&mut self, offset: usize, bytes: &[u8]) -> StorageResult<usize> {
        let end = self.checked_end(offset, bytes.len())?;
        self.data[offset..end].copy_from_slice(bytes);
        Ok(bytes.len())
    }

    /// Copies up to `dest.len()` bytes starting at `offset` into `dest`.
    ///
    /// Returns the number of bytes copied, which is short (possibly zero) when
    /// the page ends before `dest` is filled.
    pub fn read(&self, offset: usize, dest: &mut [u8]) -> usize {
        if offset >= self.data.len() {
            return 0;
        }
        let n = dest.len().min(self.data.len() - offset);
        dest[..n].copy_from_slice(&self.data[offset..offset + n]);
        n
    }

    pub fn write_u32(&mut self, offset: usize, value: u32) -> StorageResult<()> {
        let end = self.checked_end(offset, U32_SIZE)?;
        LittleEndian::write_u32(&mut self.data[offset..end], value);
        Ok(())
    }

    pub fn read_u32(&self, offset: usize) -> StorageResult<u32> {
        let end = self.checked_end(offset, U32_SIZE)?;
        Ok(LittleEndian::read_u32(&self.data[offset..end]))
    }

    fn checked_end(&self, offset: usize, len: usize) -> StorageResult<usize> {
        match offset.checked_add(len) {
            Some(end) if end <= self.data.len() => Ok(end),
            _ => Err(StorageError::BufferOverflow {
                offset,
                len,
                size: self.data.len(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn test_new_page_is_zeroed() {
        let page = Page::new(32);
        assert_eq!(page.size(), 32);
        assert!(page.bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_write_and_read() -> Result<()> {
        let mut page = Page::new(16);

        let n = page.write(0, b"Hello, world!")?;
        assert_eq!(n, 13);

        let mut got = [0u8; 13];
        assert_eq!(page.read(0, &mut got), 13);
        assert_eq!(&got, b"Hello, world!");

        // Overwrite the tail of the greeting
        page.write(7, b"SimpleDB!")?;
        assert_eq!(page.bytes(), b"Hello, SimpleDB!");

        let mut section = [0u8; 8];
        page.read(7, &mut section);
        assert_eq!(&section, b"SimpleDB");

        Ok(())
    }

    #[test]
    fn test_write_past_end_fails() {
        let mut page = Page::new(16);
        page.write(0, b"0123456789abcdef").unwrap();

        let err = page.write(10, b"longer data").unwrap_err();
        assert!(matches!(
            err,
            StorageError::BufferOverflow {
                offset: 10,
                len: 11,
                size: 16
            }
        ));
        // Untouched on failure
        assert_eq!(page.bytes(), b"0123456789abcdef");

        assert!(page.write(usize::MAX, b"x").is_err());
    }

    #[test]
    fn test_short_read() {
        let page = Page::from_bytes(b"abcdef".to_vec());

        let mut dest = [0u8; 4];
        assert_eq!(page.read(4, &mut dest), 2);
        assert_eq!(&dest[..2], b"ef");

        assert_eq!(page.read(6, &mut dest), 0);
        assert_eq!(page.read(100, &mut dest), 0);
    }

    #[test]
    fn test_u32_little_endian() -> Result<()> {
        let mut page = Page::new(8);
        page.write_u32(2, 0x0403_0201)?;

        assert_eq!(&page.bytes()[2..6], &[1, 2, 3, 4]);
        assert_eq!(page.read_u32(2)?, 0x0403_0201);

        page.write_u32(4, u32::MAX)?;
        assert_eq!(page.read_u32(4)?, u32::MAX);

        Ok(())
    }

    #[test]
    fn test_u32_bounds() {
        let mut page = Page::new(8);
        assert!(page.write_u32(5, 1).is_err());
        assert!(page.read_u32(5).is_err());
        assert!(page.write_u32(4, 1).is_ok());
    }
}
