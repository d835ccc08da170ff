//! Log records and sequence numbers.

use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

/// Size of the little-endian length prefix in front of every record.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Log Sequence Number - identifies an append by its position in append order.
/// The first append yields `LSN(1)`; `LSN(0)` means nothing has been logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct LSN(pub u64);

impl LSN {
    pub fn new() -> Self {
        LSN(0)
    }

    pub fn next(&self) -> Self {
        LSN(self.0 + 1)
    }
}

impl fmt::Display for LSN {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LSN({})", self.0)
    }
}

/// An opaque, length-prefixed log payload.
///
/// Wire format: `[u32 little-endian length][length bytes of data]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    data: Bytes,
}

impl Record {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }

    /// Payload length, excluding the prefix.
    pub fn length(&self) -> usize {
        self.data.len()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Bytes {
        self.data
    }

    /// Bytes the record occupies in a block.
    pub fn total_length(&self) -> usize {
        LENGTH_PREFIX_SIZE + self.data.len()
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.total_length());
        buf.put_u32_le(self.data.len() as u32);
        buf.put_slice(&self.data);
        buf.freeze()
    }
}
