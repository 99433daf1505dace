//! Carry-Over Buffer
//!
//! The server streams content in its own chunk sizes (typically 2MB); the
//! caller's destination buffer is whatever it is. When a chunk outlives the
//! destination, the unread suffix is parked here and drained first on the
//! next read call.
//!
//! The carry-over owns the chunk's [`Bytes`], which under zero-copy is what
//! keeps the transport buffer alive. Exactly one owner at a time: replacement,
//! invalidation, and channel close all drop the value and release the buffer.

use bytes::Bytes;

/// Unread remainder of the most recent server chunk.
///
/// Its bytes correspond exactly to object offsets
/// `[position, position + remaining)` for the channel's current position.
#[derive(Debug)]
pub struct CarryOver {
    content: Bytes,
    read_offset: usize,
}

impl CarryOver {
    /// Park `content`, of which `read_offset` bytes are already consumed.
    pub fn new(content: Bytes, read_offset: usize) -> Self {
        debug_assert!(read_offset <= content.len());
        Self {
            content,
            read_offset,
        }
    }

    pub fn remaining(&self) -> usize {
        self.content.len() - self.read_offset
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Consume up to `limit` bytes as an in-buffer seek. Returns the number
    /// of bytes actually skipped.
    pub fn absorb_skip(&mut self, limit: u64) -> u64 {
        let skip = (self.remaining() as u64).min(limit);
        self.read_offset += skip as usize;
        skip
    }

    /// Copy as much as fits into `dest`, advancing the read offset.
    pub fn copy_into(&mut self, dest: &mut [u8]) -> usize {
        let n = self.remaining().min(dest.len());
        dest[..n].copy_from_slice(&self.content[self.read_offset..self.read_offset + n]);
        self.read_offset += n;
        n
    }
}
