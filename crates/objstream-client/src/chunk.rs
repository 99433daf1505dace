//! Zero-Copy Chunk Claiming
//!
//! Response messages carry their payload as [`Bytes`] views over the
//! transport's receive buffer. Claiming a chunk decides the buffer's fate:
//!
//! - **zero-copy enabled**: the view is kept as-is. Holding the [`Chunk`]
//!   (or the carry-over made from it) keeps the whole receive buffer alive;
//!   dropping it releases the reference. No memcpy on the read path.
//! - **zero-copy disabled**: the payload is copied into a fresh allocation
//!   and the receive buffer is released as soon as the response is dropped.
//!
//! The channel must drop every claimed chunk when it is consumed, when the
//! stream is cancelled, and on close. The single exception is a chunk whose
//! tail was installed as the carry-over, which owns the buffer for the
//! carry-over's lifetime.

use crate::error::{ReadError, Result};
use crate::resource::ResourceId;
use bytes::Bytes;
use objstream_proto::ReadObjectResponse;

/// Claims chunks out of response messages under one retention policy.
#[derive(Debug, Clone, Copy)]
pub struct ChunkReader {
    zero_copy: bool,
}

impl ChunkReader {
    pub fn new(zero_copy: bool) -> Self {
        Self { zero_copy }
    }

    /// Take ownership of a response's payload.
    ///
    /// Returns `None` for messages without content (metadata-only frames and
    /// empty chunks), which the pump loop skips without any position change.
    pub fn claim(&self, response: ReadObjectResponse) -> Option<Chunk> {
        let data = response.checksummed_data?;
        if data.content.is_empty() {
            return None;
        }
        let content = if self.zero_copy {
            data.content
        } else {
            Bytes::copy_from_slice(&data.content)
        };
        Some(Chunk {
            content,
            crc32c: data.crc32c,
        })
    }
}

/// One claimed chunk of object content.
#[derive(Debug)]
pub struct Chunk {
    content: Bytes,
    crc32c: Option<u32>,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Recompute the CRC32C over the full chunk and compare against the
    /// server's. A chunk that arrived without a checksum passes.
    ///
    /// Validation always covers the complete chunk, even when a pending
    /// in-place skip will trim the prefix before any byte is copied out.
    pub fn verify_checksum(&self, resource: &ResourceId) -> Result<()> {
        let Some(expected) = self.crc32c else {
            return Ok(());
        };
        let actual = crc32c::crc32c(&self.content);
        if actual != expected {
            return Err(ReadError::ChecksumMismatch {
                resource: resource.to_string(),
                expected,
                actual,
            });
        }
        Ok(())
    }

    pub fn has_checksum(&self) -> bool {
        self.crc32c.is_some()
    }

    /// Give up the payload; the caller decides how long the buffer lives.
    pub fn into_content(self) -> Bytes {
        self.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use objstream_proto::ChecksummedData;

    fn response(content: &[u8], crc32c: Option<u32>) -> ReadObjectResponse {
        ReadObjectResponse {
            checksummed_data: Some(ChecksummedData {
                content: Bytes::copy_from_slice(content),
                crc32c,
            }),
        }
    }

    #[test]
    fn test_claim_zero_copy_shares_buffer() {
        let response = response(b"hello", None);
        let backing = response.checksummed_data.as_ref().unwrap().content.clone();
        let chunk = ChunkReader::new(true).claim(response).unwrap();
        // Same backing allocation: the view starts at the same address.
        assert_eq!(chunk.content.as_ptr(), backing.as_ptr());
    }

    #[test]
    fn test_claim_copying_detaches_buffer() {
        let response = response(b"hello", None);
        let backing = response.checksummed_data.as_ref().unwrap().content.clone();
        let chunk = ChunkReader::new(false).claim(response).unwrap();
        assert_ne!(chunk.content.as_ptr(), backing.as_ptr());
        assert_eq!(chunk.content, backing);
    }

    #[test]
    fn test_claim_skips_contentless_messages() {
        let reader = ChunkReader::new(true);
        assert!(reader
            .claim(ReadObjectResponse {
                checksummed_data: None
            })
            .is_none());
        assert!(reader.claim(response(b"", None)).is_none());
    }

    #[test]
    fn test_checksum_match() {
        let payload = b"checksummed payload";
        let chunk = ChunkReader::new(true)
            .claim(response(payload, Some(crc32c::crc32c(payload))))
            .unwrap();
        assert!(chunk
            .verify_checksum(&ResourceId::new("b", "o"))
            .is_ok());
    }

    #[test]
    fn test_checksum_mismatch() {
        let payload = b"checksummed payload";
        let chunk = ChunkReader::new(true)
            .claim(response(payload, Some(crc32c::crc32c(payload) ^ 1)))
            .unwrap();
        let err = chunk
            .verify_checksum(&ResourceId::new("b", "o"))
            .unwrap_err();
        assert!(matches!(err, ReadError::ChecksumMismatch { .. }));
    }

    #[test]
    fn test_missing_checksum_passes() {
        let chunk = ChunkReader::new(true).claim(response(b"data", None)).unwrap();
        assert!(!chunk.has_checksum());
        assert!(chunk.verify_checksum(&ResourceId::new("b", "o")).is_ok());
    }
}
