//! Error types for read channel operations.
//!
//! ## Error Handling Strategy
//!
//! - **Retriable**: `Transport` — an RPC failed after the in-call retry
//!   budget, or an open attempt died partway. Retrying the whole operation
//!   can succeed.
//! - **Terminal**: `NotFound`, `EndOfObject`, `GzipEncodingUnsupported`,
//!   `ChecksumMismatch`, `SeekOutOfRange`, `ReadOnly`, `Closed` — retrying
//!   cannot change the outcome.
//!
//! Broken-transport and deadline-exhaustion conditions never surface here:
//! they are recognized by status code inside the retry loops, drive stub
//! eviction and recreation, and either resolve or eventually surface as
//! `Transport` with the final status attached.
//!
//! Status-code translation follows the wire contract: `NOT_FOUND` maps to
//! [`ReadError::NotFound`], `OUT_OF_RANGE` to [`ReadError::EndOfObject`],
//! everything else to [`ReadError::Transport`] with the resource identity in
//! the message.

use crate::resource::ResourceId;
use thiserror::Error;
use tonic::{Code, Status};

/// Convenience type alias for `Result<T, ReadError>`.
pub type Result<T> = std::result::Result<T, ReadError>;

/// Errors surfaced by [`ObjectReadChannel`](crate::ObjectReadChannel).
#[derive(Debug, Error)]
pub enum ReadError {
    /// The object (or the requested generation) does not exist.
    #[error("object '{0}' not found")]
    NotFound(String),

    /// The requested range starts at or beyond the end of the object.
    #[error("end of object '{0}'")]
    EndOfObject(String),

    /// A chunk's recomputed CRC32C did not match the checksum the server sent.
    ///
    /// Fatal to the read call and never retried: the content was already
    /// served. The channel stays open; the active stream is torn down by the
    /// next read or seek.
    #[error("chunk checksum ({actual:#010x}) didn't match expected checksum ({expected:#010x}) for '{resource}'")]
    ChecksumMismatch {
        resource: String,
        expected: u32,
        actual: u32,
    },

    /// The object is gzip content-encoded; this channel does not decompress.
    #[error("cannot read gzip content-encoded object '{0}'")]
    GzipEncodingUnsupported(String),

    /// The channel was closed. Sticky: every operation except `is_open` fails
    /// with this after `close()`.
    #[error("channel is closed")]
    Closed,

    /// Write or truncate on a read-only channel.
    #[error("cannot mutate read-only channel")]
    ReadOnly,

    /// Seek target outside `[0, size)`.
    #[error("read position {position} must be before end of object ({size})")]
    SeekOutOfRange { position: u64, size: u64 },

    /// An RPC failed and the backoff budget is exhausted.
    #[error("error reading '{resource}': {source}")]
    Transport {
        resource: String,
        #[source]
        source: Status,
    },
}

impl ReadError {
    /// Translate a terminal gRPC status into the surfaced error.
    pub fn from_status(status: Status, resource: &ResourceId) -> Self {
        match status.code() {
            Code::NotFound => ReadError::NotFound(resource.to_string()),
            Code::OutOfRange => ReadError::EndOfObject(resource.to_string()),
            _ => ReadError::Transport {
                resource: resource.to_string(),
                source: status,
            },
        }
    }

    /// Whether retrying the enclosing operation from scratch can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ReadError::Transport { .. })
    }
}
