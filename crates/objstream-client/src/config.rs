//! Read Channel Configuration
//!
//! This module defines the tuning surface for [`ObjectReadChannel`]:
//!
//! - **fadvise**: declared access pattern. `Sequential` keeps one long server
//!   stream open; `Random` issues bounded range reads sized for the request;
//!   `Auto` starts sequential and latches to random on the first seek that
//!   cannot be absorbed in place.
//! - **min_range_request_size**: floor for bounded range reads, and the
//!   source of the footer prefetch size (`min_range_request_size / 2`).
//! - **inplace_seek_limit**: maximum forward seek distance absorbed by
//!   skipping bytes inside the active stream instead of reissuing an RPC.
//! - **read_timeout_ms**: per-RPC deadline.
//! - **checksums_enabled**: validate the CRC32C carried on each chunk.
//! - **zero_copy_enabled**: keep response payloads as views over the
//!   transport's receive buffers instead of copying them out.
//!
//! ## Usage
//!
//! ```ignore
//! use objstream_client::{Fadvise, ReadOptions};
//!
//! // Columnar/tail-heavy workload: bounded reads, bigger footer prefetch
//! let options = ReadOptions {
//!     fadvise: Fadvise::Random,
//!     min_range_request_size: 8 * 1024 * 1024,
//!     ..Default::default()
//! };
//! ```
//!
//! [`ObjectReadChannel`]: crate::ObjectReadChannel

use serde::{Deserialize, Serialize};

/// Declared access pattern for a read channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fadvise {
    /// Long unbounded stream; relies on transport flow control.
    Sequential,
    /// Bounded range reads sized by `min_range_request_size`.
    Random,
    /// Starts sequential; latches to [`Fadvise::Random`] on the first seek
    /// outside the in-place window. The latch is one-way.
    Auto,
}

/// Fine-grained options for a read channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadOptions {
    /// Access pattern hint (default: `Auto`)
    #[serde(default = "default_fadvise")]
    pub fadvise: Fadvise,

    /// Minimum size of a bounded range request in bytes (default: 2MB).
    /// Half of this is prefetched as the footer cache at open.
    #[serde(default = "default_min_range_request_size")]
    pub min_range_request_size: u64,

    /// Maximum forward seek distance absorbed in place, in bytes (default: 8MB)
    #[serde(default = "default_inplace_seek_limit")]
    pub inplace_seek_limit: u64,

    /// Per-RPC deadline in milliseconds (default: 20 minutes)
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    /// Validate per-chunk CRC32C checksums (default: false)
    #[serde(default)]
    pub checksums_enabled: bool,

    /// Retain response payloads as views over transport buffers (default: true)
    #[serde(default = "default_zero_copy_enabled")]
    pub zero_copy_enabled: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            fadvise: default_fadvise(),
            min_range_request_size: default_min_range_request_size(),
            inplace_seek_limit: default_inplace_seek_limit(),
            read_timeout_ms: default_read_timeout_ms(),
            checksums_enabled: false,
            zero_copy_enabled: default_zero_copy_enabled(),
        }
    }
}

impl ReadOptions {
    /// Footer prefetch size derived from the range request floor.
    pub fn prefetch_size(&self) -> u64 {
        self.min_range_request_size / 2
    }

    /// Per-RPC deadline as a [`std::time::Duration`].
    pub fn read_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.read_timeout_ms)
    }
}

fn default_fadvise() -> Fadvise {
    Fadvise::Auto
}

fn default_min_range_request_size() -> u64 {
    2 * 1024 * 1024 // 2MB, matches the server's chunking granularity
}

fn default_inplace_seek_limit() -> u64 {
    8 * 1024 * 1024 // 8MB
}

fn default_read_timeout_ms() -> u64 {
    20 * 60 * 1000 // 20 minutes
}

fn default_zero_copy_enabled() -> bool {
    true
}
