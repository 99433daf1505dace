//! Footer Cache
//!
//! Tail-structured formats (Parquet, ORC, zip archives) open with a burst of
//! small reads near the end of the object. A round trip per tail read is the
//! dominant cost of opening such files, so the channel prefetches the
//! trailing `min_range_request_size / 2` bytes once at open and serves every
//! read that lands at or past the footer start purely from memory — no RPC is
//! ever issued for the tail again.

use crate::config::ReadOptions;
use crate::resource::ResourceId;
use crate::stub::StorageStub;
use bytes::{Bytes, BytesMut};
use objstream_proto::ReadObjectRequest;
use tonic::Status;
use tracing::debug;

/// The object's trailing bytes, `[start_offset, object_size)`.
#[derive(Debug, Clone)]
pub struct Footer {
    start_offset: u64,
    content: Bytes,
}

impl Footer {
    pub fn start_offset(&self) -> u64 {
        self.start_offset
    }

    /// Copy footer bytes for object offset `position` into `dest`.
    ///
    /// Caller guarantees `position >= start_offset`. Returns the bytes
    /// written, zero when `position` is past the cached tail.
    pub fn copy_into(&self, position: u64, dest: &mut [u8]) -> usize {
        let skip = (position - self.start_offset) as usize;
        let available = self.content.len().saturating_sub(skip);
        let n = available.min(dest.len());
        dest[..n].copy_from_slice(&self.content[skip..skip + n]);
        n
    }
}

/// One-shot prefetch of the object tail starting at `start_offset`.
///
/// Concatenates every chunk of a single unbounded streaming read. An empty
/// response is tolerated and yields no footer. Runs inside the open-level
/// retry scope, so transient failures re-run the whole open attempt.
pub(crate) async fn prefetch(
    stub: &mut (dyn StorageStub + '_),
    resource: &ResourceId,
    options: &ReadOptions,
    start_offset: u64,
) -> Result<Option<Footer>, Status> {
    let request = ReadObjectRequest {
        bucket: resource.v2_bucket(),
        object: resource.object.clone(),
        generation: 0,
        read_offset: start_offset as i64,
        read_limit: 0,
    };

    let mut stream = stub.read_object(request, options.read_timeout()).await?;
    let mut content = BytesMut::new();
    while let Some(response) = stream.next_message().await? {
        if let Some(data) = response.checksummed_data {
            content.extend_from_slice(&data.content);
        }
    }

    if content.is_empty() {
        debug!(resource = %resource, "Footer prefetch returned no content");
        return Ok(None);
    }

    debug!(
        resource = %resource,
        start_offset,
        bytes = content.len(),
        "Prefetched object footer"
    );
    Ok(Some(Footer {
        start_offset,
        content: content.freeze(),
    }))
}
