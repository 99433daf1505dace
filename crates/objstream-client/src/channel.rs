//! Generation-Pinned Seekable Read Channel
//!
//! [`ObjectReadChannel`] presents one immutable object revision as a
//! byte-addressable, positionable stream. Random-access reads from the caller
//! are translated into a managed sequence of ranged streaming RPCs:
//!
//! ```text
//! read(dest)
//!     ↓
//! Request past the active range? → commit skip, cancel stream, drop carry-over
//!     ↓
//! Drain carry-over → absorb pending skip, copy parked chunk tail
//!     ↓
//! At end of object? → return what we have, or end-of-object
//!     ↓
//! Position in footer cache? → serve from memory, no RPC
//!     ↓
//! No active stream? → plan range, commit skip, open streaming RPC
//!     ↓
//! Pump responses → skip / checksum / copy / park surplus as carry-over
//!     ↓
//! Ran into the footer? → splice the tail from memory
//! ```
//!
//! The channel pins every read to the generation resolved at open, so bytes
//! never mix across revisions even if the object is overwritten mid-read.
//! One channel serves one caller; it is `Send` but deliberately not `Sync`.

use crate::carry_over::CarryOver;
use crate::chunk::ChunkReader;
use crate::config::{Fadvise, ReadOptions};
use crate::error::{ReadError, Result};
use crate::footer::{self, Footer};
use crate::resource::ResourceId;
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::strategy::ReadPlanner;
use crate::stub::{ObjectStream, StorageStub, StubProvider};
use bytes::Buf;
use objstream_proto::{GetObjectRequest, Object, ReadObjectRequest, ReadObjectResponse};
use prost_types::FieldMask;
use std::fmt;
use std::sync::Arc;
use tokio::time::sleep;
use tonic::Status;
use tracing::{debug, trace, warn};

/// Metadata field paths the open-time probe requests.
const METADATA_FIELDS: [&str; 3] = ["content_encoding", "generation", "size"];

/// The in-flight streaming read, if any.
struct ActiveStream {
    stream: Box<dyn ObjectStream>,
    /// Exclusive end of the requested range; `None` for an unbounded stream.
    end_offset: Option<u64>,
}

/// Seekable, generation-pinned read channel over one object revision.
pub struct ObjectReadChannel {
    stub: Box<dyn StorageStub>,
    provider: Arc<dyn StubProvider>,
    resource: ResourceId,

    /// Generation every read is pinned to, resolved at open.
    generation: i64,
    /// Size of the pinned revision in bytes.
    object_size: u64,

    open: bool,

    /// Offset of the next byte the stream/footer/carry-over machinery will
    /// deliver. The caller-visible position is `position + bytes_to_skip`.
    position: u64,

    /// Deferred in-place seek, absorbed lazily by the next read.
    bytes_to_skip: u64,

    carry_over: Option<CarryOver>,
    active: Option<ActiveStream>,
    footer: Option<Footer>,

    planner: ReadPlanner,
    chunks: ChunkReader,
    options: ReadOptions,
    retry: RetryPolicy,
}

impl ObjectReadChannel {
    /// Open a channel with the default retry policy.
    pub async fn open(
        provider: Arc<dyn StubProvider>,
        resource: ResourceId,
        options: ReadOptions,
    ) -> Result<Self> {
        Self::open_with_retry(provider, resource, options, RetryPolicy::default()).await
    }

    /// Open a channel: resolve metadata, reject gzip encoding, prefetch the
    /// footer, pin the generation.
    ///
    /// The whole attempt runs under the retry executor, so a transient
    /// failure in any step re-runs the open from scratch.
    pub async fn open_with_retry(
        provider: Arc<dyn StubProvider>,
        resource: ResourceId,
        options: ReadOptions,
        retry: RetryPolicy,
    ) -> Result<Self> {
        let policy = retry.clone();
        retry_with_backoff(&policy, ReadError::is_retryable, || {
            Self::open_channel(
                provider.clone(),
                resource.clone(),
                options.clone(),
                retry.clone(),
            )
        })
        .await
    }

    async fn open_channel(
        provider: Arc<dyn StubProvider>,
        resource: ResourceId,
        options: ReadOptions,
        retry: RetryPolicy,
    ) -> Result<Self> {
        let mut stub = provider
            .new_stub()
            .await
            .map_err(|status| ReadError::from_status(status, &resource))?;

        let object = Self::fetch_metadata(stub.as_mut(), &resource, &options, &retry).await?;

        // This channel does not decompress on the fly; fail fast instead of
        // returning gibberish.
        if object.content_encoding.contains("gzip") {
            return Err(ReadError::GzipEncodingUnsupported(resource.to_string()));
        }

        let object_size = u64::try_from(object.size).map_err(|_| ReadError::Transport {
            resource: resource.to_string(),
            source: Status::internal(format!("negative object size {}", object.size)),
        })?;

        let footer_start = object_size.saturating_sub(options.prefetch_size());
        let footer = if footer_start < object_size {
            footer::prefetch(stub.as_mut(), &resource, &options, footer_start)
                .await
                .map_err(|status| ReadError::from_status(status, &resource))?
        } else {
            None
        };

        debug!(
            resource = %resource,
            generation = object.generation,
            size = object_size,
            "Opened read channel"
        );

        Ok(Self {
            stub,
            provider,
            generation: object.generation,
            object_size,
            open: true,
            position: 0,
            bytes_to_skip: 0,
            carry_over: None,
            active: None,
            footer,
            planner: ReadPlanner::new(&options),
            chunks: ChunkReader::new(options.zero_copy_enabled),
            resource,
            options,
            retry,
        })
    }

    /// Metadata probe, retried on transient transport codes only. A missing
    /// object must surface immediately, not burn the backoff budget.
    async fn fetch_metadata(
        stub: &mut dyn StorageStub,
        resource: &ResourceId,
        options: &ReadOptions,
        retry: &RetryPolicy,
    ) -> Result<Object> {
        let request = GetObjectRequest {
            bucket: resource.v2_bucket(),
            object: resource.object.clone(),
            generation: resource.generation.unwrap_or(0),
            read_mask: Some(FieldMask {
                paths: METADATA_FIELDS.iter().map(|s| s.to_string()).collect(),
            }),
        };

        let mut backoff = retry.backoff_state();
        loop {
            match stub.get_object(request.clone(), options.read_timeout()).await {
                Ok(object) => return Ok(object),
                Err(status) if retry.is_retryable(&status) => match backoff.next_delay() {
                    Some(delay) => {
                        warn!(
                            resource = %resource,
                            code = ?status.code(),
                            attempt = backoff.attempt(),
                            backoff_ms = delay.as_millis() as u64,
                            "Metadata probe failed, backing off"
                        );
                        sleep(delay).await;
                    }
                    None => return Err(ReadError::from_status(status, resource)),
                },
                Err(status) => return Err(ReadError::from_status(status, resource)),
            }
        }
    }

    /// Read up to `dest.len()` bytes at the current logical position.
    ///
    /// Returns `Ok(Some(n))` with the bytes written, or `Ok(None)` at end of
    /// object. Blocks for at most one RPC round.
    pub async fn read(&mut self, dest: &mut [u8]) -> Result<Option<usize>> {
        if !self.open {
            return Err(ReadError::Closed);
        }

        trace!(
            resource = %self.resource,
            want = dest.len(),
            position = self.position + self.bytes_to_skip,
            "Read request"
        );

        let mut filled = 0usize;

        // A request reaching past the range the server was asked for cannot
        // be served by the active stream; reissue instead of continuing.
        if self
            .active
            .as_ref()
            .is_some_and(|active| self.exceeds_active_range(dest.len() as u64, active))
        {
            self.position += self.bytes_to_skip;
            self.bytes_to_skip = 0;
            self.cancel_active_stream();
            self.carry_over = None;
        }

        // The server responds in its own chunk sizes; whatever the caller
        // didn't take last time is parked in the carry-over and drains first.
        if let Some(carry) = self.carry_over.as_mut() {
            let skipped = carry.absorb_skip(self.bytes_to_skip);
            self.bytes_to_skip -= skipped;
            self.position += skipped;

            let n = carry.copy_into(&mut dest[filled..]);
            self.position += n as u64;
            filled += n;
        }
        if self.carry_over.as_ref().is_some_and(CarryOver::is_empty) {
            self.carry_over = None;
        }
        if filled == dest.len() {
            return Ok(Some(filled));
        }

        if self.position == self.object_size {
            return Ok(if filled > 0 { Some(filled) } else { None });
        }

        // Tail reads are served from the prefetched footer, never the wire.
        let effective = self.position + self.bytes_to_skip;
        if self
            .footer
            .as_ref()
            .is_some_and(|footer| effective >= footer.start_offset())
        {
            trace!(position = effective, "Serving read from footer cache");
            filled += self.read_footer_into(&mut dest[filled..]);
            return Ok(Some(filled));
        }

        if self.active.is_none() {
            self.issue_stream((dest.len() - filled) as u64).await?;
        }

        filled += self.pump_into(&mut dest[filled..]).await?;

        // A bounded stream ends where the footer begins; splice the rest
        // from memory.
        if filled < dest.len()
            && self
                .footer
                .as_ref()
                .is_some_and(|footer| self.position >= footer.start_offset())
        {
            filled += self.read_footer_into(&mut dest[filled..]);
        }

        Ok(Some(filled))
    }

    /// Logical read position, including any deferred in-place seek.
    pub fn position(&self) -> Result<u64> {
        if !self.open {
            return Err(ReadError::Closed);
        }
        Ok(self.position + self.bytes_to_skip)
    }

    /// Reposition the channel.
    ///
    /// A short forward seek is deferred and absorbed by the next read as an
    /// in-stream skip; anything else tears down the in-flight stream (and
    /// latches `Auto` to `Random`).
    pub fn seek(&mut self, new_position: u64) -> Result<()> {
        if !self.open {
            return Err(ReadError::Closed);
        }
        if new_position >= self.object_size {
            return Err(ReadError::SeekOutOfRange {
                position: new_position,
                size: self.object_size,
            });
        }
        if new_position == self.position {
            return Ok(());
        }

        let distance = new_position as i64 - self.position as i64;
        if self.planner.is_in_place(distance) {
            trace!(distance, "Deferred in-place seek");
            self.bytes_to_skip = distance as u64;
            return Ok(());
        }

        self.planner.record_seek(distance);
        self.cancel_active_stream();
        self.carry_over = None;
        self.position = new_position;
        self.bytes_to_skip = 0;
        Ok(())
    }

    /// Size of the pinned object revision.
    pub fn size(&self) -> Result<u64> {
        if !self.open {
            return Err(ReadError::Closed);
        }
        Ok(self.object_size)
    }

    /// Always fails: the channel is read-only.
    pub fn write(&mut self, _src: &[u8]) -> Result<usize> {
        Err(ReadError::ReadOnly)
    }

    /// Always fails: the channel is read-only.
    pub fn truncate(&mut self, _size: u64) -> Result<()> {
        Err(ReadError::ReadOnly)
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Cancel the in-flight stream, release the carry-over, and mark the
    /// channel closed. Idempotent; closed is sticky.
    pub fn close(&mut self) {
        self.cancel_active_stream();
        self.carry_over = None;
        self.open = false;
    }

    /// Generation every read is pinned to.
    pub fn generation(&self) -> i64 {
        self.generation
    }

    pub fn resource(&self) -> &ResourceId {
        &self.resource
    }

    /// Current access-pattern strategy (observes the `Auto` latch).
    pub fn read_strategy(&self) -> Fadvise {
        self.planner.strategy()
    }

    fn exceeds_active_range(&self, want: u64, active: &ActiveStream) -> bool {
        match active.end_offset {
            Some(end) => self.position + self.bytes_to_skip + want > end,
            None => false,
        }
    }

    /// Commit the deferred skip and copy footer bytes at the new position.
    fn read_footer_into(&mut self, dest: &mut [u8]) -> usize {
        self.position += self.bytes_to_skip;
        self.bytes_to_skip = 0;
        let Some(footer) = self.footer.as_ref() else {
            return 0;
        };
        let n = footer.copy_into(self.position, dest);
        self.position += n as u64;
        n
    }

    /// Open a new streaming read sized by the planner.
    ///
    /// The plan is computed against the pre-commit position; the deferred
    /// skip commits immediately after, so the request carries the caller's
    /// real offset.
    async fn issue_stream(&mut self, want: u64) -> Result<()> {
        let footer_start = self.footer.as_ref().map(Footer::start_offset);
        let planned = self.planner.plan_read(want, self.position, footer_start);
        self.position += self.bytes_to_skip;
        self.bytes_to_skip = 0;

        let request = ReadObjectRequest {
            bucket: self.resource.v2_bucket(),
            object: self.resource.object.clone(),
            generation: self.generation,
            read_offset: self.position as i64,
            read_limit: planned.map_or(0, |n| n as i64),
        };

        debug!(
            resource = %self.resource,
            read_offset = self.position,
            read_limit = ?planned,
            strategy = ?self.planner.strategy(),
            "Opening object stream"
        );

        let mut backoff = self.retry.backoff_state();
        let stream = loop {
            match self
                .stub
                .read_object(request.clone(), self.options.read_timeout())
                .await
            {
                Ok(stream) => break stream,
                Err(status) => {
                    self.recreate_stub_if_broken(&status).await;
                    match backoff.next_delay() {
                        Some(delay) => {
                            warn!(
                                resource = %self.resource,
                                code = ?status.code(),
                                attempt = backoff.attempt(),
                                backoff_ms = delay.as_millis() as u64,
                                "Stream open failed, backing off"
                            );
                            sleep(delay).await;
                        }
                        None => return Err(ReadError::from_status(status, &self.resource)),
                    }
                }
            }
        };

        self.active = Some(ActiveStream {
            stream,
            end_offset: planned.map(|n| self.position + n),
        });
        Ok(())
    }

    /// Pump response messages into `dest` until it fills or the stream ends.
    async fn pump_into(&mut self, dest: &mut [u8]) -> Result<usize> {
        let mut filled = 0usize;

        while filled < dest.len() {
            let Some(response) = self.next_response().await? else {
                break;
            };
            let Some(chunk) = self.chunks.claim(response) else {
                continue;
            };

            // A pending skip that swallows the whole chunk never copies.
            let chunk_len = chunk.len() as u64;
            if self.bytes_to_skip >= chunk_len {
                self.position += chunk_len;
                self.bytes_to_skip -= chunk_len;
                continue;
            }

            if self.options.checksums_enabled && chunk.has_checksum() {
                if let Err(err) = chunk.verify_checksum(&self.resource) {
                    // The chunk is consumed but its bytes were never
                    // delivered; continuing the stream would misalign the
                    // position. Served content is not retried.
                    self.cancel_active_stream();
                    return Err(err);
                }
            }

            let mut content = chunk.into_content();
            if self.bytes_to_skip > 0 {
                content.advance(self.bytes_to_skip as usize);
                self.position += self.bytes_to_skip;
                self.bytes_to_skip = 0;
            }

            let n = content.len().min(dest.len() - filled);
            dest[filled..filled + n].copy_from_slice(&content[..n]);
            filled += n;
            self.position += n as u64;

            if n < content.len() {
                // Park the surplus. The carry-over owns the chunk's buffer
                // from here until it drains, is invalidated, or the channel
                // closes.
                self.carry_over = Some(CarryOver::new(content, n));
            }
        }

        Ok(filled)
    }

    /// Next response from the active stream, retrying transient pump
    /// failures and recreating the stub when the transport is broken.
    /// `None` means the stream ended (or none is active).
    async fn next_response(&mut self) -> Result<Option<ReadObjectResponse>> {
        let mut backoff = self.retry.backoff_state();
        loop {
            let Some(active) = self.active.as_mut() else {
                return Ok(None);
            };
            match active.stream.next_message().await {
                Ok(Some(response)) => return Ok(Some(response)),
                Ok(None) => {
                    self.cancel_active_stream();
                    return Ok(None);
                }
                Err(status) => {
                    self.recreate_stub_if_broken(&status).await;
                    match backoff.next_delay() {
                        Some(delay) => {
                            warn!(
                                resource = %self.resource,
                                code = ?status.code(),
                                attempt = backoff.attempt(),
                                backoff_ms = delay.as_millis() as u64,
                                "Response pump failed, backing off"
                            );
                            sleep(delay).await;
                        }
                        None => {
                            self.cancel_active_stream();
                            return Err(ReadError::from_status(status, &self.resource));
                        }
                    }
                }
            }
        }
    }

    /// Swap in a fresh stub when the provider says the transport is broken.
    /// Only ever runs between RPC attempts, never during an in-flight call.
    async fn recreate_stub_if_broken(&mut self, status: &Status) {
        if !self.provider.is_stub_broken(status.code()) {
            return;
        }
        warn!(
            resource = %self.resource,
            code = ?status.code(),
            "Transport broken, evicting and recreating stub"
        );
        self.provider.evict(self.stub.transport_id()).await;
        match self.provider.new_stub().await {
            Ok(stub) => self.stub = stub,
            Err(status) => {
                warn!(
                    code = ?status.code(),
                    "Failed to recreate stub, keeping current transport"
                );
            }
        }
    }

    /// Abandon the in-flight stream. Dropping the stream cancels the RPC and
    /// releases any transport buffers the decode path still holds.
    fn cancel_active_stream(&mut self) {
        if self.active.take().is_some() {
            trace!(resource = %self.resource, "Cancelled in-flight read stream");
        }
    }
}

impl fmt::Debug for ObjectReadChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectReadChannel")
            .field("resource", &self.resource)
            .field("generation", &self.generation)
            .field("position", &(self.position + self.bytes_to_skip))
            .field("open", &self.open)
            .finish_non_exhaustive()
    }
}
