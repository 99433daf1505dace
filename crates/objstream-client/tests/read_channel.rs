//! Integration tests for the read channel.
//!
//! The channel's seam is the stub trait, so the whole pipeline — open,
//! metadata probe, footer prefetch, range planning, carry-over, recovery —
//! is driven here against an in-process fake that records every request,
//! serves a configurable chunk size, and can inject transport failures and
//! corrupt checksums.

use async_trait::async_trait;
use bytes::Bytes;
use objstream_client::{
    Fadvise, ObjectReadChannel, ObjectStream, ReadError, ReadOptions, ResourceId, RetryPolicy,
    StorageStub, StubProvider,
};
use objstream_proto::{
    ChecksummedData, GetObjectRequest, Object, ReadObjectRequest, ReadObjectResponse,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tonic::{Code, Status};

const OBJECT_SIZE: usize = 10_000;
const GENERATION: i64 = 1_722_470_400_000_000;

/// Shared state behind the fake provider, stubs, and streams.
#[derive(Default)]
struct FakeState {
    data: Bytes,
    content_encoding: String,
    chunk_size: usize,
    missing: bool,
    with_checksums: bool,
    corrupt_crc: bool,
    empty_streams: bool,
    metadata_failures: usize,
    pump_failures: usize,
    metadata_requests: Vec<GetObjectRequest>,
    read_requests: Vec<ReadObjectRequest>,
    stubs_created: usize,
    evictions: Vec<u64>,
    next_transport: u64,
}

#[derive(Clone)]
struct FakeStorage {
    state: Arc<Mutex<FakeState>>,
}

impl FakeStorage {
    fn new(size: usize) -> Self {
        let data: Bytes = (0..size).map(|i| (i % 251) as u8).collect::<Vec<_>>().into();
        Self {
            state: Arc::new(Mutex::new(FakeState {
                data,
                chunk_size: 512,
                ..Default::default()
            })),
        }
    }

    fn provider(&self) -> Arc<dyn StubProvider> {
        Arc::new(FakeProvider {
            state: self.state.clone(),
        })
    }

    fn data(&self, range: std::ops::Range<usize>) -> Vec<u8> {
        self.state.lock().unwrap().data[range].to_vec()
    }

    fn chunk_size(&self, chunk_size: usize) -> &Self {
        self.state.lock().unwrap().chunk_size = chunk_size;
        self
    }

    fn content_encoding(&self, encoding: &str) -> &Self {
        self.state.lock().unwrap().content_encoding = encoding.to_string();
        self
    }

    fn missing(&self) -> &Self {
        self.state.lock().unwrap().missing = true;
        self
    }

    fn with_checksums(&self, corrupt: bool) -> &Self {
        let mut state = self.state.lock().unwrap();
        state.with_checksums = true;
        state.corrupt_crc = corrupt;
        self
    }

    fn empty_streams(&self) -> &Self {
        self.state.lock().unwrap().empty_streams = true;
        self
    }

    fn fail_metadata(&self, times: usize) -> &Self {
        self.state.lock().unwrap().metadata_failures = times;
        self
    }

    fn fail_pumps(&self, times: usize) -> &Self {
        self.state.lock().unwrap().pump_failures = times;
        self
    }

    fn metadata_requests(&self) -> Vec<GetObjectRequest> {
        self.state.lock().unwrap().metadata_requests.clone()
    }

    fn read_requests(&self) -> Vec<ReadObjectRequest> {
        self.state.lock().unwrap().read_requests.clone()
    }

    fn stubs_created(&self) -> usize {
        self.state.lock().unwrap().stubs_created
    }

    fn evictions(&self) -> Vec<u64> {
        self.state.lock().unwrap().evictions.clone()
    }
}

struct FakeProvider {
    state: Arc<Mutex<FakeState>>,
}

#[async_trait]
impl StubProvider for FakeProvider {
    async fn new_stub(&self) -> Result<Box<dyn StorageStub>, Status> {
        let mut state = self.state.lock().unwrap();
        state.stubs_created += 1;
        state.next_transport += 1;
        Ok(Box::new(FakeStub {
            state: self.state.clone(),
            transport_id: state.next_transport,
        }))
    }

    fn is_stub_broken(&self, code: Code) -> bool {
        matches!(code, Code::Unavailable | Code::DeadlineExceeded)
    }

    async fn evict(&self, transport_id: u64) {
        self.state.lock().unwrap().evictions.push(transport_id);
    }
}

struct FakeStub {
    state: Arc<Mutex<FakeState>>,
    transport_id: u64,
}

#[async_trait]
impl StorageStub for FakeStub {
    async fn get_object(
        &mut self,
        request: GetObjectRequest,
        _timeout: Duration,
    ) -> Result<Object, Status> {
        let mut state = self.state.lock().unwrap();
        state.metadata_requests.push(request.clone());
        if state.metadata_failures > 0 {
            state.metadata_failures -= 1;
            return Err(Status::unavailable("connection reset"));
        }
        if state.missing {
            return Err(Status::not_found("no such object"));
        }
        Ok(Object {
            name: request.object,
            bucket: request.bucket,
            generation: GENERATION,
            size: state.data.len() as i64,
            content_encoding: state.content_encoding.clone(),
        })
    }

    async fn read_object(
        &mut self,
        request: ReadObjectRequest,
        _timeout: Duration,
    ) -> Result<Box<dyn ObjectStream>, Status> {
        let mut state = self.state.lock().unwrap();
        state.read_requests.push(request.clone());

        let size = state.data.len() as u64;
        let start = (request.read_offset.max(0) as u64).min(size);
        let end = if request.read_limit > 0 {
            (start + request.read_limit as u64).min(size)
        } else {
            size
        };
        let end = if state.empty_streams { start } else { end };

        Ok(Box::new(FakeStream {
            state: self.state.clone(),
            next: start,
            end,
        }))
    }

    fn transport_id(&self) -> u64 {
        self.transport_id
    }
}

struct FakeStream {
    state: Arc<Mutex<FakeState>>,
    next: u64,
    end: u64,
}

#[async_trait]
impl ObjectStream for FakeStream {
    async fn next_message(&mut self) -> Result<Option<ReadObjectResponse>, Status> {
        let mut state = self.state.lock().unwrap();
        if state.pump_failures > 0 {
            state.pump_failures -= 1;
            return Err(Status::unavailable("transport dropped"));
        }
        if self.next >= self.end {
            return Ok(None);
        }

        let chunk_end = (self.next + state.chunk_size as u64).min(self.end);
        let content = state.data.slice(self.next as usize..chunk_end as usize);
        self.next = chunk_end;

        let crc32c = if state.with_checksums {
            let crc = crc32c::crc32c(&content);
            Some(if state.corrupt_crc { crc ^ 1 } else { crc })
        } else {
            None
        };

        Ok(Some(ReadObjectResponse {
            checksummed_data: Some(ChecksummedData { content, crc32c }),
        }))
    }
}

/// Scenario geometry: prefetch 1000 (footer start 9000), in-place window 256,
/// random range floor 2000.
fn scenario_options() -> ReadOptions {
    ReadOptions {
        fadvise: Fadvise::Auto,
        min_range_request_size: 2000,
        inplace_seek_limit: 256,
        read_timeout_ms: 5_000,
        ..Default::default()
    }
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(5, Duration::from_millis(1), Duration::from_millis(10), 2.0)
}

fn resource() -> ResourceId {
    ResourceId::new("test-bucket", "test/object.bin")
}

async fn open_channel(storage: &FakeStorage, options: ReadOptions) -> ObjectReadChannel {
    ObjectReadChannel::open_with_retry(storage.provider(), resource(), options, fast_retry())
        .await
        .unwrap()
}

/// Read exactly `n` bytes, failing the test on stalls or early end.
async fn read_exact(channel: &mut ObjectReadChannel, n: usize) -> Vec<u8> {
    let mut out = vec![0u8; n];
    let mut filled = 0;
    while filled < n {
        match channel.read(&mut out[filled..]).await.unwrap() {
            Some(0) => panic!("read made no progress at {filled}/{n}"),
            Some(k) => filled += k,
            None => panic!("unexpected end of object at {filled}/{n}"),
        }
    }
    out
}

// Scenario 1: a plain read from the start issues exactly one streaming RPC
// at offset 0 (plus the open-time footer prefetch).
#[tokio::test]
async fn sequential_read_from_start() {
    let storage = FakeStorage::new(OBJECT_SIZE);
    let mut channel = open_channel(&storage, scenario_options()).await;

    let bytes = read_exact(&mut channel, 100).await;
    assert_eq!(bytes, storage.data(0..100));

    let requests = storage.read_requests();
    assert_eq!(requests.len(), 2); // footer prefetch + one stream
    assert_eq!(requests[0].read_offset, 9000);
    assert_eq!(requests[1].read_offset, 0);
    // Auto plans an open-ended stream, bounded only by the cached footer.
    assert_eq!(requests[1].read_limit, 9000);
    assert_eq!(requests[1].generation, GENERATION);
}

// Scenario 2: a tail read is served entirely from the prefetched footer.
#[tokio::test]
async fn tail_read_never_issues_rpc() {
    let storage = FakeStorage::new(OBJECT_SIZE);
    let mut channel = open_channel(&storage, scenario_options()).await;

    channel.seek(9500).unwrap();
    let bytes = read_exact(&mut channel, 500).await;
    assert_eq!(bytes, storage.data(9500..10000));

    assert_eq!(storage.read_requests().len(), 1); // footer prefetch only
    assert_eq!(channel.read_strategy(), Fadvise::Random);
}

// Scenario 3: a short forward seek is absorbed inside the active stream.
#[tokio::test]
async fn inplace_seek_reuses_stream() {
    let storage = FakeStorage::new(OBJECT_SIZE);
    let mut channel = open_channel(&storage, scenario_options()).await;

    let head = read_exact(&mut channel, 100).await;
    channel.seek(150).unwrap();
    assert_eq!(channel.position().unwrap(), 150);
    let after_skip = read_exact(&mut channel, 50).await;

    assert_eq!(head, storage.data(0..100));
    assert_eq!(after_skip, storage.data(150..200));
    assert_eq!(channel.position().unwrap(), 200);

    // No reissue: skip of 50 is within the 256-byte in-place window.
    assert_eq!(storage.read_requests().len(), 2);
    assert_eq!(channel.read_strategy(), Fadvise::Auto);
}

// Scenario 4: a long seek tears down the stream, latches Auto to Random,
// and lands in the footer.
#[tokio::test]
async fn long_seek_cancels_stream_and_hits_footer() {
    let storage = FakeStorage::new(OBJECT_SIZE);
    let mut channel = open_channel(&storage, scenario_options()).await;

    let head = read_exact(&mut channel, 100).await;
    channel.seek(9000).unwrap();
    let tail = read_exact(&mut channel, 100).await;

    assert_eq!(head, storage.data(0..100));
    assert_eq!(tail, storage.data(9000..9100));
    assert_eq!(channel.read_strategy(), Fadvise::Random);

    // Footer prefetch + the offset-0 stream; the tail came from memory.
    assert_eq!(storage.read_requests().len(), 2);
}

// Scenario 5: random reads are sized max(want, range floor) and clamped
// against the footer.
#[tokio::test]
async fn random_read_range_sizing() {
    let storage = FakeStorage::new(OBJECT_SIZE);
    let mut channel = open_channel(&storage, scenario_options()).await;

    channel.seek(5000).unwrap();
    let bytes = read_exact(&mut channel, 3000).await;
    assert_eq!(bytes, storage.data(5000..8000));

    let requests = storage.read_requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].read_offset, 5000);
    // max(3000, max(256, 2000)) = 3000, clamped to min(3000, 9000-5000).
    assert_eq!(requests[1].read_limit, 3000);
}

// Scenario 6: a dropped transport is evicted, the stub recreated, and the
// pump retried without losing position.
#[tokio::test]
async fn transport_recovery_preserves_position() {
    let storage = FakeStorage::new(OBJECT_SIZE);
    storage.chunk_size(500);
    let mut channel = open_channel(&storage, scenario_options()).await;

    let first = read_exact(&mut channel, 500).await;
    storage.fail_pumps(1);
    let second = read_exact(&mut channel, 500).await;

    assert_eq!(first, storage.data(0..500));
    assert_eq!(second, storage.data(500..1000));

    assert_eq!(storage.evictions().len(), 1);
    assert_eq!(storage.stubs_created(), 2); // open + post-eviction recreate
    assert_eq!(storage.read_requests().len(), 2); // same stream kept pumping
}

// A request reaching past the bounded range tears the stream down and
// reissues at the committed position.
#[tokio::test]
async fn request_past_range_end_reissues() {
    let storage = FakeStorage::new(OBJECT_SIZE);
    let mut channel = open_channel(&storage, scenario_options()).await;

    channel.seek(5000).unwrap(); // latches Random
    let first = read_exact(&mut channel, 100).await; // stream [5000, 7000)
    let second = read_exact(&mut channel, 2000).await; // 5100 + 2000 > 7000

    assert_eq!(first, storage.data(5000..5100));
    assert_eq!(second, storage.data(5100..7100));

    let requests = storage.read_requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[1].read_offset, 5000);
    assert_eq!(requests[1].read_limit, 2000);
    assert_eq!(requests[2].read_offset, 5100);
    assert_eq!(requests[2].read_limit, 2000);
}

// A bounded stream ends where the footer begins; the remainder of the
// destination is spliced from memory within the same read call.
#[tokio::test]
async fn read_straddling_footer_boundary_splices() {
    let storage = FakeStorage::new(OBJECT_SIZE);
    let mut channel = open_channel(&storage, scenario_options()).await;

    channel.seek(8900).unwrap();
    let mut dest = vec![0u8; 150];
    let n = channel.read(&mut dest).await.unwrap();
    assert_eq!(n, Some(150));
    assert_eq!(dest, storage.data(8900..9050));

    let requests = storage.read_requests();
    assert_eq!(requests.len(), 2);
    // The wire part stops at the footer start.
    assert_eq!(requests[1].read_offset, 8900);
    assert_eq!(requests[1].read_limit, 100);
}

// Footer idempotence: any read of the last k <= prefetch bytes never issues
// an RPC after open.
#[tokio::test]
async fn footer_idempotence() {
    for k in [1usize, 256, 500, 1000] {
        let storage = FakeStorage::new(OBJECT_SIZE);
        let mut channel = open_channel(&storage, scenario_options()).await;

        channel.seek((OBJECT_SIZE - k) as u64).unwrap();
        let bytes = read_exact(&mut channel, k).await;
        assert_eq!(bytes, storage.data(OBJECT_SIZE - k..OBJECT_SIZE));
        assert_eq!(storage.read_requests().len(), 1, "k={k}");
    }
}

// In-place skip neutrality: read(n) ++ read(m) equals a single read(n+m).
#[tokio::test]
async fn split_reads_equal_single_read() {
    let storage = FakeStorage::new(OBJECT_SIZE);

    let mut split = open_channel(&storage, scenario_options()).await;
    let mut a = read_exact(&mut split, 300).await;
    let b = read_exact(&mut split, 300).await;
    a.extend_from_slice(&b);

    let mut whole = open_channel(&storage, scenario_options()).await;
    let combined = read_exact(&mut whole, 600).await;

    assert_eq!(a, combined);
    assert_eq!(combined, storage.data(0..600));
}

// Reassembly: across reads and seeks, every returned byte matches the object
// at its logical position.
#[tokio::test]
async fn reads_and_seeks_reassemble_object_bytes() {
    let storage = FakeStorage::new(OBJECT_SIZE);
    let mut channel = open_channel(&storage, scenario_options()).await;

    let script: [(u64, usize); 5] = [(0, 700), (100, 50), (5000, 1200), (6200, 400), (9995, 5)];
    for (offset, len) in script {
        channel.seek(offset).unwrap();
        let bytes = read_exact(&mut channel, len).await;
        assert_eq!(
            bytes,
            storage.data(offset as usize..offset as usize + len),
            "offset={offset} len={len}"
        );
    }

    // The script ends at the object end.
    let mut dest = [0u8; 16];
    assert_eq!(channel.read(&mut dest).await.unwrap(), None);
}

#[tokio::test]
async fn read_at_end_of_object_signals_eof() {
    let storage = FakeStorage::new(OBJECT_SIZE);
    let mut channel = open_channel(&storage, scenario_options()).await;

    channel.seek(9999).unwrap();
    let mut dest = [0u8; 8];
    assert_eq!(channel.read(&mut dest).await.unwrap(), Some(1));
    assert_eq!(channel.read(&mut dest).await.unwrap(), None);
    assert_eq!(channel.read(&mut dest).await.unwrap(), None);
}

#[tokio::test]
async fn seek_bounds_are_enforced() {
    let storage = FakeStorage::new(OBJECT_SIZE);
    let mut channel = open_channel(&storage, scenario_options()).await;

    assert!(channel.seek(9999).is_ok());
    let err = channel.seek(10_000).unwrap_err();
    assert!(matches!(err, ReadError::SeekOutOfRange { .. }));
    // Failed seek leaves the position untouched.
    assert_eq!(channel.position().unwrap(), 9999);
}

#[tokio::test]
async fn position_tracks_seeks_and_reads() {
    let storage = FakeStorage::new(OBJECT_SIZE);
    let mut channel = open_channel(&storage, scenario_options()).await;
    assert_eq!(channel.position().unwrap(), 0);

    for n in [5u64, 200, 9000, 42] {
        channel.seek(n).unwrap();
        assert_eq!(channel.position().unwrap(), n);
    }

    let _ = read_exact(&mut channel, 10).await;
    assert_eq!(channel.position().unwrap(), 52);
}

#[tokio::test]
async fn close_is_sticky_and_idempotent() {
    let storage = FakeStorage::new(OBJECT_SIZE);
    let mut channel = open_channel(&storage, scenario_options()).await;

    assert!(channel.is_open());
    channel.close();
    channel.close();
    assert!(!channel.is_open());

    let mut dest = [0u8; 8];
    assert!(matches!(
        channel.read(&mut dest).await.unwrap_err(),
        ReadError::Closed
    ));
    assert!(matches!(channel.seek(0).unwrap_err(), ReadError::Closed));
    assert!(matches!(channel.position().unwrap_err(), ReadError::Closed));
    assert!(matches!(channel.size().unwrap_err(), ReadError::Closed));
}

#[tokio::test]
async fn channel_is_read_only() {
    let storage = FakeStorage::new(OBJECT_SIZE);
    let mut channel = open_channel(&storage, scenario_options()).await;

    assert!(matches!(
        channel.write(b"nope").unwrap_err(),
        ReadError::ReadOnly
    ));
    assert!(matches!(
        channel.truncate(5).unwrap_err(),
        ReadError::ReadOnly
    ));
}

#[tokio::test]
async fn empty_destination_reads_zero_bytes() {
    let storage = FakeStorage::new(OBJECT_SIZE);
    let mut channel = open_channel(&storage, scenario_options()).await;

    let mut dest = [0u8; 0];
    assert_eq!(channel.read(&mut dest).await.unwrap(), Some(0));
    assert_eq!(storage.read_requests().len(), 1); // no stream opened
}

#[tokio::test]
async fn gzip_encoded_object_is_rejected_at_open() {
    let storage = FakeStorage::new(OBJECT_SIZE);
    storage.content_encoding("gzip");

    let err =
        ObjectReadChannel::open_with_retry(storage.provider(), resource(), scenario_options(), fast_retry())
            .await
            .unwrap_err();
    assert!(matches!(err, ReadError::GzipEncodingUnsupported(_)));
}

#[tokio::test]
async fn missing_object_maps_to_not_found_without_retry() {
    let storage = FakeStorage::new(OBJECT_SIZE);
    storage.missing();

    let err =
        ObjectReadChannel::open_with_retry(storage.provider(), resource(), scenario_options(), fast_retry())
            .await
            .unwrap_err();
    assert!(matches!(err, ReadError::NotFound(_)));
    assert_eq!(storage.metadata_requests().len(), 1);
}

#[tokio::test]
async fn metadata_probe_retries_transient_failures() {
    let storage = FakeStorage::new(OBJECT_SIZE);
    storage.fail_metadata(2);

    let channel = open_channel(&storage, scenario_options()).await;
    assert_eq!(channel.size().unwrap(), OBJECT_SIZE as u64);
    assert_eq!(storage.metadata_requests().len(), 3);
}

#[tokio::test]
async fn metadata_probe_sends_field_mask_and_generation() {
    let storage = FakeStorage::new(OBJECT_SIZE);
    let channel = ObjectReadChannel::open_with_retry(
        storage.provider(),
        resource().with_generation(777),
        scenario_options(),
        fast_retry(),
    )
    .await
    .unwrap();

    let requests = storage.metadata_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].bucket, "projects/_/buckets/test-bucket");
    assert_eq!(requests[0].generation, 777);
    assert_eq!(
        requests[0].read_mask.as_ref().unwrap().paths,
        vec!["content_encoding", "generation", "size"]
    );
    // Reads pin the generation the server resolved.
    assert_eq!(channel.generation(), GENERATION);
}

#[tokio::test]
async fn valid_checksums_pass_validation() {
    let storage = FakeStorage::new(OBJECT_SIZE);
    storage.with_checksums(false);

    let options = ReadOptions {
        checksums_enabled: true,
        ..scenario_options()
    };
    let mut channel = open_channel(&storage, options).await;
    let bytes = read_exact(&mut channel, 1500).await;
    assert_eq!(bytes, storage.data(0..1500));
}

#[tokio::test]
async fn corrupt_chunk_fails_the_read_and_leaves_channel_open() {
    let storage = FakeStorage::new(OBJECT_SIZE);
    storage.with_checksums(true);

    let options = ReadOptions {
        checksums_enabled: true,
        ..scenario_options()
    };
    let mut channel = open_channel(&storage, options).await;

    let mut dest = [0u8; 64];
    let err = channel.read(&mut dest).await.unwrap_err();
    assert!(matches!(err, ReadError::ChecksumMismatch { .. }));
    assert!(channel.is_open());
}

#[tokio::test]
async fn corrupt_chunks_are_ignored_when_validation_disabled() {
    let storage = FakeStorage::new(OBJECT_SIZE);
    storage.with_checksums(true);

    let mut channel = open_channel(&storage, scenario_options()).await;
    let bytes = read_exact(&mut channel, 100).await;
    assert_eq!(bytes, storage.data(0..100));
}

// A stream yielding zero messages for a non-empty range reads as
// end-of-stream: the call returns without error and without progress.
#[tokio::test]
async fn zero_message_stream_returns_accumulated_count() {
    let storage = FakeStorage::new(OBJECT_SIZE);
    storage.empty_streams();

    let mut channel = open_channel(&storage, scenario_options()).await;
    let mut dest = [0u8; 64];
    assert_eq!(channel.read(&mut dest).await.unwrap(), Some(0));
    assert!(channel.is_open());
}

// Without a footer (prefetch disabled), sequential streams are unbounded and
// carried across reads.
#[tokio::test]
async fn sequential_stream_is_unbounded_and_reused() {
    let storage = FakeStorage::new(OBJECT_SIZE);
    let options = ReadOptions {
        fadvise: Fadvise::Sequential,
        min_range_request_size: 0, // no footer prefetch
        inplace_seek_limit: 256,
        read_timeout_ms: 5_000,
        ..Default::default()
    };
    let mut channel = open_channel(&storage, options).await;

    for i in 0..4usize {
        let bytes = read_exact(&mut channel, 700).await;
        assert_eq!(bytes, storage.data(i * 700..(i + 1) * 700));
    }

    let requests = storage.read_requests();
    assert_eq!(requests.len(), 1); // one unbounded stream for everything
    assert_eq!(requests[0].read_offset, 0);
    assert_eq!(requests[0].read_limit, 0);
}

#[tokio::test]
async fn carry_over_drains_across_many_small_reads() {
    let storage = FakeStorage::new(OBJECT_SIZE);
    let mut channel = open_channel(&storage, scenario_options()).await;

    for i in 0..5usize {
        let bytes = read_exact(&mut channel, 100).await;
        assert_eq!(bytes, storage.data(i * 100..(i + 1) * 100));
    }
    // 512-byte chunks: five 100-byte reads all drain the first chunk's
    // carry-over; one stream, no reissue.
    assert_eq!(storage.read_requests().len(), 2);
}

#[tokio::test]
async fn empty_object_reads_eof_and_rejects_seek() {
    let storage = FakeStorage::new(0);
    let mut channel = open_channel(&storage, scenario_options()).await;

    assert_eq!(channel.size().unwrap(), 0);
    let mut dest = [0u8; 8];
    assert_eq!(channel.read(&mut dest).await.unwrap(), None);
    assert!(matches!(
        channel.seek(0).unwrap_err(),
        ReadError::SeekOutOfRange { .. }
    ));
    // No footer prefetch for an empty object.
    assert_eq!(storage.read_requests().len(), 0);
}

#[tokio::test]
async fn latch_survives_later_small_seeks() {
    let storage = FakeStorage::new(OBJECT_SIZE);
    let mut channel = open_channel(&storage, scenario_options()).await;

    channel.seek(5000).unwrap();
    assert_eq!(channel.read_strategy(), Fadvise::Random);

    channel.seek(5010).unwrap(); // in-place sized, but the latch holds
    assert_eq!(channel.read_strategy(), Fadvise::Random);
}
