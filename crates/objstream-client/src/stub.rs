//! Stub Handle and Broken-Transport Recovery
//!
//! The read channel talks to storage through three trait seams rather than a
//! concrete tonic client, which is what lets the integration suite drive the
//! whole channel against an in-process fake:
//!
//! - [`ObjectStream`]: the lazy, finite, non-restartable server stream.
//!   Dropping the value cancels the RPC and releases any buffers the decode
//!   path still holds, so cancellation is the drop and is idempotent.
//! - [`StorageStub`]: one transport-bound client handle. Evictable: the
//!   channel swaps it for a fresh one when the transport is broken.
//! - [`StubProvider`]: makes stubs, classifies broken-transport status codes,
//!   and evicts transports from the shared pool.
//!
//! ## Recovery protocol
//!
//! On any RPC failure the channel asks the provider `is_stub_broken(code)`.
//! If broken, it evicts the stub's transport and installs a fresh stub before
//! the next retry attempt. Swapping only ever happens between attempts, never
//! during an in-flight call.

use crate::pool::ChannelPool;
use async_trait::async_trait;
use objstream_proto::storage_client::StorageClient;
use objstream_proto::{GetObjectRequest, Object, ReadObjectRequest, ReadObjectResponse};
use std::sync::Arc;
use std::time::Duration;
use tonic::{Code, Status};

/// A server stream of read responses.
///
/// Dropping the stream cancels the underlying RPC.
#[async_trait]
pub trait ObjectStream: Send {
    /// Next message, `None` at end of stream.
    async fn next_message(&mut self) -> Result<Option<ReadObjectResponse>, Status>;
}

/// One transport-bound storage client.
#[async_trait]
pub trait StorageStub: Send {
    /// Unary metadata lookup with a per-call deadline.
    async fn get_object(
        &mut self,
        request: GetObjectRequest,
        timeout: Duration,
    ) -> Result<Object, Status>;

    /// Open a server-streaming ranged read with a per-call deadline.
    async fn read_object(
        &mut self,
        request: ReadObjectRequest,
        timeout: Duration,
    ) -> Result<Box<dyn ObjectStream>, Status>;

    /// Identity of the transport backing this stub, for eviction.
    fn transport_id(&self) -> u64;
}

/// Creates stubs and owns the broken-transport policy.
#[async_trait]
pub trait StubProvider: Send + Sync {
    /// A stub bound to a (possibly shared) transport.
    async fn new_stub(&self) -> Result<Box<dyn StorageStub>, Status>;

    /// Whether a status code means the transport itself is unusable, as
    /// opposed to a per-request failure.
    fn is_stub_broken(&self, code: Code) -> bool;

    /// Drop the transport from the pool so no future stub is bound to it.
    async fn evict(&self, transport_id: u64);
}

/// [`StubProvider`] backed by a [`ChannelPool`] of tonic channels.
pub struct GrpcStubProvider {
    pool: Arc<ChannelPool>,
}

impl GrpcStubProvider {
    /// Provider dialing `endpoint` with at most `max_channels` transports.
    pub fn new(endpoint: impl Into<String>, max_channels: usize) -> Self {
        Self {
            pool: Arc::new(ChannelPool::new(endpoint, max_channels)),
        }
    }

    pub fn pool(&self) -> &Arc<ChannelPool> {
        &self.pool
    }
}

#[async_trait]
impl StubProvider for GrpcStubProvider {
    async fn new_stub(&self) -> Result<Box<dyn StorageStub>, Status> {
        let (transport_id, channel) = self.pool.checkout().await?;
        Ok(Box::new(GrpcStorageStub {
            client: StorageClient::new(channel),
            transport_id,
        }))
    }

    fn is_stub_broken(&self, code: Code) -> bool {
        matches!(code, Code::Unavailable | Code::DeadlineExceeded)
    }

    async fn evict(&self, transport_id: u64) {
        self.pool.evict(transport_id).await;
    }
}

struct GrpcStorageStub {
    client: StorageClient,
    transport_id: u64,
}

#[async_trait]
impl StorageStub for GrpcStorageStub {
    async fn get_object(
        &mut self,
        request: GetObjectRequest,
        timeout: Duration,
    ) -> Result<Object, Status> {
        let mut request = tonic::Request::new(request);
        request.set_timeout(timeout);
        Ok(self.client.get_object(request).await?.into_inner())
    }

    async fn read_object(
        &mut self,
        request: ReadObjectRequest,
        timeout: Duration,
    ) -> Result<Box<dyn ObjectStream>, Status> {
        let mut request = tonic::Request::new(request);
        request.set_timeout(timeout);
        let streaming = self.client.read_object(request).await?.into_inner();
        Ok(Box::new(GrpcObjectStream { inner: streaming }))
    }

    fn transport_id(&self) -> u64 {
        self.transport_id
    }
}

struct GrpcObjectStream {
    inner: tonic::codec::Streaming<ReadObjectResponse>,
}

#[async_trait]
impl ObjectStream for GrpcObjectStream {
    async fn next_message(&mut self) -> Result<Option<ReadObjectResponse>, Status> {
        self.inner.message().await
    }
}
