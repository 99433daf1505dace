//! gRPC Transport Channel Pool
//!
//! This module maintains a small, bounded set of transport channels to the
//! storage endpoint. Reusing channels avoids a TCP + TLS handshake per read
//! channel, and keeping more than one spreads concurrent readers across
//! HTTP/2 connections.
//!
//! ## Eviction
//!
//! A channel that produced a broken-transport status (`UNAVAILABLE`,
//! `DEADLINE_EXCEEDED`) is evicted by id; the next checkout dials a
//! replacement. Channels connect lazily, so checkout itself never performs
//! I/O and cannot fail.
//!
//! ## Thread Safety
//!
//! `ChannelPool` is `Send + Sync` and is shared via `Arc` by every read
//! channel created from one provider.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tonic::transport::{Channel, Endpoint};
use tonic::Status;
use tracing::{debug, warn};

/// Pool entry. The id survives clones of the channel handle, which is what
/// eviction keys on.
#[derive(Clone)]
struct PooledChannel {
    id: u64,
    channel: Channel,
}

/// Bounded pool of lazily-connected channels to one storage endpoint.
pub struct ChannelPool {
    endpoint: String,
    max_channels: usize,
    channels: Mutex<Vec<PooledChannel>>,
    next_id: AtomicU64,
    cursor: AtomicUsize,
}

impl ChannelPool {
    /// Create a pool for `endpoint` holding at most `max_channels` channels.
    pub fn new(endpoint: impl Into<String>, max_channels: usize) -> Self {
        Self {
            endpoint: endpoint.into(),
            max_channels: max_channels.max(1),
            channels: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            cursor: AtomicUsize::new(0),
        }
    }

    /// Check out a channel, dialing a new one if the pool has room.
    ///
    /// Returns the channel together with its pool id; the id is what
    /// [`ChannelPool::evict`] takes when the transport turns out broken.
    pub async fn checkout(&self) -> Result<(u64, Channel), Status> {
        let mut channels = self.channels.lock().await;

        if channels.len() < self.max_channels {
            let entry = self.dial()?;
            channels.push(entry.clone());
            debug!(
                endpoint = %self.endpoint,
                pool_size = channels.len(),
                id = entry.id,
                "Dialed new transport channel"
            );
            return Ok((entry.id, entry.channel));
        }

        // Round-robin over the full pool.
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % channels.len();
        let entry = &channels[index];
        Ok((entry.id, entry.channel.clone()))
    }

    /// Remove a channel from the pool so no future checkout returns it.
    ///
    /// Clones already handed out keep working (or keep failing) until their
    /// holders notice; eviction only stops the spread.
    pub async fn evict(&self, id: u64) {
        let mut channels = self.channels.lock().await;
        let before = channels.len();
        channels.retain(|entry| entry.id != id);
        if channels.len() < before {
            warn!(endpoint = %self.endpoint, id, "Evicted broken transport channel");
        }
    }

    /// Number of pooled channels.
    pub async fn len(&self) -> usize {
        self.channels.lock().await.len()
    }

    /// Whether the pool currently holds no channels.
    pub async fn is_empty(&self) -> bool {
        self.channels.lock().await.is_empty()
    }

    fn dial(&self) -> Result<PooledChannel, Status> {
        let endpoint = Endpoint::from_shared(self.endpoint.clone())
            .map_err(|e| Status::invalid_argument(format!("bad storage endpoint: {e}")))?
            .connect_timeout(Duration::from_secs(10))
            .tcp_keepalive(Some(Duration::from_secs(60)));

        // connect_lazy defers the dial to first use, so checkout stays
        // non-blocking and a dead endpoint surfaces as an RPC status.
        let channel = endpoint.connect_lazy();
        Ok(PooledChannel {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            channel,
        })
    }
}
