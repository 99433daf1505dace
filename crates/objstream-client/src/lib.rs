//! objstream client — a seekable, generation-pinned read channel over gRPC
//! object storage.
//!
//! The channel maps arbitrary `(position, length)` reads onto long-lived
//! server-streaming RPCs whose chunk boundaries the client does not control,
//! with:
//!
//! - a **carry-over buffer** for the unread tail of the last server chunk,
//! - a **footer cache** that prefetches the object tail at open and serves
//!   tail reads without a server call,
//! - an **adaptive read strategy** (`Auto` latches sequential → random on the
//!   first seek it cannot absorb in place),
//! - **broken-transport recovery**: failed RPCs evict the pooled transport
//!   and retry on a fresh stub under bounded exponential backoff.
//!
//! # Example
//!
//! ```ignore
//! use objstream_client::{GrpcStubProvider, ObjectReadChannel, ReadOptions, ResourceId};
//! use std::sync::Arc;
//!
//! let provider = Arc::new(GrpcStubProvider::new("https://storage.googleapis.com", 4));
//! let resource = ResourceId::new("my-bucket", "logs/2026-08-01.bin");
//!
//! let mut channel = ObjectReadChannel::open(provider, resource, ReadOptions::default()).await?;
//!
//! channel.seek(4096)?;
//! let mut buf = vec![0u8; 1024];
//! while let Some(n) = channel.read(&mut buf).await? {
//!     // buf[..n] holds bytes at strictly increasing offsets from 4096
//! }
//! channel.close();
//! ```

pub mod carry_over;
pub mod channel;
pub mod chunk;
pub mod config;
pub mod error;
pub mod footer;
pub mod pool;
pub mod resource;
pub mod retry;
pub mod strategy;
pub mod stub;

pub use channel::ObjectReadChannel;
pub use config::{Fadvise, ReadOptions};
pub use error::{ReadError, Result};
pub use pool::ChannelPool;
pub use resource::ResourceId;
pub use retry::{retry_with_backoff, Backoff, RetryPolicy};
pub use stub::{GrpcStubProvider, ObjectStream, StorageStub, StubProvider};
