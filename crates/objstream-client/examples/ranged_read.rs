//! Ranged Read Example
//!
//! Opens a read channel against a storage gRPC endpoint (the real service or
//! a local emulator), seeks into the object, and streams a range to stdout.
//!
//! Run with:
//! ```bash
//! cargo run --package objstream-client --example ranged_read -- \
//!     http://localhost:9090 my-bucket path/to/object.bin 4096 65536
//! ```

use objstream_client::{GrpcStubProvider, ObjectReadChannel, ReadOptions, ResourceId};
use std::io::Write;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mut args = std::env::args().skip(1);
    let endpoint = args.next().unwrap_or_else(|| "http://localhost:9090".to_string());
    let bucket = args.next().unwrap_or_else(|| "test-bucket".to_string());
    let object = args.next().unwrap_or_else(|| "test-object".to_string());
    let offset: u64 = args.next().map(|s| s.parse()).transpose()?.unwrap_or(0);
    let length: usize = args.next().map(|s| s.parse()).transpose()?.unwrap_or(64 * 1024);

    let provider = Arc::new(GrpcStubProvider::new(endpoint, 2));
    let resource = ResourceId::new(bucket, object);

    let mut channel =
        ObjectReadChannel::open(provider, resource, ReadOptions::default()).await?;
    eprintln!(
        "opened {} generation={} size={}",
        channel.resource(),
        channel.generation(),
        channel.size()?
    );

    if offset > 0 {
        channel.seek(offset)?;
    }

    let mut stdout = std::io::stdout().lock();
    let mut buf = vec![0u8; 64 * 1024];
    let mut remaining = length;
    while remaining > 0 {
        let want = remaining.min(buf.len());
        match channel.read(&mut buf[..want]).await? {
            Some(0) => continue,
            Some(n) => {
                stdout.write_all(&buf[..n])?;
                remaining -= n;
            }
            None => break,
        }
    }

    channel.close();
    Ok(())
}
