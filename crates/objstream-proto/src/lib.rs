//! Wire types for the `google.storage.v2` surface objstream consumes.
//!
//! This crate contains the protobuf message types and the gRPC client surface
//! for the two Storage RPCs the read channel uses:
//!
//! - **GetObject** (unary): resolves `{content_encoding, generation, size}`
//!   for an object so reads can be pinned to one generation.
//! - **ReadObject** (server-streaming): streams the object content as
//!   checksummed chunks from a requested `(read_offset, read_limit)` range.
//!
//! The messages are hand-written [`prost`] derives rather than
//! `tonic::include_proto!` output, so the build carries no protoc step. Field
//! numbers match `google/storage/v2/storage.proto`; only the fields the read
//! channel touches are declared — protobuf skips unknown fields, so these
//! types decode responses from a full Storage server unchanged.
//!
//! ## Usage
//!
//! ```ignore
//! use objstream_proto::{storage_client::StorageClient, ReadObjectRequest};
//!
//! let mut client = StorageClient::new(channel);
//! let mut stream = client
//!     .read_object(ReadObjectRequest {
//!         bucket: "projects/_/buckets/my-bucket".to_string(),
//!         object: "logs/2026-08-01.bin".to_string(),
//!         generation: 1234,
//!         read_offset: 0,
//!         read_limit: 0, // 0 = to end of object
//!     })
//!     .await?
//!     .into_inner();
//!
//! while let Some(response) = stream.message().await? {
//!     // response.checksummed_data
//! }
//! ```

use bytes::Bytes;

/// Request for the unary `GetObject` metadata lookup.
///
/// `generation == 0` asks for the live generation. `read_mask` restricts the
/// response to the listed field paths; the read channel always sends
/// `content_encoding, generation, size`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetObjectRequest {
    /// Bucket in v2 resource form: `projects/_/buckets/{bucket}`.
    #[prost(string, tag = "1")]
    pub bucket: String,

    /// Object name.
    #[prost(string, tag = "2")]
    pub object: String,

    /// Generation to describe; 0 means the live generation.
    #[prost(int64, tag = "3")]
    pub generation: i64,

    /// Field paths to populate in the response.
    #[prost(message, optional, tag = "12")]
    pub read_mask: Option<::prost_types::FieldMask>,
}

/// The subset of object metadata the read channel consumes.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Object {
    #[prost(string, tag = "1")]
    pub name: String,

    #[prost(string, tag = "2")]
    pub bucket: String,

    /// Generation of this object revision. Positive for any committed object.
    #[prost(int64, tag = "3")]
    pub generation: i64,

    /// Content length in bytes.
    #[prost(int64, tag = "6")]
    pub size: i64,

    /// Content-Encoding metadata, e.g. `gzip`. Empty when unset.
    #[prost(string, tag = "7")]
    pub content_encoding: String,
}

/// Request for the server-streaming `ReadObject` RPC.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ReadObjectRequest {
    /// Bucket in v2 resource form: `projects/_/buckets/{bucket}`.
    #[prost(string, tag = "1")]
    pub bucket: String,

    /// Object name.
    #[prost(string, tag = "2")]
    pub object: String,

    /// Generation to read; 0 means the live generation.
    #[prost(int64, tag = "3")]
    pub generation: i64,

    /// First byte to return.
    #[prost(int64, tag = "4")]
    pub read_offset: i64,

    /// Maximum bytes to return; 0 means to end of object.
    #[prost(int64, tag = "5")]
    pub read_limit: i64,
}

/// One message of the `ReadObject` response stream.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ReadObjectResponse {
    /// A chunk of object content with its checksum. The server may send
    /// messages without content (e.g. trailing metadata-only frames).
    #[prost(message, optional, tag = "1")]
    pub checksummed_data: Option<ChecksummedData>,
}

/// Object content with a CRC32C over exactly these bytes.
///
/// `content` decodes as [`Bytes`], a refcounted view over the transport's
/// receive buffer: holding the field keeps the buffer alive, dropping it
/// releases the reference.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChecksummedData {
    #[prost(bytes = "bytes", tag = "1")]
    pub content: Bytes,

    /// CRC32C (Castagnoli) of `content`, when the server computed one.
    #[prost(fixed32, optional, tag = "2")]
    pub crc32c: Option<u32>,
}

pub mod storage_client {
    //! Minimal gRPC client for the Storage service.
    //!
    //! Written in the shape tonic codegen emits (ready → codec → path →
    //! call) so the behavior matches generated clients exactly.

    use super::{GetObjectRequest, Object, ReadObjectRequest, ReadObjectResponse};
    use tonic::codegen::http;

    #[derive(Debug, Clone)]
    pub struct StorageClient {
        inner: tonic::client::Grpc<tonic::transport::Channel>,
    }

    impl StorageClient {
        pub fn new(channel: tonic::transport::Channel) -> Self {
            Self {
                inner: tonic::client::Grpc::new(channel),
            }
        }

        /// Unary metadata lookup.
        pub async fn get_object(
            &mut self,
            request: impl tonic::IntoRequest<GetObjectRequest>,
        ) -> Result<tonic::Response<Object>, tonic::Status> {
            self.inner
                .ready()
                .await
                .map_err(|e| tonic::Status::unknown(format!("Service was not ready: {e}")))?;
            let codec = tonic::codec::ProstCodec::default();
            let path =
                http::uri::PathAndQuery::from_static("/google.storage.v2.Storage/GetObject");
            self.inner.unary(request.into_request(), path, codec).await
        }

        /// Server-streaming ranged read. Dropping the returned
        /// [`tonic::codec::Streaming`] cancels the RPC.
        pub async fn read_object(
            &mut self,
            request: impl tonic::IntoRequest<ReadObjectRequest>,
        ) -> Result<tonic::Response<tonic::codec::Streaming<ReadObjectResponse>>, tonic::Status>
        {
            self.inner
                .ready()
                .await
                .map_err(|e| tonic::Status::unknown(format!("Service was not ready: {e}")))?;
            let codec = tonic::codec::ProstCodec::default();
            let path =
                http::uri::PathAndQuery::from_static("/google.storage.v2.Storage/ReadObject");
            self.inner
                .server_streaming(request.into_request(), path, codec)
                .await
        }
    }
}
