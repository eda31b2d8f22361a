//! Destination object-store multipart protocol.
//!
//! The engine talks to the destination through the three-call multipart
//! surface (initiate, upload-part, complete) plus abort, behind a trait so
//! transfers can run against real S3-compatible services or the in-process
//! store used by tests and local runs. The client handle is owned by the
//! caller and passed into the engine explicitly.

pub mod memory;
pub mod s3;

pub use memory::MemoryStore;
pub use s3::{S3Store, S3StoreConfig};

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::TransferError;

/// Completion record for one uploaded part: the destination's opaque
/// completion token (etag) plus the byte count it accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartResult {
    /// 1-based part number.
    pub part_number: i32,
    /// Bytes accepted by the destination for this part.
    pub size: u64,
    /// Opaque completion token returned by the destination.
    pub etag: String,
}

/// Canonical reference to a committed destination object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub bucket: String,
    pub key: String,
    /// Final object size in bytes.
    pub size: u64,
    /// Destination etag of the completed object, when reported.
    pub etag: Option<String>,
}

/// The destination store's multipart-upload primitives.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Starts a multipart upload and returns its opaque upload identifier.
    /// `metadata` is attached to the final object.
    async fn create_upload(
        &self,
        bucket: &str,
        key: &str,
        metadata: &HashMap<String, String>,
    ) -> Result<String, TransferError>;

    /// Uploads one part and returns its completion token. Part numbers may
    /// arrive in any order.
    async fn upload_part(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: i32,
        body: Bytes,
    ) -> Result<String, TransferError>;

    /// Finalizes the object from the ordered part manifest.
    async fn complete_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: &[PartResult],
    ) -> Result<ObjectRef, TransferError>;

    /// Abandons an open multipart upload so the destination can reclaim the
    /// storage its parts hold.
    async fn abort_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
    ) -> Result<(), TransferError>;
}
