//! In-process destination store.
//!
//! Implements the multipart protocol against process memory, for tests and
//! local dry runs. Tracks peak concurrent part uploads and supports
//! injected per-part failures so scheduler behavior can be observed from
//! the outside.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::TransferError;

use super::{ObjectRef, ObjectStore, PartResult};

#[derive(Debug, Default)]
struct OpenUpload {
    bucket: String,
    key: String,
    metadata: HashMap<String, String>,
    parts: BTreeMap<i32, (Bytes, String)>,
}

/// A committed object: its bytes and the metadata attached at initiate time.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    uploads: HashMap<String, OpenUpload>,
    objects: HashMap<String, StoredObject>,
    completed: usize,
    aborted: usize,
}

/// Memory-backed `ObjectStore`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    fail_parts: HashSet<i32>,
    part_delay: Option<Duration>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every upload of this part number fails with a destination error.
    pub fn with_failing_part(mut self, part_number: i32) -> Self {
        self.fail_parts.insert(part_number);
        self
    }

    /// Holds each part upload open for `delay`, making concurrency
    /// observable via `peak_concurrent_uploads`.
    pub fn with_part_delay(mut self, delay: Duration) -> Self {
        self.part_delay = Some(delay);
        self
    }

    /// Bytes of a committed object, if present.
    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.inner
            .lock()
            .unwrap()
            .objects
            .get(&object_id(bucket, key))
            .cloned()
    }

    /// Number of successful complete calls.
    pub fn completed_count(&self) -> usize {
        self.inner.lock().unwrap().completed
    }

    /// Number of abort calls that found an open upload.
    pub fn aborted_count(&self) -> usize {
        self.inner.lock().unwrap().aborted
    }

    /// Multipart uploads still open (neither completed nor aborted).
    pub fn open_upload_count(&self) -> usize {
        self.inner.lock().unwrap().uploads.len()
    }

    /// Highest number of `upload_part` calls ever in flight at once.
    pub fn peak_concurrent_uploads(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    async fn upload_part_inner(
        &self,
        upload_id: &str,
        part_number: i32,
        body: Bytes,
    ) -> Result<String, TransferError> {
        if let Some(delay) = self.part_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_parts.contains(&part_number) {
            return Err(TransferError::DestinationUpload(format!(
                "part {part_number}: injected failure"
            )));
        }
        let mut inner = self.inner.lock().unwrap();
        let upload = inner
            .uploads
            .get_mut(upload_id)
            .ok_or_else(|| no_such_upload(upload_id))?;
        let etag = format!("etag-{}-{}", part_number, body.len());
        upload.parts.insert(part_number, (body, etag.clone()));
        Ok(etag)
    }
}

fn object_id(bucket: &str, key: &str) -> String {
    format!("{bucket}/{key}")
}

fn no_such_upload(upload_id: &str) -> TransferError {
    TransferError::DestinationUpload(format!("no such upload: {upload_id}"))
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn create_upload(
        &self,
        bucket: &str,
        key: &str,
        metadata: &HashMap<String, String>,
    ) -> Result<String, TransferError> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let upload_id = format!("upload-{}", inner.next_id);
        inner.uploads.insert(
            upload_id.clone(),
            OpenUpload {
                bucket: bucket.to_string(),
                key: key.to_string(),
                metadata: metadata.clone(),
                parts: BTreeMap::new(),
            },
        );
        Ok(upload_id)
    }

    async fn upload_part(
        &self,
        _bucket: &str,
        _key: &str,
        upload_id: &str,
        part_number: i32,
        body: Bytes,
    ) -> Result<String, TransferError> {
        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(in_flight, Ordering::SeqCst);
        let result = self.upload_part_inner(upload_id, part_number, body).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn complete_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: &[PartResult],
    ) -> Result<ObjectRef, TransferError> {
        let mut inner = self.inner.lock().unwrap();
        let upload = inner
            .uploads
            .remove(upload_id)
            .ok_or_else(|| no_such_upload(upload_id))?;

        // The manifest must be contiguous from part 1 and every entry must
        // match a part this upload actually received.
        let mut data = Vec::new();
        for (index, manifest_entry) in parts.iter().enumerate() {
            let expected_number = (index + 1) as i32;
            let entry_ok = manifest_entry.part_number == expected_number
                && upload
                    .parts
                    .get(&manifest_entry.part_number)
                    .map(|(_, etag)| *etag == manifest_entry.etag)
                    .unwrap_or(false);
            if !entry_ok {
                // A rejected complete leaves the upload open.
                inner.uploads.insert(upload_id.to_string(), upload);
                return Err(TransferError::DestinationUpload(format!(
                    "invalid manifest entry {index}: part {} unknown, out of order, or etag mismatch",
                    manifest_entry.part_number
                )));
            }
            if let Some((bytes, _)) = upload.parts.get(&manifest_entry.part_number) {
                data.extend_from_slice(bytes);
            }
        }

        let size = data.len() as u64;
        let etag = format!("object-{upload_id}");
        inner.objects.insert(
            object_id(&upload.bucket, &upload.key),
            StoredObject {
                data,
                metadata: upload.metadata,
            },
        );
        inner.completed += 1;
        Ok(ObjectRef {
            bucket: bucket.to_string(),
            key: key.to_string(),
            size,
            etag: Some(etag),
        })
    }

    async fn abort_upload(
        &self,
        _bucket: &str,
        _key: &str,
        upload_id: &str,
    ) -> Result<(), TransferError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.uploads.remove(upload_id).is_some() {
            inner.aborted += 1;
        }
        Ok(())
    }
}
