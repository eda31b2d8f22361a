//! Multipart session accounting.
//!
//! Owns the destination upload identifier and the completion records for
//! one in-progress relay. Parts settle in arbitrary order; the manifest
//! handed to the destination's complete call is keyed by part number, so
//! it comes out numerically ordered no matter when each part finished.

use std::collections::BTreeMap;

use crate::store::PartResult;

/// Destination-side context for one multipart relay. Lives only for the
/// duration of a single engine call; nothing survives the process.
#[derive(Debug)]
pub struct MultipartSession {
    upload_id: String,
    bucket: String,
    key: String,
    uploaded_bytes: u64,
    parts: BTreeMap<i32, PartResult>,
}

impl MultipartSession {
    pub fn new(upload_id: String, bucket: &str, key: &str) -> Self {
        Self {
            upload_id,
            bucket: bucket.to_string(),
            key: key.to_string(),
            uploaded_bytes: 0,
            parts: BTreeMap::new(),
        }
    }

    pub fn upload_id(&self) -> &str {
        &self.upload_id
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Bytes the destination has accepted so far.
    pub fn uploaded_bytes(&self) -> u64 {
        self.uploaded_bytes
    }

    /// Number of parts recorded so far.
    pub fn parts_recorded(&self) -> usize {
        self.parts.len()
    }

    /// Records one settled part. Part numbers are unique by construction;
    /// a duplicate would mean the scheduler launched a part twice.
    pub fn record(&mut self, result: PartResult) {
        self.uploaded_bytes += result.size;
        let replaced = self.parts.insert(result.part_number, result);
        debug_assert!(replaced.is_none(), "part recorded twice");
    }

    /// True when every planned part is present and the byte counter matches
    /// the declared total. Only then may the session be committed.
    pub fn is_complete(&self, total_bytes: u64, part_count: usize) -> bool {
        self.uploaded_bytes == total_bytes
            && self.parts.len() == part_count
            && self.parts.keys().next() == Some(&1)
            && self.parts.keys().next_back() == Some(&(part_count as i32))
    }

    /// The ordered part manifest for the destination's complete call.
    pub fn manifest(&self) -> Vec<PartResult> {
        self.parts.values().cloned().collect()
    }
}
