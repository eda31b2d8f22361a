//! Part type and layout planning.

use crate::error::TransferError;

use super::{MAX_PART_COUNT, MIN_PART_SIZE};

/// A single part: byte range [start, end) (half-open), numbered 1..=N to
/// match the destination protocol's part numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Part {
    /// 1-based part number.
    pub number: i32,
    /// Start offset (inclusive).
    pub start: u64,
    /// End offset (exclusive).
    pub end: u64,
}

impl Part {
    /// Length of this part in bytes.
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// True when the range is empty (never produced by `plan`).
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// HTTP Range header value (inclusive end): `bytes=start-(end-1)`.
    pub fn range_header_value(&self) -> String {
        if self.is_empty() {
            "bytes=0-0".to_string()
        } else {
            format!("bytes={}-{}", self.start, self.end - 1)
        }
    }
}

/// The full part layout for one relay: the effective part size (possibly
/// raised above the requested one) and the ordered parts.
#[derive(Debug, Clone)]
pub struct PartLayout {
    /// Part size actually used; every part except possibly the last has
    /// exactly this many bytes.
    pub part_size: u64,
    /// Total bytes across all parts.
    pub total_bytes: u64,
    /// Parts in ascending number order.
    pub parts: Vec<Part>,
}

impl PartLayout {
    /// Number of planned parts.
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }
}

/// Builds the part layout for a given total size and requested part size.
///
/// The requested size is only ever adjusted upward: when it would produce
/// more than [`MAX_PART_COUNT`] parts, it is raised to
/// `ceil(total_bytes / MAX_PART_COUNT)`. Part sizes always sum to exactly
/// `total_bytes`; the last part carries the remainder. Pure and
/// deterministic; fails before any network traffic on invalid inputs.
pub fn plan(total_bytes: u64, requested_part_size: u64) -> Result<PartLayout, TransferError> {
    if total_bytes == 0 {
        return Err(TransferError::Configuration(
            "total size must be greater than zero".to_string(),
        ));
    }
    if requested_part_size < MIN_PART_SIZE {
        return Err(TransferError::Configuration(format!(
            "part size {} is below the protocol minimum of {} bytes",
            requested_part_size, MIN_PART_SIZE
        )));
    }

    let mut part_size = requested_part_size;
    if total_bytes.div_ceil(part_size) > MAX_PART_COUNT {
        part_size = total_bytes.div_ceil(MAX_PART_COUNT);
    }
    let count = total_bytes.div_ceil(part_size);

    let mut parts = Vec::with_capacity(count as usize);
    let mut offset = 0u64;
    for i in 0..count {
        let end = (offset + part_size).min(total_bytes);
        parts.push(Part {
            number: (i + 1) as i32,
            start: offset,
            end,
        });
        offset = end;
    }

    Ok(PartLayout {
        part_size,
        total_bytes,
        parts,
    })
}
