//! Range math and part planning.
//!
//! Splits a relay into N numbered parts, computes HTTP Range header bounds,
//! and enforces the destination protocol's part-size floor and part-count
//! ceiling before any network call happens.

mod part;

pub use part::{Part, PartLayout, plan};

/// Smallest part size the destination multipart protocol accepts (5 MiB).
pub const MIN_PART_SIZE: u64 = 5 * 1024 * 1024;

/// Largest number of parts one multipart upload may carry.
pub const MAX_PART_COUNT: u64 = 10_000;
