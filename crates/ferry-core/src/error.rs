//! Transfer error taxonomy.
//!
//! One variant per failure class so callers can tell configuration mistakes,
//! source problems, destination rejections, and accounting mismatches apart
//! without string matching. The engine never swallows or retries any of
//! these; whole-transfer retry is a caller policy (see `retry`).

use thiserror::Error;

/// Error returned by the relay engine and its collaborators.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Invalid inputs (part size below the protocol floor, zero-byte source,
    /// bad URL). Detected before any network call.
    #[error("invalid transfer configuration: {0}")]
    Configuration(String),

    /// The source answered a ranged request with a success status other than
    /// 206 Partial Content, so it cannot be read piecewise. The transfer
    /// cannot proceed and is aborted rather than falling back to a
    /// whole-body read.
    #[error("source does not support ranged reads (got HTTP {status})")]
    RangeUnsupported { status: u16 },

    /// Network-level failure reading the source (connect, timeout, reset,
    /// short body, or a non-2xx source status). The only retryable kind.
    #[error("source read failed: {0}")]
    SourceUnavailable(String),

    /// The destination store rejected an initiate, part upload, or complete
    /// call (quota, auth, corrupt stream). Fatal for this attempt.
    #[error("destination upload failed: {0}")]
    DestinationUpload(String),

    /// Byte accounting did not match at commit time: fewer (or other) bytes
    /// were uploaded than the declared total. The upload is never completed
    /// in this state.
    #[error(
        "transfer incomplete: uploaded {uploaded} of {expected} bytes across {parts_recorded} part(s)"
    )]
    IncompleteTransfer {
        expected: u64,
        uploaded: u64,
        parts_recorded: usize,
    },
}

impl TransferError {
    /// True for failures worth retrying as a whole transfer. Only transient
    /// source reads qualify; everything else either cannot succeed on a
    /// second attempt or signals a bug that must surface.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransferError::SourceUnavailable(_))
    }
}
