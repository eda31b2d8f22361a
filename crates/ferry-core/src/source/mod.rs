//! Ranged reads against the source HTTP resource.
//!
//! One shared async client probes source metadata (`Content-Length`,
//! `Accept-Ranges`, ETag) and opens one ranged GET per part. A ranged
//! request answered with anything but 206 Partial Content means the source
//! cannot be read piecewise and the whole transfer aborts.

mod probe;

pub use probe::HeadResult;

use std::time::Duration;

use reqwest::header::RANGE;
use reqwest::StatusCode;

use crate::error::TransferError;
use crate::planner::Part;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
// Abort a part stream if the source goes quiet for this long; a hard
// wall-clock timeout would kill large parts on slow links.
const READ_TIMEOUT: Duration = Duration::from_secs(60);
const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the source side of a relay. Cheap to clone; connection
/// pooling is shared across all parts of all transfers using it.
#[derive(Debug, Clone)]
pub struct SourceClient {
    client: reqwest::Client,
}

impl SourceClient {
    /// Builds a client with connect and idle-read timeouts. Redirects are
    /// followed so pre-signed source URLs behind redirectors work.
    pub fn new() -> Result<Self, TransferError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(READ_TIMEOUT)
            .build()
            .map_err(|e| TransferError::Configuration(format!("http client: {e}")))?;
        Ok(Self { client })
    }

    /// Performs a HEAD request and returns parsed source metadata.
    pub async fn probe(&self, url: &str) -> Result<HeadResult, TransferError> {
        let response = self
            .client
            .head(url)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
            .map_err(|e| TransferError::SourceUnavailable(format!("HEAD {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransferError::SourceUnavailable(format!(
                "HEAD {url} returned HTTP {}",
                status.as_u16()
            )));
        }

        Ok(probe::head_result_from_headers(response.headers()))
    }

    /// Opens a ranged read for one part and returns the response whose body
    /// stream covers exactly that byte range. The stream is consumed once by
    /// the paired part uploader; nothing is buffered here.
    ///
    /// A success status other than 206 means the server ignored the Range
    /// header (fatal for piecewise reading); non-success statuses are
    /// ordinary source failures.
    pub async fn fetch_part(
        &self,
        url: &str,
        part: &Part,
    ) -> Result<reqwest::Response, TransferError> {
        let response = self
            .client
            .get(url)
            .header(RANGE, part.range_header_value())
            .send()
            .await
            .map_err(|e| {
                TransferError::SourceUnavailable(format!("part {}: {e}", part.number))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransferError::SourceUnavailable(format!(
                "part {}: source returned HTTP {}",
                part.number,
                status.as_u16()
            )));
        }
        if status != StatusCode::PARTIAL_CONTENT {
            return Err(TransferError::RangeUnsupported {
                status: status.as_u16(),
            });
        }

        tracing::debug!(
            part = part.number,
            range = %part.range_header_value(),
            "opened ranged read"
        );
        Ok(response)
    }
}
