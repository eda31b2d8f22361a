//! Single part transfer: ranged fetch drained into one part upload.

use bytes::BytesMut;
use futures::StreamExt;

use crate::config::TransferRequest;
use crate::error::TransferError;
use crate::planner::Part;
use crate::source::SourceClient;
use crate::store::{ObjectStore, PartResult};

/// Fetches one part's byte range and hands it to the destination's
/// upload-part call. The response stream is drained into a buffer bounded
/// by the part size (never the whole object) with a byte-exact length
/// check, so a server that closes early or over-delivers is caught before
/// anything reaches the destination.
pub(super) async fn transfer_part(
    source: &SourceClient,
    store: &dyn ObjectStore,
    request: &TransferRequest,
    upload_id: &str,
    part: Part,
) -> Result<PartResult, TransferError> {
    let response = source.fetch_part(&request.source_url, &part).await?;

    let expected = part.len();
    let mut buf = BytesMut::with_capacity(expected as usize);
    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| {
            TransferError::SourceUnavailable(format!("part {}: {e}", part.number))
        })?;
        if (buf.len() + chunk.len()) as u64 > expected {
            return Err(TransferError::SourceUnavailable(format!(
                "part {}: source sent more than the requested {} bytes",
                part.number, expected
            )));
        }
        buf.extend_from_slice(&chunk);
    }

    let received = buf.len() as u64;
    if received != expected {
        return Err(TransferError::SourceUnavailable(format!(
            "part {}: short read, expected {} bytes, got {}",
            part.number, expected, received
        )));
    }

    let etag = store
        .upload_part(
            &request.bucket,
            &request.key,
            upload_id,
            part.number,
            buf.freeze(),
        )
        .await?;

    tracing::debug!(part = part.number, bytes = expected, "part uploaded");
    Ok(PartResult {
        part_number: part.number,
        size: expected,
        etag,
    })
}
