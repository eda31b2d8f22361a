//! Transfer scheduler: bounded concurrent part transfers.
//!
//! Keeps at most `queue_size` (fetch → upload) pairs in flight, refills one
//! slot whenever the earliest-settling part completes, and fails fast on
//! the first error: no new parts are issued, but parts already in flight
//! run to completion and their results are recorded before the error is
//! surfaced.

use std::collections::VecDeque;

use futures::stream::FuturesUnordered;
use futures::StreamExt;

use crate::config::TransferRequest;
use crate::error::TransferError;
use crate::planner::{Part, PartLayout};
use crate::session::MultipartSession;
use crate::source::SourceClient;
use crate::store::ObjectStore;

use super::part::transfer_part;

/// Drives all planned parts through the (fetch, upload) pipeline. Records
/// every settled part into `session` as it arrives; completion order is
/// unconstrained and carries no meaning.
pub(super) async fn run_parts(
    source: &SourceClient,
    store: &dyn ObjectStore,
    request: &TransferRequest,
    layout: &PartLayout,
    upload_id: &str,
    session: &mut MultipartSession,
) -> Result<(), TransferError> {
    let mut pending: VecDeque<Part> = layout.parts.iter().copied().collect();
    let mut in_flight = FuturesUnordered::new();
    let mut first_error: Option<TransferError> = None;

    let seed = request.queue_size.min(pending.len());
    for _ in 0..seed {
        if let Some(next) = pending.pop_front() {
            in_flight.push(transfer_part(source, store, request, upload_id, next));
        }
    }

    while let Some(settled) = in_flight.next().await {
        match settled {
            Ok(result) => {
                session.record(result);
                if first_error.is_none() {
                    if let Some(next) = pending.pop_front() {
                        in_flight.push(transfer_part(source, store, request, upload_id, next));
                    }
                }
            }
            Err(e) => {
                if first_error.is_none() {
                    tracing::warn!(error = %e, "part failed; draining in-flight parts");
                    first_error = Some(e);
                } else {
                    tracing::debug!(error = %e, "further part failure while draining");
                }
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
