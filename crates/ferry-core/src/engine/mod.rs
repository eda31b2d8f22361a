//! Core multipart relay engine.
//!
//! Streams one HTTP source into a destination multipart upload: plan the
//! part layout, open the destination session, run up to `queue_size`
//! concurrent (ranged fetch → part upload) pairs, then verify byte totals
//! and commit. Fails fast on the first part error, drains parts already in
//! flight, and best-effort aborts the destination session so no storage is
//! left behind. No partial object is ever committed.

mod part;
mod run;

use crate::config::TransferRequest;
use crate::error::TransferError;
use crate::planner::{self, PartLayout};
use crate::session::MultipartSession;
use crate::source::SourceClient;
use crate::store::{ObjectRef, ObjectStore};

/// Relays `request.source_url` into `bucket/key` on `store` and returns the
/// committed object reference.
///
/// The store and source handles are owned by the caller and may be reused
/// across calls; all per-transfer state lives inside this call. The engine
/// never retries — wrap it with [`crate::retry::run_with_retry`] if a
/// caller-level policy is wanted.
pub async fn relay(
    store: &dyn ObjectStore,
    source: &SourceClient,
    request: &TransferRequest,
) -> Result<ObjectRef, TransferError> {
    let layout = planner::plan(request.total_bytes, request.part_size)?;
    tracing::info!(
        url = %request.source_url,
        bucket = %request.bucket,
        key = %request.key,
        parts = layout.part_count(),
        part_size = layout.part_size,
        queue_size = request.queue_size,
        "starting multipart relay"
    );

    let upload_id = store
        .create_upload(&request.bucket, &request.key, &request.metadata)
        .await?;
    let mut session = MultipartSession::new(upload_id.clone(), &request.bucket, &request.key);

    if let Err(e) =
        run::run_parts(source, store, request, &layout, &upload_id, &mut session).await
    {
        tracing::warn!(
            recorded = session.parts_recorded(),
            uploaded = session.uploaded_bytes(),
            "relay failed after draining in-flight parts"
        );
        abort_session(store, &session).await;
        return Err(e);
    }

    commit(store, &layout, session).await
}

/// Verifies completion accounting and issues the destination's complete
/// call. A byte-count mismatch never reaches the destination: the session
/// is aborted and the mismatch surfaces as an error.
async fn commit(
    store: &dyn ObjectStore,
    layout: &PartLayout,
    session: MultipartSession,
) -> Result<ObjectRef, TransferError> {
    if !session.is_complete(layout.total_bytes, layout.part_count()) {
        let err = TransferError::IncompleteTransfer {
            expected: layout.total_bytes,
            uploaded: session.uploaded_bytes(),
            parts_recorded: session.parts_recorded(),
        };
        abort_session(store, &session).await;
        return Err(err);
    }

    let manifest = session.manifest();
    match store
        .complete_upload(session.bucket(), session.key(), session.upload_id(), &manifest)
        .await
    {
        Ok(object) => {
            tracing::info!(
                bucket = %object.bucket,
                key = %object.key,
                size = object.size,
                "relay committed"
            );
            Ok(object)
        }
        Err(e) => {
            abort_session(store, &session).await;
            Err(e)
        }
    }
}

/// Best-effort abort of an uncommitted session. Failure to abort is logged,
/// not surfaced: the transfer error that got us here matters more, and the
/// destination can still reap the session out-of-band.
async fn abort_session(store: &dyn ObjectStore, session: &MultipartSession) {
    if let Err(e) = store
        .abort_upload(session.bucket(), session.key(), session.upload_id())
        .await
    {
        tracing::warn!(
            error = %e,
            upload_id = session.upload_id(),
            "failed to abort multipart session; destination may hold orphaned parts"
        );
    }
}
