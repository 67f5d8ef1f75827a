//! Dispatch span helpers.
//!
//! Provides span creation and outcome recording for requests flowing
//! through a store.

use tracing::Span;
use uuid::Uuid;

use crate::store::{PendingId, QueueKind};

/// Start a span for one top-level dispatch.
///
/// The `dispatch.outcome` field is declared empty and is filled via
/// [`record_outcome`] once the request is admitted, deferred or failed.
pub fn start_dispatch_span(store: &str, dispatch_id: &Uuid, payload: &str) -> Span {
    tracing::info_span!(
        "store.dispatch",
        "store.id" = store,
        "dispatch.id" = %dispatch_id,
        "dispatch.payload" = payload,
        "dispatch.outcome" = tracing::field::Empty,
    )
}

/// Start a span for a pending item replayed during a drain.
pub fn start_replay_span(store: &str, queue: QueueKind, pending_id: PendingId) -> Span {
    tracing::debug_span!(
        "store.replay",
        "store.id" = store,
        "pending.queue" = %queue,
        "pending.id" = pending_id.0,
    )
}

/// Record the admission outcome on a dispatch span.
pub fn record_outcome(span: &Span, outcome: &str) {
    span.record("dispatch.outcome", outcome);
}
