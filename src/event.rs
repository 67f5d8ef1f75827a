//! Structured events emitted by a store on every admission decision.
//!
//! Consumers subscribe through [`crate::store::Store::subscribe`] to build
//! audit logs or to observe replay order. Events are best-effort: a slow
//! subscriber that lags behind the channel capacity misses events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::{PendingId, QueueKind, StoreId};

/// A structured event emitted by a store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreEvent {
    /// Monotonic per-store sequence number. Consumers can detect gaps.
    pub seq: u64,
    /// When this event occurred.
    pub timestamp: DateTime<Utc>,
    /// Which store emitted it.
    pub store: StoreId,
    /// What happened.
    pub kind: EventKind,
}

impl StoreEvent {
    pub(crate) fn new(seq: u64, store: StoreId, kind: EventKind) -> Self {
        Self {
            seq,
            timestamp: Utc::now(),
            store,
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// A top-level dispatch was admitted and is executing.
    Admitted { payload: String },
    /// A dispatch's condition was false; it now waits in `queue`.
    Deferred {
        queue: QueueKind,
        pending_id: PendingId,
        payload: String,
    },
    /// A pending item became eligible during a drain and is executing.
    Replayed {
        queue: QueueKind,
        pending_id: PendingId,
        payload: String,
    },
    /// A top-level dispatch failed. When the failure came from a replayed
    /// item, a `ReplayFailed` naming that item precedes this event.
    Failed { payload: String, error: String },
    /// A replayed pending item failed. Later items in its queue stay queued.
    ReplayFailed {
        queue: QueueKind,
        pending_id: PendingId,
        payload: String,
        error: String,
    },
    /// A drain finished without failure.
    DrainCompleted {
        closures: usize,
        actions: usize,
        duration_ms: u64,
    },
    /// The store actor stopped.
    Stopped { dropped: usize },
}
