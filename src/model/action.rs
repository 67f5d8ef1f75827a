//! Action descriptors: what to run and on which line of control.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;

// ---------------------------------------------------------------------------
// Action kind
// ---------------------------------------------------------------------------

/// Marker for the closed set of operation kinds a store understands.
///
/// Implemented automatically for any small copyable enum; callers define
/// their kinds as a plain `#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]`
/// enum.
pub trait ActionKind: Copy + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> ActionKind for T where T: Copy + Eq + Hash + Debug + Send + Sync + 'static {}

// ---------------------------------------------------------------------------
// Execution mode
// ---------------------------------------------------------------------------

/// Where a handler runs once its action is admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// On the store's own task, before dispatch resolves.
    Sync,
    /// On the background executor. The store awaits the outcome.
    Async,
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ExecutionMode::Sync => "sync",
            ExecutionMode::Async => "async",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// An immutable request to mutate a store: an operation kind plus its
/// execution mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Action<K> {
    kind: K,
    mode: ExecutionMode,
}

impl<K: ActionKind> Action<K> {
    pub fn new(kind: K, mode: ExecutionMode) -> Self {
        Self { kind, mode }
    }

    /// An action whose handler runs inline on the store task.
    pub fn sync(kind: K) -> Self {
        Self::new(kind, ExecutionMode::Sync)
    }

    /// An action whose handler runs on the background executor.
    pub fn background(kind: K) -> Self {
        Self::new(kind, ExecutionMode::Async)
    }

    pub fn kind(&self) -> K {
        self.kind
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Label used in events, spans and metrics.
    pub fn label(&self) -> String {
        format!("{:?}", self.kind)
    }
}
