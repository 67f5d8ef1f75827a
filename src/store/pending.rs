//! Pending queues: deferred work awaiting a true condition.
//!
//! Each item carries a monotonic [`PendingId`]. Replay order is id order,
//! and removal is by id, never by position.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::handler::{Completion, Condition};

/// Stable identifier of a pending item within its queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PendingId(pub u64);

impl std::fmt::Display for PendingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which of a store's two queues an item sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueKind {
    Closures,
    Actions,
}

impl std::fmt::Display for QueueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            QueueKind::Closures => "closures",
            QueueKind::Actions => "actions",
        };
        write!(f, "{s}")
    }
}

/// A deferred (condition, payload, completion) triple.
pub(crate) struct PendingItem<S, P, R> {
    pub id: PendingId,
    pub condition: Condition<S>,
    pub payload: P,
    pub completion: Option<Completion<S, R>>,
}

/// Ordered collection of deferred items for one store.
pub(crate) struct PendingQueue<S, P, R> {
    items: VecDeque<PendingItem<S, P, R>>,
    next_id: u64,
}

impl<S, P, R> PendingQueue<S, P, R> {
    pub fn new() -> Self {
        Self {
            items: VecDeque::new(),
            next_id: 0,
        }
    }

    /// Append a deferred item. Ids only ever grow, so append order is id order.
    pub fn push(
        &mut self,
        condition: Condition<S>,
        payload: P,
        completion: Option<Completion<S, R>>,
    ) -> PendingId {
        let id = PendingId(self.next_id);
        self.next_id += 1;
        self.items.push_back(PendingItem {
            id,
            condition,
            payload,
            completion,
        });
        id
    }

    /// The id the next pushed item will receive. Items below this mark were
    /// queued before the call.
    pub fn high_water(&self) -> PendingId {
        PendingId(self.next_id)
    }

    /// First item with `from <= id < until`.
    pub fn next_in_range(
        &self,
        from: PendingId,
        until: PendingId,
    ) -> Option<&PendingItem<S, P, R>> {
        self.items
            .iter()
            .find(|item| item.id >= from)
            .filter(|item| item.id < until)
    }

    /// Remove the item with `id`, if still queued.
    pub fn take(&mut self, id: PendingId) -> Option<PendingItem<S, P, R>> {
        let index = self.items.iter().position(|item| item.id == id)?;
        self.items.remove(index)
    }

    pub fn ids(&self) -> Vec<PendingId> {
        self.items.iter().map(|item| item.id).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drop everything still queued, returning how many items were lost.
    pub fn clear(&mut self) -> usize {
        let dropped = self.items.len();
        self.items.clear();
        dropped
    }
}
