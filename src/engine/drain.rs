//! Drain passes: re-check deferred items and replay the eligible ones.
//!
//! A drain is one pass over the closures queue followed by one pass over
//! the actions queue. A pass walks its queue in id order and evaluates each
//! condition when the walk reaches it. An eligible item is taken out of its
//! queue, run, and then drains the store again before the pass moves on, so
//! work it enables (closures first) finishes before the next item starts.
//! Items consumed by such a nested drain are simply gone when the outer pass
//! reaches their id.

use futures::FutureExt;
use futures::future::BoxFuture;
use opentelemetry::KeyValue;
use std::time::Instant;
use tracing::{Instrument, debug, error};

use super::actor::StoreActor;
use crate::error::Result;
use crate::event::EventKind;
use crate::handler::{Completion, Handler};
use crate::store::DrainReport;
use crate::store::pending::{PendingId, PendingQueue, QueueKind};
use crate::store::request::Payload;
use crate::telemetry::dispatch::start_replay_span;
use crate::telemetry::metrics;

/// Next item in `[cursor, until)` whose condition holds against `state`.
/// Advances `cursor` past every item it inspects.
fn next_eligible<S, P, R>(
    state: &S,
    queue: &PendingQueue<S, P, R>,
    cursor: &mut PendingId,
    until: PendingId,
) -> Option<PendingId> {
    while let Some(item) = queue.next_in_range(*cursor, until) {
        *cursor = PendingId(item.id.0 + 1);
        if (item.condition)(state) {
            return Some(item.id);
        }
    }
    None
}

impl<H: Handler> StoreActor<H> {
    /// Run one closures pass and then one actions pass.
    ///
    /// Called after every successful execution, including replayed ones, so
    /// drains nest. The report counts every item replayed while this drain
    /// was running, nested drains included. Boxed because replay re-enters
    /// it.
    pub(crate) fn drain_pending(&mut self) -> BoxFuture<'_, Result<DrainReport>> {
        async move {
            if self.closures.is_empty() && self.actions.is_empty() {
                return Ok(DrainReport::default());
            }

            let before = self.replayed;
            let started = Instant::now();
            let result = self.drain_passes().await;

            let duration_ms = started.elapsed().as_millis() as u64;
            metrics::drain_duration_ms().record(
                duration_ms as f64,
                &[KeyValue::new("store", self.id.to_string())],
            );
            result?;

            let report = DrainReport {
                closures: self.replayed.closures - before.closures,
                actions: self.replayed.actions - before.actions,
            };
            debug!(
                store = %self.id,
                closures = report.closures,
                actions = report.actions,
                duration_ms,
                "drain completed"
            );
            self.emit(EventKind::DrainCompleted {
                closures: report.closures,
                actions: report.actions,
                duration_ms,
            });
            Ok(report)
        }
        .boxed()
    }

    async fn drain_passes(&mut self) -> Result<()> {
        self.drain_closures().await?;
        self.drain_actions().await
    }

    /// One pass over the closures queue.
    async fn drain_closures(&mut self) -> Result<()> {
        let until = self.closures.high_water();
        let mut cursor = PendingId(0);

        loop {
            let next = {
                let state = self.state.lock().await;
                next_eligible(&*state, &self.closures, &mut cursor, until)
            };
            let Some(id) = next else {
                return Ok(());
            };
            let Some(item) = self.closures.take(id) else {
                continue;
            };

            let label = "operation".to_string();
            self.record_replay(QueueKind::Closures, id, label.clone());
            let span = start_replay_span(self.id.as_str(), QueueKind::Closures, id);
            self.replay(
                QueueKind::Closures,
                id,
                label,
                Payload::Operation(item.payload),
                item.completion,
            )
            .instrument(span)
            .await?;
        }
    }

    /// One pass over the actions queue.
    async fn drain_actions(&mut self) -> Result<()> {
        let until = self.actions.high_water();
        let mut cursor = PendingId(0);

        loop {
            let next = {
                let state = self.state.lock().await;
                next_eligible(&*state, &self.actions, &mut cursor, until)
            };
            let Some(id) = next else {
                return Ok(());
            };
            let Some(item) = self.actions.take(id) else {
                continue;
            };

            let label = item.payload.label();
            self.record_replay(QueueKind::Actions, id, label.clone());
            let span = start_replay_span(self.id.as_str(), QueueKind::Actions, id);
            self.replay(
                QueueKind::Actions,
                id,
                label,
                Payload::Action(item.payload),
                item.completion,
            )
            .instrument(span)
            .await?;
        }
    }

    /// Execute a taken item, then drain again. A failure of the item itself
    /// is reported against it; a failure inside its nested drain was already
    /// reported by the item that caused it.
    async fn replay(
        &mut self,
        queue: QueueKind,
        pending_id: PendingId,
        label: String,
        payload: Payload<H>,
        completion: Option<Completion<H::State, H::Output>>,
    ) -> Result<()> {
        if let Err(e) = self.run_payload(payload, completion).await {
            error!(store = %self.id, %queue, %pending_id, payload = %label, error = %e, "replay failed");
            metrics::pending_failed().add(
                1,
                &[
                    KeyValue::new("store", self.id.to_string()),
                    KeyValue::new("queue", queue.to_string()),
                ],
            );
            self.emit(EventKind::ReplayFailed {
                queue,
                pending_id,
                payload: label,
                error: e.to_string(),
            });
            return Err(e);
        }
        self.drain_pending().await?;
        Ok(())
    }

    fn record_replay(&mut self, queue: QueueKind, pending_id: PendingId, payload: String) {
        match queue {
            QueueKind::Closures => self.replayed.closures += 1,
            QueueKind::Actions => self.replayed.actions += 1,
        }
        debug!(store = %self.id, %queue, %pending_id, payload = %payload, "replaying pending item");
        metrics::pending_replayed().add(
            1,
            &[
                KeyValue::new("store", self.id.to_string()),
                KeyValue::new("queue", queue.to_string()),
            ],
        );
        self.emit(EventKind::Replayed {
            queue,
            pending_id,
            payload,
        });
    }
}
