//! Store actor: owns the pending queues, admits or defers each request.

use opentelemetry::KeyValue;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{Mutex, Notify, broadcast, mpsc};
use tracing::{Instrument, debug, error, info, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::event::{EventKind, StoreEvent};
use crate::handler::{BoxOperation, Completion, Handler};
use crate::model::{Action, ExecutionMode};
use crate::store::pending::{PendingQueue, QueueKind};
use crate::store::request::Payload;
use crate::store::{Command, DrainReport, PendingSnapshot, Request, StoreId};
use crate::telemetry::dispatch::{record_outcome, start_dispatch_span};
use crate::telemetry::metrics;

type Output<H> = <H as Handler>::Output;
type State<H> = <H as Handler>::State;

/// The single line of control that mutates one store.
///
/// Requests arrive one at a time through the mailbox. Within a request,
/// replayed pending items run strictly one after another.
pub(crate) struct StoreActor<H: Handler> {
    pub(super) id: StoreId,
    pub(super) handler: Arc<H>,
    pub(super) state: Arc<Mutex<State<H>>>,
    pub(super) closures: PendingQueue<State<H>, BoxOperation<State<H>, Output<H>>, Output<H>>,
    pub(super) actions: PendingQueue<State<H>, Action<H::Kind>, Output<H>>,
    pub(super) executor: Handle,
    /// Running totals of replayed items, per queue.
    pub(super) replayed: DrainReport,
    events: broadcast::Sender<StoreEvent>,
    event_seq: u64,
}

impl<H: Handler> StoreActor<H> {
    pub fn new(
        id: StoreId,
        handler: Arc<H>,
        state: Arc<Mutex<State<H>>>,
        events: broadcast::Sender<StoreEvent>,
        executor: Handle,
    ) -> Self {
        Self {
            id,
            handler,
            state,
            closures: PendingQueue::new(),
            actions: PendingQueue::new(),
            executor,
            replayed: DrainReport::default(),
            events,
            event_seq: 0,
        }
    }

    /// Process commands until shutdown or until every handle is dropped.
    pub async fn run(mut self, mut mailbox: mpsc::Receiver<Command<H>>, shutdown: Arc<Notify>) {
        loop {
            let command = tokio::select! {
                _ = shutdown.notified() => {
                    info!(store = %self.id, "store shutting down");
                    break;
                }
                command = mailbox.recv() => match command {
                    Some(command) => command,
                    None => {
                        debug!(store = %self.id, "all store handles dropped");
                        break;
                    }
                },
            };
            self.handle_command(command).await;
        }

        mailbox.close();
        let dropped = self.closures.clear() + self.actions.clear();
        if dropped > 0 {
            warn!(store = %self.id, dropped, "store stopped with pending items");
        }
        self.emit(EventKind::Stopped { dropped });
    }

    async fn handle_command(&mut self, command: Command<H>) {
        match command {
            Command::Dispatch { request, reply } => {
                let dispatch_id = Uuid::new_v4();
                let span =
                    start_dispatch_span(self.id.as_str(), &dispatch_id, &request.payload.label());
                let result = self.dispatch(request).instrument(span).await;
                // Caller may have stopped waiting; the work is done either way.
                let _ = reply.send(result);
            }
            Command::Drain { reply } => {
                let result = self.drain_pending().await;
                let _ = reply.send(result);
            }
            Command::Pending { reply } => {
                let _ = reply.send(PendingSnapshot {
                    closures: self.closures.ids(),
                    actions: self.actions.ids(),
                });
            }
        }
    }

    /// Admit now or defer. A false condition queues the request untouched
    /// and resolves with `None`.
    async fn dispatch(&mut self, request: Request<H>) -> Result<Option<Output<H>>> {
        let Request {
            payload,
            condition,
            completion,
        } = request;
        let label = payload.label();
        let span = tracing::Span::current();

        if let Some(condition) = condition {
            let admitted = {
                let state = self.state.lock().await;
                condition(&*state)
            };
            if !admitted {
                let (queue, pending_id) = match payload {
                    Payload::Action(action) => (
                        QueueKind::Actions,
                        self.actions.push(condition, action, completion),
                    ),
                    Payload::Operation(operation) => (
                        QueueKind::Closures,
                        self.closures.push(condition, operation, completion),
                    ),
                };
                record_outcome(&span, "deferred");
                debug!(store = %self.id, %queue, %pending_id, payload = %label, "condition false, deferred");
                metrics::dispatch_deferred().add(
                    1,
                    &[
                        KeyValue::new("store", self.id.to_string()),
                        KeyValue::new("queue", queue.to_string()),
                    ],
                );
                self.emit(EventKind::Deferred {
                    queue,
                    pending_id,
                    payload: label,
                });
                return Ok(None);
            }
        }

        record_outcome(&span, "admitted");
        metrics::dispatch_admitted().add(
            1,
            &[
                KeyValue::new("store", self.id.to_string()),
                KeyValue::new("payload", label.clone()),
            ],
        );
        self.emit(EventKind::Admitted {
            payload: label.clone(),
        });

        let result = self.execute(payload, completion).await;
        if let Err(ref e) = result {
            record_outcome(&span, "failed");
            error!(store = %self.id, payload = %label, error = %e, "dispatch failed");
            metrics::dispatch_failed().add(1, &[KeyValue::new("store", self.id.to_string())]);
            self.emit(EventKind::Failed {
                payload: label,
                error: e.to_string(),
            });
        }
        result
    }

    /// Unconditional execution: run the payload and its completion, then
    /// drain both pending queues. Any failure skips the remaining steps.
    async fn execute(
        &mut self,
        payload: Payload<H>,
        completion: Option<Completion<State<H>, Output<H>>>,
    ) -> Result<Option<Output<H>>> {
        let result = self.run_payload(payload, completion).await?;
        self.drain_pending().await?;
        Ok(result)
    }

    /// Payload, then completion. The completion's return value is the result.
    pub(super) async fn run_payload(
        &mut self,
        payload: Payload<H>,
        completion: Option<Completion<State<H>, Output<H>>>,
    ) -> Result<Option<Output<H>>> {
        let result = match payload {
            Payload::Action(action) => self.run_handler(action).await?,
            Payload::Operation(operation) => {
                let mut state = self.state.lock().await;
                operation.run(&mut *state).await?
            }
        };

        match completion {
            Some(completion) => {
                let mut state = self.state.lock().await;
                completion(&mut *state, result)
            }
            None => Ok(result),
        }
    }

    async fn run_handler(&mut self, action: Action<H::Kind>) -> Result<Option<Output<H>>> {
        match action.mode() {
            ExecutionMode::Sync => {
                let mut state = self.state.lock().await;
                self.handler.handle(&mut *state, action).await
            }
            ExecutionMode::Async => {
                let handler = Arc::clone(&self.handler);
                let state = Arc::clone(&self.state);
                self.executor
                    .spawn(async move {
                        let mut state = state.lock_owned().await;
                        handler.handle(&mut *state, action).await
                    })
                    .await?
            }
        }
    }

    pub(super) fn emit(&mut self, kind: EventKind) {
        self.event_seq += 1;
        // No subscribers is not an error.
        let _ = self.events.send(StoreEvent::new(self.event_seq, self.id.clone(), kind));
    }
}
