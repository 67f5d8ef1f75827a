//! Store handles.
//!
//! A [`Store`] is a cloneable handle to one piece of owned state. The two
//! pending queues are owned by a dedicated actor task and every dispatch
//! travels through that actor's mailbox, so admitted operations on one
//! store never run concurrently.

pub mod pending;
pub mod request;

pub use pending::{PendingId, QueueKind};
pub use request::Request;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{Mutex, Notify, broadcast, mpsc, oneshot};
use tracing::info;

use crate::config::StoreConfig;
use crate::engine::StoreActor;
use crate::error::{Error, Result};
use crate::event::StoreEvent;
use crate::handler::Handler;

/// Process-wide identity of a store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StoreId(pub String);

impl StoreId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StoreId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StoreId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for StoreId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Ids still waiting in each queue, in replay order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSnapshot {
    pub closures: Vec<PendingId>,
    pub actions: Vec<PendingId>,
}

impl PendingSnapshot {
    pub fn total(&self) -> usize {
        self.closures.len() + self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// How many items one drain executed from each queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrainReport {
    pub closures: usize,
    pub actions: usize,
}

impl DrainReport {
    pub fn total(&self) -> usize {
        self.closures + self.actions
    }
}

/// Messages accepted by a store actor.
pub(crate) enum Command<H: Handler> {
    Dispatch {
        request: Request<H>,
        reply: oneshot::Sender<Result<Option<H::Output>>>,
    },
    Drain {
        reply: oneshot::Sender<Result<DrainReport>>,
    },
    Pending {
        reply: oneshot::Sender<PendingSnapshot>,
    },
}

/// Handle to a running store.
pub struct Store<H: Handler> {
    id: StoreId,
    commands: mpsc::Sender<Command<H>>,
    state: Arc<Mutex<H::State>>,
    events: broadcast::Sender<StoreEvent>,
    shutdown: Arc<Notify>,
}

impl<H: Handler> Clone for Store<H> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            commands: self.commands.clone(),
            state: Arc::clone(&self.state),
            events: self.events.clone(),
            shutdown: Arc::clone(&self.shutdown),
        }
    }
}

impl<H: Handler> Store<H> {
    /// Start a store actor on `executor` owning `state`. Async-mode handlers
    /// also run on `executor`.
    pub fn spawn(
        id: impl Into<StoreId>,
        handler: H,
        state: H::State,
        config: &StoreConfig,
        executor: Handle,
    ) -> Result<Self> {
        config.validate()?;
        let id = id.into();
        let (commands, mailbox) = mpsc::channel(config.mailbox_capacity);
        let (events, _) = broadcast::channel(config.event_capacity);
        let state = Arc::new(Mutex::new(state));
        let shutdown = Arc::new(Notify::new());

        let actor = StoreActor::new(
            id.clone(),
            Arc::new(handler),
            Arc::clone(&state),
            events.clone(),
            executor.clone(),
        );
        executor.spawn(actor.run(mailbox, Arc::clone(&shutdown)));
        info!(store = %id, "store started");

        Ok(Self {
            id,
            commands,
            state,
            events,
            shutdown,
        })
    }

    /// Start a store on the current tokio runtime.
    pub fn spawn_local(
        id: impl Into<StoreId>,
        handler: H,
        state: H::State,
        config: &StoreConfig,
    ) -> Result<Self> {
        let executor = Handle::try_current().map_err(|_| Error::NoRuntime)?;
        Self::spawn(id, handler, state, config, executor)
    }

    pub fn id(&self) -> &StoreId {
        &self.id
    }

    /// Admit the request now, or defer it if its condition is false.
    ///
    /// A deferred request resolves immediately with `None`; it runs during a
    /// later drain, and its completion runs then.
    pub async fn dispatch(&self, request: Request<H>) -> Result<Option<H::Output>> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Dispatch { request, reply }).await?;
        response.await.map_err(|_| self.closed())?
    }

    /// Re-scan both pending queues and run whatever became eligible.
    pub async fn drain(&self) -> Result<DrainReport> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Drain { reply }).await?;
        response.await.map_err(|_| self.closed())?
    }

    /// Ids currently waiting in each queue.
    pub async fn pending(&self) -> Result<PendingSnapshot> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Pending { reply }).await?;
        response.await.map_err(|_| self.closed())
    }

    /// Run a read-only closure against current state on `executor`.
    ///
    /// Reads bypass the mailbox; they wait only for a mutation in progress.
    pub async fn read<R, F>(&self, executor: &Handle, read: F) -> Result<R>
    where
        F: FnOnce(&H::State) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let state = Arc::clone(&self.state);
        executor
            .spawn(async move {
                let guard = state.lock().await;
                read(&*guard)
            })
            .await?
    }

    /// Subscribe to this store's event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Stop the actor. Items still pending are dropped.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    async fn send(&self, command: Command<H>) -> Result<()> {
        self.commands.send(command).await.map_err(|_| self.closed())
    }

    fn closed(&self) -> Error {
        Error::StoreClosed(self.id.to_string())
    }
}
