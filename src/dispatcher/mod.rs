//! Dispatcher: the entry point client code calls.
//!
//! Creates and registers stores, then forwards dispatches, drains and reads
//! to them. The admission and replay rules themselves run inside each
//! store's actor.

pub mod registry;

pub use registry::Registry;

use tokio::runtime::Handle;

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::handler::{Handler, Operation};
use crate::model::Action;
use crate::store::{DrainReport, PendingSnapshot, Request, Store, StoreId};

pub struct Dispatcher {
    registry: &'static Registry,
    executor: Handle,
    store_config: StoreConfig,
}

impl Dispatcher {
    /// Dispatcher on the current tokio runtime with the global registry.
    pub fn new(store_config: StoreConfig) -> Result<Self> {
        let executor = Handle::try_current().map_err(|_| Error::NoRuntime)?;
        Ok(Self::with_executor(executor, store_config))
    }

    /// Dispatcher whose stores and background handlers run on `executor`.
    pub fn with_executor(executor: Handle, store_config: StoreConfig) -> Self {
        Self {
            registry: Registry::global(),
            executor,
            store_config,
        }
    }

    pub fn registry(&self) -> &'static Registry {
        self.registry
    }

    pub fn executor(&self) -> &Handle {
        &self.executor
    }

    /// Start a store and register it.
    ///
    /// If `id` is already registered with the same handler type the existing
    /// store is returned and `handler`/`state` are dropped.
    pub fn spawn_store<H: Handler>(
        &self,
        id: impl Into<StoreId>,
        handler: H,
        state: H::State,
    ) -> Result<Store<H>> {
        let id = id.into();
        if self.registry.contains(&id) {
            return self.registered(&id);
        }
        let store = Store::spawn(
            id.clone(),
            handler,
            state,
            &self.store_config,
            self.executor.clone(),
        )?;
        if !self.register(&store) {
            // Lost a race with another spawn under the same id.
            store.shutdown();
            return self.registered(&id);
        }
        Ok(store)
    }

    fn registered<H: Handler>(&self, id: &StoreId) -> Result<Store<H>> {
        self.registry.get::<H>(id).ok_or_else(|| {
            Error::Other(format!("store {id} is registered with another handler type"))
        })
    }

    /// Add `store` to the process-wide registry. Idempotent.
    pub fn register<H: Handler>(&self, store: &Store<H>) -> bool {
        self.registry.register(store)
    }

    pub fn lookup<H: Handler>(&self, id: &StoreId) -> Option<Store<H>> {
        self.registry.get(id)
    }

    /// Dispatch a request: admitted now if it has no condition or its
    /// condition holds, otherwise deferred and resolved with `None`.
    pub async fn dispatch<H: Handler>(
        &self,
        store: &Store<H>,
        request: Request<H>,
    ) -> Result<Option<H::Output>> {
        store.dispatch(request).await
    }

    /// Dispatch a named action with no condition and no completion.
    pub async fn dispatch_action<H: Handler>(
        &self,
        store: &Store<H>,
        action: Action<H::Kind>,
    ) -> Result<Option<H::Output>> {
        store.dispatch(Request::action(action)).await
    }

    /// Dispatch an ad-hoc operation with no condition and no completion.
    pub async fn dispatch_operation<H, O>(
        &self,
        store: &Store<H>,
        operation: O,
    ) -> Result<Option<H::Output>>
    where
        H: Handler,
        O: Operation<H::State, H::Output> + 'static,
    {
        store.dispatch(Request::operation(operation)).await
    }

    /// Run whatever pending work has become eligible, without dispatching
    /// anything new.
    pub async fn pending_tasks<H: Handler>(&self, store: &Store<H>) -> Result<DrainReport> {
        store.drain().await
    }

    pub async fn pending<H: Handler>(&self, store: &Store<H>) -> Result<PendingSnapshot> {
        store.pending().await
    }

    /// Read from a store on the dispatcher's executor.
    pub async fn read<H, R, F>(&self, store: &Store<H>, read: F) -> Result<R>
    where
        H: Handler,
        F: FnOnce(&H::State) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        store.read(&self.executor, read).await
    }
}
