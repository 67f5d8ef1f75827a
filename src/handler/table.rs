//! Lookup-table handler: one synchronous route per action kind.

use async_trait::async_trait;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::error;

use super::Handler;
use crate::error::{Error, Result};
use crate::model::{Action, ActionKind};

type Route<S, K, R> = Arc<dyn Fn(&mut S, Action<K>) -> Result<Option<R>> + Send + Sync>;

/// Handler built from a table of per-kind functions.
///
/// Dispatching a kind with no route fails with [`Error::MissingHandler`].
pub struct HandlerTable<S, K, R> {
    routes: HashMap<K, Route<S, K, R>>,
    _state: PhantomData<fn(&mut S) -> R>,
}

impl<S, K, R> HandlerTable<S, K, R>
where
    S: Send + 'static,
    K: ActionKind,
    R: Send + 'static,
{
    /// Create an empty table with no routes.
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            _state: PhantomData,
        }
    }

    /// Route `kind` to `handler`. A later route for the same kind replaces
    /// the earlier one.
    pub fn on<F>(mut self, kind: K, handler: F) -> Self
    where
        F: Fn(&mut S, Action<K>) -> Result<Option<R>> + Send + Sync + 'static,
    {
        self.routes.insert(kind, Arc::new(handler));
        self
    }

    pub fn handles(&self, kind: K) -> bool {
        self.routes.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl<S, K, R> Default for HandlerTable<S, K, R>
where
    S: Send + 'static,
    K: ActionKind,
    R: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<S, K, R> Handler for HandlerTable<S, K, R>
where
    S: Send + 'static,
    K: ActionKind,
    R: Send + 'static,
{
    type State = S;
    type Kind = K;
    type Output = R;

    async fn handle(&self, state: &mut S, action: Action<K>) -> Result<Option<R>> {
        let Some(route) = self.routes.get(&action.kind()) else {
            error!(kind = ?action.kind(), "no handler route for action kind");
            return Err(Error::MissingHandler(action.label()));
        };
        route(state, action)
    }
}
