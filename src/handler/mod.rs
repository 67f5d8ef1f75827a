//! Handler contracts.
//!
//! A [`Handler`] performs the mutation behind a named action. An
//! [`Operation`] is an ad-hoc mutation dispatched without a name. Both
//! produce an optional result that flows into the dispatch's completion.

pub mod table;

pub use table::HandlerTable;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{Action, ActionKind};

/// Performs the state mutation for an admitted action.
///
/// Handlers are not retried. Any error returned here fails the dispatch
/// that admitted the action.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    type State: Send + 'static;
    type Kind: ActionKind;
    type Output: Send + 'static;

    async fn handle(
        &self,
        state: &mut Self::State,
        action: Action<Self::Kind>,
    ) -> Result<Option<Self::Output>>;
}

/// A one-shot mutation dispatched directly against a store's state.
///
/// Any `FnOnce(&mut S) -> Result<Option<R>>` closure is an operation. Types
/// that need to await inside the mutation can implement the trait directly.
#[async_trait]
pub trait Operation<S, R>: Send {
    async fn run(self: Box<Self>, state: &mut S) -> Result<Option<R>>;
}

#[async_trait]
impl<S, R, F> Operation<S, R> for F
where
    F: FnOnce(&mut S) -> Result<Option<R>> + Send + 'static,
    S: Send + 'static,
    R: Send + 'static,
{
    async fn run(self: Box<Self>, state: &mut S) -> Result<Option<R>> {
        (*self)(state)
    }
}

/// Predicate over current state gating immediate vs. deferred execution.
pub type Condition<S> = Box<dyn Fn(&S) -> bool + Send + Sync>;

/// Continuation run after a payload executes. Receives the payload's result
/// and returns the (possibly transformed) final result.
pub type Completion<S, R> = Box<dyn FnOnce(&mut S, Option<R>) -> Result<Option<R>> + Send>;

/// Shorthand for the boxed operation carried by requests and pending queues.
pub type BoxOperation<S, R> = Box<dyn Operation<S, R>>;
