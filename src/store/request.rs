//! Dispatch requests: a payload plus optional condition and completion.

use crate::handler::{BoxOperation, Completion, Condition, Handler, Operation};
use crate::model::Action;

/// What a request runs once admitted.
pub(crate) enum Payload<H: Handler> {
    Action(Action<H::Kind>),
    Operation(BoxOperation<H::State, H::Output>),
}

impl<H: Handler> Payload<H> {
    pub fn label(&self) -> String {
        match self {
            Payload::Action(action) => action.label(),
            Payload::Operation(_) => "operation".to_string(),
        }
    }
}

/// Builder for a single dispatch.
///
/// ```ignore
/// let request = Request::action(Action::sync(Kind::Increment))
///     .when(|s: &Counter| !s.locked)
///     .then(|s, result| Ok(result));
/// store.dispatch(request).await?;
/// ```
pub struct Request<H: Handler> {
    pub(crate) payload: Payload<H>,
    pub(crate) condition: Option<Condition<H::State>>,
    pub(crate) completion: Option<Completion<H::State, H::Output>>,
}

impl<H: Handler> Request<H> {
    /// Dispatch a named action through the store's handler.
    pub fn action(action: Action<H::Kind>) -> Self {
        Self {
            payload: Payload::Action(action),
            condition: None,
            completion: None,
        }
    }

    /// Dispatch an ad-hoc mutation not modeled as a named action.
    pub fn operation<O>(operation: O) -> Self
    where
        O: Operation<H::State, H::Output> + 'static,
    {
        Self {
            payload: Payload::Operation(Box::new(operation)),
            condition: None,
            completion: None,
        }
    }

    /// Run only when `condition` holds; otherwise defer until a later
    /// mutation makes it true.
    pub fn when<F>(mut self, condition: F) -> Self
    where
        F: Fn(&H::State) -> bool + Send + Sync + 'static,
    {
        self.condition = Some(Box::new(condition));
        self
    }

    /// Continuation receiving the payload's result; its return value becomes
    /// the dispatch result.
    pub fn then<F>(mut self, completion: F) -> Self
    where
        F: FnOnce(&mut H::State, Option<H::Output>) -> crate::error::Result<Option<H::Output>>
            + Send
            + 'static,
    {
        self.completion = Some(Box::new(completion));
        self
    }

    pub fn is_conditional(&self) -> bool {
        self.condition.is_some()
    }
}
