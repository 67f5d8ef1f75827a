//! # igloo-rs
//!
//! Serialized, conditional mutation of owned state.
//!
//! Each [`store::Store`] owns one piece of state behind a dedicated actor
//! task. Callers dispatch named actions or ad-hoc operations, optionally
//! gated by a condition over the state. A request whose condition is false
//! is deferred; after every successful mutation the store re-checks its
//! deferred work and replays, in arrival order, whatever became eligible.

pub mod config;
pub mod dispatcher;
mod engine;
pub mod error;
pub mod event;
pub mod handler;
pub mod model;
pub mod store;
pub mod telemetry;

pub use dispatcher::{Dispatcher, Registry};
pub use error::{Error, Result};
pub use handler::{Handler, HandlerTable, Operation};
pub use model::{Action, ExecutionMode};
pub use store::{DrainReport, PendingSnapshot, Request, Store, StoreId};
