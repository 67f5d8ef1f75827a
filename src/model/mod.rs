//! Core data model.
//!
//! An action names an operation kind and says how its handler runs.
//! Permissions scope what a handler may touch.

pub mod action;
pub mod permissions;

pub use action::{Action, ActionKind, ExecutionMode};
pub use permissions::{DomainName, DomainPermissions};
