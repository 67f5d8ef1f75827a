//! Error types for igloo-rs.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Raised by a handler or operation when the action is invalid for the
    /// current state. Surfaced unchanged to the dispatch caller.
    #[error("domain error: {0}")]
    Domain(String),

    #[error("permission denied on domain {domain}: {reason}")]
    Permission { domain: String, reason: String },

    /// No handler route exists for an action kind. Programming error.
    #[error("missing handler for action kind {0}")]
    MissingHandler(String),

    #[error("store {0} is closed")]
    StoreClosed(String),

    #[error("no tokio runtime available to run the store")]
    NoRuntime,

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for handlers rejecting an action.
    pub fn domain(message: impl Into<String>) -> Self {
        Self::Domain(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
