//! Typed errors for the menu engine.
//!
//! Configuration problems are fatal and surface before the event loop starts.
//! Dispatch errors signal a config/runtime mismatch and propagate out of
//! [`Dispatcher::execute`](crate::dispatch::Dispatcher::execute). Ordinary
//! execution failures are never errors: they become an
//! [`ExecutionResult`](crate::core::types::ExecutionResult) with status 1.

use thiserror::Error;

/// Inconsistent menu or executor configuration, detected at load time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("duplicate id '{0}'")]
    DuplicateId(String),

    #[error("selection option on '{node}' must have valid menu node id {target}")]
    DanglingTarget { node: String, target: String },

    #[error("execution node '{0}' must have an executor node id")]
    MissingExecutorId(String),

    #[error("root menu node '{0}' must have selection options")]
    RootWithoutOptions(String),

    #[error("missing reserved menu node '{0}'")]
    MissingReservedNode(String),

    #[error("reserved menu node '{node}' must be of type {expected}")]
    ReservedNodeKind { node: String, expected: String },

    #[error("execution node '{node}' references unknown executor '{executor}'")]
    UnknownExecutor { node: String, executor: String },

    #[error("executor '{executor}' references unregistered action '{action}'")]
    UnregisteredAction { executor: String, action: String },
}

/// Lookup of a menu node id that is not part of the graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("menu node not found: {0}")]
pub struct NotFoundError(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    /// `select_current` was called on a node without selectable options.
    #[error("nothing to select on menu node '{0}'")]
    NothingSelected(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("unknown executor: {0}")]
    UnknownExecutor(String),

    #[error("method name not registered: {0}")]
    UnregisteredAction(String),

    #[error("missing required argument: {0}")]
    MissingArgument(String),
}
