//! In-process actions usable as `method` executors.
//!
//! An action is registered under a stable name before the dispatcher is built;
//! the dispatcher validates every `method` executor against the registry at
//! startup. Two built-ins implement the confirmation protocol.

use std::collections::HashMap;
use std::fmt;

use anyhow::Result;

use crate::core::types::ExecutionResult;
use crate::dispatch::DispatchContext;
use crate::error::DispatchError;

pub const CONFIRM_YES: &str = "confirmYes";
pub const CONFIRM_NO: &str = "confirmNo";

/// Context key names reported by [`DispatchError::MissingArgument`].
pub const SAVED_EXECUTOR_ID: &str = "savedExecutorId";
pub const DISPATCHER_HANDLE: &str = "dispatcherHandle";

/// A named in-process action.
///
/// `Ok(None)` means "done, nothing to report"; the dispatcher then synthesizes
/// a success result. Any `Err` is reported to the user as a failed execution.
pub trait Action: Send + Sync {
    fn invoke(&self, ctx: &DispatchContext<'_>) -> Result<Option<ExecutionResult>>;
}

impl<F> Action for F
where
    F: Fn(&DispatchContext<'_>) -> Result<Option<ExecutionResult>> + Send + Sync,
{
    fn invoke(&self, ctx: &DispatchContext<'_>) -> Result<Option<ExecutionResult>> {
        self(ctx)
    }
}

/// No-op acknowledgement for the "no" branch of a confirmation.
pub struct ConfirmNo;

impl Action for ConfirmNo {
    fn invoke(&self, _ctx: &DispatchContext<'_>) -> Result<Option<ExecutionResult>> {
        Ok(None)
    }
}

/// Runs the executor saved before the confirmation detour.
pub struct ConfirmYes;

impl Action for ConfirmYes {
    fn invoke(&self, ctx: &DispatchContext<'_>) -> Result<Option<ExecutionResult>> {
        let saved = ctx
            .saved_executor_id
            .as_deref()
            .ok_or_else(|| DispatchError::MissingArgument(SAVED_EXECUTOR_ID.to_string()))?;
        let dispatcher = ctx
            .dispatcher
            .ok_or_else(|| DispatchError::MissingArgument(DISPATCHER_HANDLE.to_string()))?;
        tracing::info!(executor = saved, "confirmed execution");
        // The saved id is consumed here; a nested confirmYes sees none.
        let nested = DispatchContext {
            saved_executor_id: None,
            ..ctx.clone()
        };
        Ok(Some(dispatcher.execute(saved, &nested)?))
    }
}

#[derive(Default)]
pub struct ActionRegistry {
    actions: HashMap<String, Box<dyn Action>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-loaded with `confirmYes` and `confirmNo`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(CONFIRM_YES, ConfirmYes);
        registry.register(CONFIRM_NO, ConfirmNo);
        registry
    }

    /// Register `action` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: &str, action: impl Action + 'static) {
        tracing::debug!(action = name, "registered action");
        self.actions.insert(name.to_string(), Box::new(action));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Action> {
        self.actions.get(name).map(Box::as_ref)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }
}

impl fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.actions.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ActionRegistry")
            .field("actions", &names)
            .finish()
    }
}
