//! Resolves executor ids to scripts or in-process actions and runs them.
//!
//! Runtime failures (script missing, non-zero exit, action error) are absorbed
//! into an [`ExecutionResult`] with status 1 routed to the output node. Only a
//! config/runtime mismatch escapes as a [`DispatchError`].

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::actions::ActionRegistry;
use crate::core::executors::ExecutorTable;
use crate::core::types::{ExecutionResult, ExecutorDescriptor, ExecutorKind};
use crate::error::{ConfigError, DispatchError};
use crate::io::process::run_captured;

pub const SCRIPT_FAILURE_OUTPUT: &str = "Error executing script";
pub const DEFAULT_OUTPUT_LIMIT_BYTES: usize = 100_000;

/// Arguments handed to an in-process action.
///
/// `saved_executor_id` and `dispatcher` are the two reserved entries used by
/// the confirmation protocol; `args` carries anything else.
#[derive(Default, Clone)]
pub struct DispatchContext<'a> {
    pub saved_executor_id: Option<String>,
    pub dispatcher: Option<&'a Dispatcher>,
    pub args: BTreeMap<String, Value>,
}

impl<'a> DispatchContext<'a> {
    pub fn new(saved_executor_id: Option<String>, dispatcher: &'a Dispatcher) -> Self {
        Self {
            saved_executor_id,
            dispatcher: Some(dispatcher),
            args: BTreeMap::new(),
        }
    }

    pub fn with_arg(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.args.insert(key.to_string(), value.into());
        self
    }
}

impl fmt::Debug for DispatchContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchContext")
            .field("saved_executor_id", &self.saved_executor_id)
            .field("dispatcher", &self.dispatcher.is_some())
            .field("args", &self.args)
            .finish()
    }
}

/// How scripts are run.
#[derive(Debug, Clone)]
pub struct ScriptSettings {
    pub scripts_dir: PathBuf,
    /// `None` waits for as long as the script runs.
    pub timeout: Option<Duration>,
    pub output_limit_bytes: usize,
}

impl ScriptSettings {
    pub fn new(scripts_dir: impl Into<PathBuf>) -> Self {
        Self {
            scripts_dir: scripts_dir.into(),
            timeout: None,
            output_limit_bytes: DEFAULT_OUTPUT_LIMIT_BYTES,
        }
    }
}

#[derive(Debug)]
pub struct Dispatcher {
    executors: ExecutorTable,
    actions: ActionRegistry,
    scripts: ScriptSettings,
}

impl Dispatcher {
    /// Build a dispatcher, checking that every `method` executor names a
    /// registered action.
    pub fn new(
        executors: ExecutorTable,
        actions: ActionRegistry,
        scripts: ScriptSettings,
    ) -> Result<Self, ConfigError> {
        if let Some(err) = unregistered_actions(&executors, &actions).into_iter().next() {
            return Err(err);
        }
        Ok(Self {
            executors,
            actions,
            scripts,
        })
    }

    pub fn executors(&self) -> &ExecutorTable {
        &self.executors
    }

    /// Run the executor `executor_id`.
    #[instrument(skip(self, ctx))]
    pub fn execute(
        &self,
        executor_id: &str,
        ctx: &DispatchContext<'_>,
    ) -> Result<ExecutionResult, DispatchError> {
        let descriptor = self
            .executors
            .get(executor_id)
            .ok_or_else(|| DispatchError::UnknownExecutor(executor_id.to_string()))?;

        let result = match descriptor.kind {
            ExecutorKind::Script => self.execute_script(descriptor),
            ExecutorKind::Method => self.execute_method(descriptor, ctx)?,
        };
        info!(
            status_code = result.status_code,
            destination = ?result.destination,
            "execution finished"
        );
        Ok(result)
    }

    fn execute_script(&self, descriptor: &ExecutorDescriptor) -> ExecutionResult {
        match self.run_script(&descriptor.name) {
            Ok(output) => ExecutionResult::new(output, 0, descriptor.destination()),
            Err(err) => {
                warn!(script = %descriptor.name, err = format!("{err:#}"), "script failed");
                ExecutionResult::failure(SCRIPT_FAILURE_OUTPUT)
            }
        }
    }

    fn run_script(&self, name: &str) -> Result<String> {
        let path = resolve_script(&self.scripts.scripts_dir, name)?;
        info!(script = %path.display(), "executing script");

        let mut cmd = Command::new(&path);
        cmd.current_dir(&self.scripts.scripts_dir);
        let output = run_captured(cmd, self.scripts.timeout, self.scripts.output_limit_bytes)
            .with_context(|| format!("run {}", path.display()))?;

        if !output.stderr.bytes.is_empty() {
            debug!(stderr = %output.stderr.lossy(), "script stderr");
        }
        if output.timed_out {
            anyhow::bail!("script timed out after {:?}", self.scripts.timeout);
        }
        if !output.status.success() {
            anyhow::bail!("script exited with status {:?}", output.status.code());
        }
        Ok(output.stdout.lossy())
    }

    fn execute_method(
        &self,
        descriptor: &ExecutorDescriptor,
        ctx: &DispatchContext<'_>,
    ) -> Result<ExecutionResult, DispatchError> {
        let name = descriptor.name.as_str();
        let action = self
            .actions
            .get(name)
            .ok_or_else(|| DispatchError::UnregisteredAction(name.to_string()))?;

        let result = match action.invoke(ctx) {
            Ok(Some(result)) => result,
            Ok(None) => {
                ExecutionResult::new(format!("Executed method {name}"), 0, descriptor.destination())
            }
            Err(err) => {
                warn!(action = name, err = format!("{err:#}"), "method failed");
                ExecutionResult::failure(format!("Error executing method {name}"))
            }
        };
        Ok(result)
    }
}

/// Every `method` executor whose action is not in `actions`, in executor id
/// order.
pub fn unregistered_actions(
    executors: &ExecutorTable,
    actions: &ActionRegistry,
) -> Vec<ConfigError> {
    executors
        .iter()
        .filter(|d| d.kind == ExecutorKind::Method && !actions.contains(&d.name))
        .map(|d| ConfigError::UnregisteredAction {
            executor: d.id.clone(),
            action: d.name.clone(),
        })
        .collect()
}

fn resolve_script(scripts_dir: &Path, name: &str) -> Result<PathBuf> {
    let candidate = scripts_dir.join(name);
    fs::canonicalize(&candidate).with_context(|| format!("resolve script {}", candidate.display()))
}
