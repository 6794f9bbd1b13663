//! Application assembly: config, documents, graph, dispatcher and engine.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::actions::ActionRegistry;
use crate::core::executors::ExecutorTable;
use crate::core::graph::MenuGraph;
use crate::core::types::ExecutorDescriptor;
use crate::dispatch::{Dispatcher, ScriptSettings};
use crate::engine::{Engine, EventSender};
use crate::error::ConfigError;
use crate::io::config::{DisplayKind, MenuConfig, MenuPaths, load_config};
use crate::io::display::{BoundedDisplay, Display, PlainDisplay, RetryingDisplay};
use crate::io::menu_store::{load_executors, load_nodes};
use crate::menu::MenuNode;

/// Validate the documents and build the graph and dispatcher.
///
/// Checks run in order: menu invariants, executor table, executor
/// references from execution nodes, then method names against `actions`.
pub fn assemble(
    nodes: Vec<MenuNode>,
    executors: Vec<ExecutorDescriptor>,
    actions: ActionRegistry,
    scripts: ScriptSettings,
) -> Result<(MenuGraph, Dispatcher), ConfigError> {
    let graph = MenuGraph::load(nodes)?;
    let table = ExecutorTable::load(executors)?;
    table.check_references(&graph)?;
    let dispatcher = Dispatcher::new(table, actions, scripts)?;
    Ok((graph, dispatcher))
}

/// A fully validated menu, ready to run.
#[derive(Debug)]
pub struct MenuApp {
    config: MenuConfig,
    paths: MenuPaths,
    graph: MenuGraph,
    dispatcher: Dispatcher,
}

impl MenuApp {
    /// Load `config_path` and the documents it names. `actions` should
    /// already hold any application-specific method actions.
    pub fn load(config_path: &Path, actions: ActionRegistry) -> Result<Self> {
        let config = load_config(config_path)?;
        let paths = config.paths(config_path);
        let nodes = load_nodes(&paths.nodes)?;
        let executors = load_executors(&paths.executors)?;
        let scripts = config.script_settings(paths.scripts_dir.clone());
        let (graph, dispatcher) = assemble(nodes, executors, actions, scripts)
            .with_context(|| format!("invalid menu configuration {}", config_path.display()))?;
        info!(
            nodes = graph.len(),
            executors = dispatcher.executors().len(),
            scripts_dir = %paths.scripts_dir.display(),
            "menu loaded"
        );
        Ok(Self {
            config,
            paths,
            graph,
            dispatcher,
        })
    }

    pub fn config(&self) -> &MenuConfig {
        &self.config
    }

    pub fn paths(&self) -> &MenuPaths {
        &self.paths
    }

    pub fn graph(&self) -> &MenuGraph {
        &self.graph
    }

    /// Stdout display of the requested kind, wrapped in the configured
    /// retry policy.
    pub fn stdout_display(&self, kind: DisplayKind) -> Result<Box<dyn Display>> {
        let policy = self.config.display.retry.policy();
        let display: Box<dyn Display> = match kind {
            DisplayKind::Plain => Box::new(RetryingDisplay::new(PlainDisplay::new(io::stdout()), policy)),
            DisplayKind::Bounded => {
                let bounded = BoundedDisplay::new(
                    io::stdout(),
                    self.config.display.rows,
                    self.config.display.columns,
                )
                .context("create bounded display")?;
                Box::new(RetryingDisplay::new(bounded, policy))
            }
        };
        Ok(display)
    }

    pub fn into_engine<D: Display>(self, display: D) -> (Engine<D>, EventSender) {
        Engine::new(self.graph, self.dispatcher, display)
    }
}

/// Default config location: `menusys.toml` in the working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from(crate::io::config::DEFAULT_CONFIG_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::default_executors;
    use crate::io::init::{InitOptions, init_menu};
    use crate::menu::default_menu;
    use crate::test_support::{execution, menu_with, method};

    #[test]
    fn assemble_default_documents() {
        let (graph, dispatcher) = assemble(
            default_menu(),
            default_executors(),
            ActionRegistry::with_builtins(),
            ScriptSettings::new("."),
        )
        .expect("assemble");
        assert_eq!(graph.len(), default_menu().len());
        assert_eq!(dispatcher.executors().len(), 2);
    }

    #[test]
    fn assemble_rejects_unknown_executor_reference() {
        let err = assemble(
            menu_with(&["job"], vec![execution("job", "E9")]),
            default_executors(),
            ActionRegistry::with_builtins(),
            ScriptSettings::new("."),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownExecutor { .. }));
    }

    #[test]
    fn assemble_rejects_unregistered_method() {
        let mut executors = default_executors();
        executors.push(method("E1", "reboot", None));
        let err = assemble(
            menu_with(&["job"], vec![execution("job", "E1")]),
            executors,
            ActionRegistry::with_builtins(),
            ScriptSettings::new("."),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "executor 'E1' references unregistered action 'reboot'");
    }

    #[test]
    fn load_from_initialized_directory() {
        let temp = tempfile::tempdir().expect("tempdir");
        let (config_path, paths) =
            init_menu(temp.path(), &InitOptions { force: false }).expect("init");
        let app = MenuApp::load(&config_path, ActionRegistry::with_builtins()).expect("load");
        assert_eq!(app.paths(), &paths);
        assert!(app.graph().root().is_root());
        app.stdout_display(DisplayKind::Bounded).expect("display");
    }
}
