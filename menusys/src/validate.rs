//! `menusys validate`: report every configuration problem at once.

use std::path::Path;

use anyhow::{Context, Result};

use crate::actions::ActionRegistry;
use crate::core::executors::ExecutorTable;
use crate::core::graph::MenuGraph;
use crate::core::invariants::validate_invariants;
use crate::dispatch::unregistered_actions;
use crate::error::ConfigError;
use crate::io::config::load_config;
use crate::io::menu_store::{load_executors, load_nodes};

/// Load the documents named by `config_path` and collect violations.
///
/// Unreadable or schema-invalid documents are errors. Semantic problems are
/// returned as a list; an empty list means `menusys run` would start.
pub fn validate_menu(config_path: &Path, actions: ActionRegistry) -> Result<Vec<ConfigError>> {
    let config = load_config(config_path)?;
    let paths = config.paths(config_path);
    let nodes = load_nodes(&paths.nodes).context("load menu nodes")?;
    let executors = load_executors(&paths.executors).context("load executors")?;

    let mut violations = validate_invariants(&nodes);
    let graph = if violations.is_empty() {
        MenuGraph::load(nodes).ok()
    } else {
        None
    };

    let table = match ExecutorTable::load(executors) {
        Ok(table) => table,
        Err(err) => {
            violations.push(err);
            return Ok(violations);
        }
    };
    if let Some(graph) = &graph
        && let Err(err) = table.check_references(graph)
    {
        violations.push(err);
    }
    violations.extend(unregistered_actions(&table, &actions));
    Ok(violations)
}
