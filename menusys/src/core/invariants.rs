//! Semantic invariants not expressible via JSON Schema.

use std::collections::HashSet;

use crate::error::ConfigError;
use crate::menu::{CONFIRMATION, MenuNode, NodeKind, OUTPUT, ROOT};

/// Check menu invariants, in order:
/// - No duplicate ids (also guarantees at most one ROOT)
/// - Selection options point at existing nodes
/// - Execution nodes carry an executor id
/// - Reserved nodes exist with the right kind
/// - ROOT has selection options
///
/// Returns every violation; an empty list means the menu is loadable.
pub fn validate_invariants(nodes: &[MenuNode]) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    let mut seen = HashSet::new();
    for node in nodes {
        if !seen.insert(node.id.as_str()) {
            errors.push(ConfigError::DuplicateId(node.id.clone()));
        }
    }

    for node in nodes {
        for option in node.options() {
            if !seen.contains(option.target_node_id.as_str()) {
                errors.push(ConfigError::DanglingTarget {
                    node: node.id.clone(),
                    target: option.target_node_id.clone(),
                });
            }
        }
    }

    for node in nodes.iter().filter(|n| n.kind == NodeKind::Execution) {
        let missing = node
            .executor_id
            .as_deref()
            .is_none_or(|id| id.trim().is_empty());
        if missing {
            errors.push(ConfigError::MissingExecutorId(node.id.clone()));
        }
    }

    check_reserved(nodes, ROOT, NodeKind::Selection, &mut errors);
    check_reserved(nodes, CONFIRMATION, NodeKind::Selection, &mut errors);
    check_reserved(nodes, OUTPUT, NodeKind::Output, &mut errors);

    if let Some(root) = nodes.iter().find(|n| n.is_root())
        && root.options().is_empty()
    {
        errors.push(ConfigError::RootWithoutOptions(root.id.clone()));
    }

    errors
}

fn check_reserved(nodes: &[MenuNode], id: &str, expected: NodeKind, errors: &mut Vec<ConfigError>) {
    match nodes.iter().find(|n| n.id == id) {
        None => errors.push(ConfigError::MissingReservedNode(id.to_string())),
        Some(node) if node.kind != expected => errors.push(ConfigError::ReservedNodeKind {
            node: id.to_string(),
            expected: format!("{expected:?}").to_lowercase(),
        }),
        Some(_) => {}
    }
}
