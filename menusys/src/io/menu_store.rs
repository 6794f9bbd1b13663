//! Menu and executor document load/save helpers with schema validation.
//!
//! Documents are checked against the embedded JSON Schemas before they are
//! deserialized, so malformed records are rejected with a schema message
//! rather than a serde one. Semantic checks live in [`crate::core`].

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use jsonschema::validator_for;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::core::types::ExecutorDescriptor;
use crate::menu::MenuNode;

pub const NODES_SCHEMA: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../schemas/menu/nodes.schema.json"
));
pub const EXECUTORS_SCHEMA: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../schemas/menu/executors.schema.json"
));

const EXECUTION_TYPES: [&str; 2] = ["script", "method"];

pub fn load_nodes(path: &Path) -> Result<Vec<MenuNode>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read menu nodes {}", path.display()))?;
    parse_nodes(&raw).with_context(|| format!("load menu nodes {}", path.display()))
}

pub fn load_executors(path: &Path) -> Result<Vec<ExecutorDescriptor>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read executors {}", path.display()))?;
    parse_executors(&raw).with_context(|| format!("load executors {}", path.display()))
}

pub fn parse_nodes(raw: &str) -> Result<Vec<MenuNode>> {
    let value: Value = serde_json::from_str(raw).context("parse menu nodes json")?;
    validate_schema(NODES_SCHEMA, &value, "menu nodes")?;
    let nodes: Vec<MenuNode> =
        serde_json::from_value(value).context("deserialize menu nodes")?;
    debug!(count = nodes.len(), "parsed menu nodes");
    Ok(nodes)
}

pub fn parse_executors(raw: &str) -> Result<Vec<ExecutorDescriptor>> {
    let value: Value = serde_json::from_str(raw).context("parse executors json")?;
    check_execution_types(&value)?;
    validate_schema(EXECUTORS_SCHEMA, &value, "executors")?;
    let executors: Vec<ExecutorDescriptor> =
        serde_json::from_value(value).context("deserialize executors")?;
    debug!(count = executors.len(), "parsed executors");
    Ok(executors)
}

/// Write a document as pretty-printed JSON with trailing newline.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut payload = serde_json::to_string_pretty(value).context("serialize json")?;
    payload.push('\n');
    fs::write(path, payload).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

fn check_execution_types(value: &Value) -> Result<()> {
    let Some(records) = value.as_array() else {
        return Ok(());
    };
    for record in records {
        let Some(kind) = record.get("type").and_then(Value::as_str) else {
            continue;
        };
        if !EXECUTION_TYPES.contains(&kind) {
            let id = record.get("_id_").and_then(Value::as_str).unwrap_or("?");
            bail!("unsupported execution type '{kind}' on executor '{id}'");
        }
    }
    Ok(())
}

fn validate_schema(schema_raw: &str, instance: &Value, what: &str) -> Result<()> {
    let schema: Value = serde_json::from_str(schema_raw).context("parse embedded schema")?;
    let compiled = validator_for(&schema).map_err(|err| anyhow!("invalid schema: {}", err))?;
    if !compiled.is_valid(instance) {
        let messages = compiled
            .iter_errors(instance)
            .map(|err| err.to_string())
            .collect::<Vec<_>>();
        return Err(anyhow!(
            "{what} schema validation failed: {}",
            messages.join("; ")
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Destination, ExecutorKind, default_executors};
    use crate::menu::{NodeKind, ROOT, default_menu};

    #[test]
    fn nodes_write_load_round_trip() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("menunodes.json");
        write_json(&path, &default_menu()).expect("write");
        let nodes = load_nodes(&path).expect("load");
        assert_eq!(nodes, default_menu());
        assert_eq!(nodes[0].id, ROOT);
    }

    #[test]
    fn executors_write_load_round_trip() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("executors.json");
        write_json(&path, &default_executors()).expect("write");
        assert_eq!(load_executors(&path).expect("load"), default_executors());
    }

    #[test]
    fn parses_full_executor_record() {
        let raw = r#"[
            {"_id_": "E1", "type": "script", "name": "uptime.sh", "destinationOverride": "postExecuteOutput"}
        ]"#;
        let executors = parse_executors(raw).expect("parse");
        assert_eq!(executors[0].kind, ExecutorKind::Script);
        assert_eq!(executors[0].destination(), Destination::PostExecuteOutput);
    }

    #[test]
    fn unknown_node_type_fails_schema() {
        let raw = r#"[{"_id_": "ROOT", "type": "submenu"}]"#;
        let err = parse_nodes(raw).unwrap_err();
        assert!(err.to_string().contains("menu nodes schema validation failed"));
    }

    #[test]
    fn missing_id_fails_schema() {
        let raw = r#"[{"type": "output"}]"#;
        let err = parse_nodes(raw).unwrap_err();
        assert!(err.to_string().contains("schema validation failed"));
    }

    #[test]
    fn unsupported_execution_type_is_rejected() {
        let raw = r#"[{"_id_": "E1", "type": "python", "name": "x.py"}]"#;
        let err = parse_executors(raw).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unsupported execution type 'python' on executor 'E1'"
        );
    }

    #[test]
    fn confirm_defaults_to_false() {
        let raw = r#"[{"_id_": "run", "type": "execution", "executorNodeId": "E1"}]"#;
        let nodes = parse_nodes(raw).expect("parse");
        assert_eq!(nodes[0].kind, NodeKind::Execution);
        assert!(!nodes[0].requires_confirmation);
    }
}
