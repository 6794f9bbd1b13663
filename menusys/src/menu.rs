use serde::{Deserialize, Serialize};

/// Id of the single root menu node.
pub const ROOT: &str = "ROOT";
/// Id of the yes/no menu shown before executing a node that requires confirmation.
pub const CONFIRMATION: &str = "CONFIRMATION";
/// Id of the node used to show the output of the last execution.
pub const OUTPUT: &str = "OUTPUT";
/// Conventional ids of the confirmation menu's execution nodes.
pub const YES: &str = "YES";
pub const NO: &str = "NO";

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Selection,
    Execution,
    Output,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SelectionOption {
    #[serde(rename = "menuNodeId")]
    pub target_node_id: String,
    #[serde(rename = "displayName")]
    pub display_label: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MenuNode {
    #[serde(rename = "_id_")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(
        rename = "selectionOptions",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub selection_options: Option<Vec<SelectionOption>>,
    #[serde(
        rename = "executorNodeId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub executor_id: Option<String>,
    #[serde(rename = "confirm", default)]
    pub requires_confirmation: bool,
}

impl MenuNode {
    pub fn is_root(&self) -> bool {
        self.id == ROOT
    }

    /// Selection options, empty when the node has none.
    pub fn options(&self) -> &[SelectionOption] {
        self.selection_options.as_deref().unwrap_or(&[])
    }
}

/// The smallest menu the engine accepts: ROOT with one option, plus the
/// reserved confirmation and output nodes.
pub fn default_menu() -> Vec<MenuNode> {
    vec![
        MenuNode {
            id: ROOT.to_string(),
            kind: NodeKind::Selection,
            selection_options: Some(vec![SelectionOption {
                target_node_id: OUTPUT.to_string(),
                display_label: "Last output".to_string(),
            }]),
            executor_id: None,
            requires_confirmation: false,
        },
        MenuNode {
            id: CONFIRMATION.to_string(),
            kind: NodeKind::Selection,
            selection_options: Some(vec![
                SelectionOption {
                    target_node_id: NO.to_string(),
                    display_label: "No".to_string(),
                },
                SelectionOption {
                    target_node_id: YES.to_string(),
                    display_label: "Yes".to_string(),
                },
            ]),
            executor_id: None,
            requires_confirmation: false,
        },
        MenuNode {
            id: YES.to_string(),
            kind: NodeKind::Execution,
            selection_options: None,
            executor_id: Some(YES.to_string()),
            requires_confirmation: false,
        },
        MenuNode {
            id: NO.to_string(),
            kind: NodeKind::Execution,
            selection_options: None,
            executor_id: Some(NO.to_string()),
            requires_confirmation: false,
        },
        MenuNode {
            id: OUTPUT.to_string(),
            kind: NodeKind::Output,
            selection_options: None,
            executor_id: None,
            requires_confirmation: false,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wire_format() {
        let raw = r#"{
            "_id_": "ROOT",
            "type": "selection",
            "selectionOptions": [{"menuNodeId": "A", "displayName": "Item A"}]
        }"#;
        let node: MenuNode = serde_json::from_str(raw).expect("parse");
        assert!(node.is_root());
        assert_eq!(node.kind, NodeKind::Selection);
        assert_eq!(node.options()[0].target_node_id, "A");
        assert!(!node.requires_confirmation);
        assert_eq!(node.executor_id, None);
    }

    #[test]
    fn options_empty_when_absent() {
        let node = MenuNode {
            id: "X".to_string(),
            kind: NodeKind::Output,
            selection_options: None,
            executor_id: None,
            requires_confirmation: false,
        };
        assert!(node.options().is_empty());
        assert!(!node.is_root());
    }
}
