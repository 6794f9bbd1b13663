//! Immutable, validated menu graph.

use std::collections::HashMap;

use crate::core::invariants::validate_invariants;
use crate::error::{ConfigError, NotFoundError};
use crate::menu::{CONFIRMATION, MenuNode, OUTPUT, ROOT};

/// Menu nodes indexed by id. Only constructible through [`MenuGraph::load`],
/// so every instance satisfies the menu invariants.
#[derive(Debug, Clone)]
pub struct MenuGraph {
    nodes: Vec<MenuNode>,
    index: HashMap<String, usize>,
}

impl MenuGraph {
    /// Validate `nodes` and build the graph. Fails on the first invariant
    /// violation; a broken menu never yields a partial graph.
    pub fn load(nodes: Vec<MenuNode>) -> Result<Self, ConfigError> {
        if let Some(first) = validate_invariants(&nodes).into_iter().next() {
            return Err(first);
        }
        let index = nodes
            .iter()
            .enumerate()
            .map(|(position, node)| (node.id.clone(), position))
            .collect();
        Ok(Self { nodes, index })
    }

    pub fn get(&self, id: &str) -> Result<&MenuNode, NotFoundError> {
        self.index
            .get(id)
            .map(|&position| &self.nodes[position])
            .ok_or_else(|| NotFoundError(id.to_string()))
    }

    pub fn root(&self) -> &MenuNode {
        self.reserved(ROOT)
    }

    pub fn confirmation(&self) -> &MenuNode {
        self.reserved(CONFIRMATION)
    }

    pub fn output(&self) -> &MenuNode {
        self.reserved(OUTPUT)
    }

    /// Nodes in load order.
    pub fn nodes(&self) -> impl Iterator<Item = &MenuNode> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn reserved(&self, id: &str) -> &MenuNode {
        // Presence of reserved ids is checked in `load`.
        &self.nodes[self.index[id]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::{NodeKind, default_menu};
    use crate::test_support::{execution, menu_with, selection};

    #[test]
    fn load_well_formed_menu() {
        let graph = MenuGraph::load(default_menu()).expect("load");
        assert!(graph.root().is_root());
        assert_eq!(graph.root().id, ROOT);
        assert_eq!(graph.confirmation().kind, NodeKind::Selection);
        assert_eq!(graph.output().kind, NodeKind::Output);
        assert_eq!(graph.len(), 5);
    }

    #[test]
    fn duplicate_root_fails() {
        let mut nodes = default_menu();
        nodes.push(selection(ROOT, &[OUTPUT]));
        let err = MenuGraph::load(nodes).unwrap_err();
        assert_eq!(err, ConfigError::DuplicateId(ROOT.to_string()));
    }

    #[test]
    fn dangling_target_names_missing_id() {
        let nodes = menu_with(&["ghost"], vec![]);
        let err = MenuGraph::load(nodes).unwrap_err();
        assert!(err.to_string().contains("ghost"), "{err}");
    }

    #[test]
    fn execution_without_executor_fails() {
        let mut exec = execution("itemA", "E1");
        exec.executor_id = None;
        let err = MenuGraph::load(menu_with(&["itemA"], vec![exec])).unwrap_err();
        assert_eq!(err, ConfigError::MissingExecutorId("itemA".to_string()));
    }

    #[test]
    fn root_without_options_fails() {
        let mut nodes = default_menu();
        nodes[0].selection_options = Some(Vec::new());
        let err = MenuGraph::load(nodes).unwrap_err();
        assert_eq!(err, ConfigError::RootWithoutOptions(ROOT.to_string()));
    }

    #[test]
    fn get_unknown_id_is_not_found() {
        let graph = MenuGraph::load(default_menu()).expect("load");
        assert_eq!(
            graph.get("missing").unwrap_err(),
            NotFoundError("missing".to_string())
        );
        assert_eq!(graph.get(OUTPUT).expect("output").id, OUTPUT);
    }
}
