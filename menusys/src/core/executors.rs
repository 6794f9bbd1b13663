//! Validated executor table.

use std::collections::BTreeMap;

use crate::core::graph::MenuGraph;
use crate::core::types::ExecutorDescriptor;
use crate::error::ConfigError;
use crate::menu::NodeKind;

#[derive(Debug, Clone, Default)]
pub struct ExecutorTable {
    executors: BTreeMap<String, ExecutorDescriptor>,
}

impl ExecutorTable {
    /// Build the table, rejecting duplicate executor ids.
    pub fn load(descriptors: Vec<ExecutorDescriptor>) -> Result<Self, ConfigError> {
        let mut executors = BTreeMap::new();
        for descriptor in descriptors {
            if executors.contains_key(&descriptor.id) {
                return Err(ConfigError::DuplicateId(descriptor.id));
            }
            executors.insert(descriptor.id.clone(), descriptor);
        }
        Ok(Self { executors })
    }

    pub fn get(&self, id: &str) -> Option<&ExecutorDescriptor> {
        self.executors.get(id)
    }

    /// Descriptors in executor id order.
    pub fn iter(&self) -> impl Iterator<Item = &ExecutorDescriptor> {
        self.executors.values()
    }

    pub fn len(&self) -> usize {
        self.executors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.executors.is_empty()
    }

    /// Every execution node in `graph` must name an executor in this table.
    pub fn check_references(&self, graph: &MenuGraph) -> Result<(), ConfigError> {
        for node in graph.nodes().filter(|n| n.kind == NodeKind::Execution) {
            let Some(executor) = node.executor_id.as_deref() else {
                continue;
            };
            if !self.executors.contains_key(executor) {
                return Err(ConfigError::UnknownExecutor {
                    node: node.id.clone(),
                    executor: executor.to_string(),
                });
            }
        }
        Ok(())
    }
}
