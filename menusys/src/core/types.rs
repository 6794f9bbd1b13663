//! Shared deterministic types for the menu engine.
//!
//! These types define the contracts between the navigator, the dispatcher and
//! the event loop. Wire names match the executors document on disk.

use serde::{Deserialize, Serialize};

use crate::menu::{NO, YES};

/// Where the navigator goes after an execution finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Destination {
    #[serde(rename = "home")]
    Home,
    #[serde(rename = "lastSelectOptionMenu")]
    LastSelectionMenu,
    #[serde(rename = "confirmation")]
    Confirmation,
    #[serde(rename = "postExecuteOutput")]
    PostExecuteOutput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutorKind {
    /// `name` is a file in the scripts directory.
    Script,
    /// `name` is an action registered in the [`ActionRegistry`](crate::actions::ActionRegistry).
    Method,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorDescriptor {
    #[serde(rename = "_id_")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ExecutorKind,
    pub name: String,
    #[serde(
        rename = "destinationOverride",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub destination_override: Option<Destination>,
}

impl ExecutorDescriptor {
    /// Destination after a successful run; defaults to home.
    pub fn destination(&self) -> Destination {
        self.destination_override.unwrap_or(Destination::Home)
    }
}

/// Uniform outcome of running a script or an in-process action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub output: String,
    pub status_code: i32,
    pub destination: Destination,
}

impl ExecutionResult {
    pub fn new(output: impl Into<String>, status_code: i32, destination: Destination) -> Self {
        Self {
            output: output.into(),
            status_code,
            destination,
        }
    }

    /// Failed execution, always routed to the output node.
    pub fn failure(output: impl Into<String>) -> Self {
        Self::new(output, 1, Destination::PostExecuteOutput)
    }

    pub fn succeeded(&self) -> bool {
        self.status_code == 0
    }
}

/// Abstract input event produced by an input backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Up,
    Down,
    Select,
    Home,
    Quit,
    None,
}

/// Executors backing the conventional `YES` / `NO` confirmation nodes.
pub fn default_executors() -> Vec<ExecutorDescriptor> {
    vec![
        ExecutorDescriptor {
            id: YES.to_string(),
            kind: ExecutorKind::Method,
            name: crate::actions::CONFIRM_YES.to_string(),
            destination_override: None,
        },
        ExecutorDescriptor {
            id: NO.to_string(),
            kind: ExecutorKind::Method,
            name: crate::actions::CONFIRM_NO.to_string(),
            destination_override: Some(Destination::LastSelectionMenu),
        },
    ]
}
