//! Test-only helpers: menu and executor builders, a recording display, a
//! scripted input backend and script fixtures.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result};
use tempfile::TempDir;

use crate::actions::Action;
use crate::core::types::{Destination, ExecutionResult, ExecutorDescriptor, ExecutorKind, InputEvent};
use crate::dispatch::DispatchContext;
use crate::engine::EventSender;
use crate::io::display::Display;
use crate::io::input::InputBackend;
use crate::menu::{MenuNode, NodeKind, ROOT, SelectionOption, default_menu};

/// Selection node whose options are labelled after their targets.
pub fn selection(id: &str, targets: &[&str]) -> MenuNode {
    let labelled: Vec<(&str, &str)> = targets.iter().map(|target| (*target, *target)).collect();
    selection_with_labels(id, &labelled)
}

/// Selection node from `(target, label)` pairs.
pub fn selection_with_labels(id: &str, options: &[(&str, &str)]) -> MenuNode {
    MenuNode {
        id: id.to_string(),
        kind: NodeKind::Selection,
        selection_options: Some(
            options
                .iter()
                .map(|(target, label)| SelectionOption {
                    target_node_id: (*target).to_string(),
                    display_label: (*label).to_string(),
                })
                .collect(),
        ),
        executor_id: None,
        requires_confirmation: false,
    }
}

pub fn execution(id: &str, executor: &str) -> MenuNode {
    MenuNode {
        id: id.to_string(),
        kind: NodeKind::Execution,
        selection_options: None,
        executor_id: Some(executor.to_string()),
        requires_confirmation: false,
    }
}

/// Execution node that routes through the confirmation menu first.
pub fn confirmed_execution(id: &str, executor: &str) -> MenuNode {
    MenuNode {
        requires_confirmation: true,
        ..execution(id, executor)
    }
}

/// The default menu with ROOT's options replaced by `root_targets`, plus
/// `extra` nodes appended.
pub fn menu_with(root_targets: &[&str], extra: Vec<MenuNode>) -> Vec<MenuNode> {
    let mut nodes: Vec<MenuNode> = default_menu()
        .into_iter()
        .map(|node| {
            if node.id == ROOT {
                selection(ROOT, root_targets)
            } else {
                node
            }
        })
        .collect();
    nodes.extend(extra);
    nodes
}

pub fn script(id: &str, name: &str) -> ExecutorDescriptor {
    ExecutorDescriptor {
        id: id.to_string(),
        kind: ExecutorKind::Script,
        name: name.to_string(),
        destination_override: None,
    }
}

pub fn method(id: &str, name: &str, destination: Option<Destination>) -> ExecutorDescriptor {
    ExecutorDescriptor {
        id: id.to_string(),
        kind: ExecutorKind::Method,
        name: name.to_string(),
        destination_override: destination,
    }
}

/// Write an executable `#!/bin/sh` script named `name` into `dir`.
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> Result<PathBuf> {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n"))
        .with_context(|| format!("write {}", path.display()))?;
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
        .with_context(|| format!("chmod {}", path.display()))?;
    Ok(path)
}

/// Temporary scripts directory holding `(name, body)` scripts.
#[cfg(unix)]
pub fn scripts_dir_with(scripts: &[(&str, &str)]) -> Result<TempDir> {
    let dir = tempfile::tempdir().context("create scripts dir")?;
    for (name, body) in scripts {
        write_script(dir.path(), name, body)?;
    }
    Ok(dir)
}

/// One call observed by [`RecordingDisplay`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    Menu { node: String, cursor: Option<usize> },
    Output(String),
}

/// Display that remembers every frame it was asked to render.
#[derive(Debug, Default)]
pub struct RecordingDisplay {
    frames: Vec<Rendered>,
    clears: usize,
    cleaned_up: bool,
}

impl RecordingDisplay {
    pub fn frames(&self) -> &[Rendered] {
        &self.frames
    }

    pub fn outputs(&self) -> Vec<&str> {
        self.frames
            .iter()
            .filter_map(|frame| match frame {
                Rendered::Output(text) => Some(text.as_str()),
                Rendered::Menu { .. } => None,
            })
            .collect()
    }

    pub fn clears(&self) -> usize {
        self.clears
    }

    pub fn cleaned_up(&self) -> bool {
        self.cleaned_up
    }
}

impl Display for RecordingDisplay {
    fn render_menu(&mut self, node: &MenuNode, cursor: Option<usize>) -> Result<()> {
        self.frames.push(Rendered::Menu {
            node: node.id.clone(),
            cursor,
        });
        Ok(())
    }

    fn render_output(&mut self, _node: &MenuNode, text: &str) -> Result<()> {
        self.frames.push(Rendered::Output(text.to_string()));
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.clears += 1;
        Ok(())
    }

    fn cleanup(&mut self) -> Result<()> {
        self.cleaned_up = true;
        self.clear()
    }
}

/// Input backend that enqueues a fixed list of events on start.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    events: Vec<InputEvent>,
    quit_after: bool,
    started: bool,
    stopped: bool,
}

impl ScriptedInput {
    /// Send `events`, then a final `Quit`.
    pub fn new(events: Vec<InputEvent>) -> Self {
        Self {
            events,
            quit_after: true,
            ..Self::default()
        }
    }

    /// Sends nothing; the engine must be stopped from outside.
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn was_started(&self) -> bool {
        self.started
    }

    pub fn was_stopped(&self) -> bool {
        self.stopped
    }
}

impl InputBackend for ScriptedInput {
    fn start(&mut self, events: EventSender) -> Result<()> {
        self.started = true;
        for event in self.events.drain(..) {
            events.send(event)?;
        }
        if self.quit_after {
            events.send(InputEvent::Quit)?;
        }
        Ok(())
    }

    fn stop(&mut self) {
        self.stopped = true;
    }
}

/// Method action that counts its invocations.
#[derive(Debug, Clone, Default)]
pub struct CountingAction {
    calls: Arc<AtomicUsize>,
}

impl CountingAction {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Action for CountingAction {
    fn invoke(&self, _ctx: &DispatchContext<'_>) -> Result<Option<ExecutionResult>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(None)
    }
}
