//! Cursor and current-node state machine.
//!
//! The navigator is the only owner of "where am I" state. Every transition
//! goes through one of its methods and recomputes the cursor, so the cursor is
//! always `None` or a valid index into the current node's options.

use std::sync::Arc;

use tracing::debug;

use crate::core::graph::MenuGraph;
use crate::error::NavigationError;
use crate::menu::{CONFIRMATION, MenuNode};

#[derive(Debug, Clone)]
pub struct Navigator {
    graph: Arc<MenuGraph>,
    current: String,
    cursor: Option<usize>,
    last_selection: String,
}

impl Navigator {
    /// Start parked at ROOT.
    pub fn new(graph: Arc<MenuGraph>) -> Self {
        let root = graph.root().id.clone();
        let mut navigator = Self {
            graph,
            current: root.clone(),
            cursor: None,
            last_selection: root,
        };
        navigator.home();
        navigator
    }

    pub fn current(&self) -> &MenuNode {
        self.node(&self.current)
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Most recent non-confirmation selection menu the user selected from.
    pub fn last_selection(&self) -> &MenuNode {
        self.node(&self.last_selection)
    }

    pub fn home(&mut self) {
        self.current = self.graph.root().id.clone();
        self.set_cursor();
    }

    pub fn scroll_up(&mut self) {
        if let Some(position) = self.cursor
            && position > 0
        {
            self.cursor = Some(position - 1);
        }
    }

    pub fn scroll_down(&mut self) {
        let count = self.current().options().len();
        if let Some(position) = self.cursor
            && position + 1 < count
        {
            self.cursor = Some(position + 1);
        }
    }

    /// Move to the node behind the option under the cursor.
    pub fn select_current(&mut self) -> Result<(), NavigationError> {
        let current = self.current();
        let target = self
            .cursor
            .and_then(|position| current.options().get(position))
            .map(|option| option.target_node_id.clone())
            .ok_or_else(|| NavigationError::NothingSelected(current.id.clone()))?;

        if self.current != CONFIRMATION {
            self.last_selection = self.current.clone();
        }
        debug!(from = %self.current, to = %target, "select");
        self.current = target;
        self.set_cursor();
        Ok(())
    }

    pub fn go_to_confirmation(&mut self) {
        self.current = self.graph.confirmation().id.clone();
        self.set_cursor();
    }

    pub fn go_to_last_selection_menu(&mut self) {
        self.current = self.last_selection.clone();
        self.set_cursor();
    }

    pub fn go_to_post_execute_output(&mut self) {
        self.current = self.graph.output().id.clone();
        self.cursor = None;
    }

    fn set_cursor(&mut self) {
        self.cursor = if self.current().options().is_empty() {
            None
        } else {
            Some(0)
        };
    }

    fn node(&self, id: &str) -> &MenuNode {
        // Ids held here always come from the validated graph.
        self.graph
            .get(id)
            .unwrap_or_else(|_| unreachable!("navigator holds unknown node id {id}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::{NO, OUTPUT, ROOT, YES};
    use crate::test_support::{execution, menu_with, selection};

    fn navigator(root_targets: &[&str], extra: Vec<MenuNode>) -> Navigator {
        let graph = MenuGraph::load(menu_with(root_targets, extra)).expect("graph");
        Navigator::new(Arc::new(graph))
    }

    #[test]
    fn starts_at_root_with_cursor_at_zero() {
        let nav = navigator(&[OUTPUT], vec![]);
        assert_eq!(nav.current().id, ROOT);
        assert_eq!(nav.cursor(), Some(0));
        assert_eq!(nav.last_selection().id, ROOT);
    }

    #[test]
    fn scroll_down_stops_at_last_option() {
        let mut nav = navigator(&[OUTPUT, OUTPUT, OUTPUT], vec![]);
        for _ in 0..10 {
            nav.scroll_down();
        }
        assert_eq!(nav.cursor(), Some(2));
    }

    #[test]
    fn scroll_up_stops_at_zero() {
        let mut nav = navigator(&[OUTPUT, OUTPUT], vec![]);
        nav.scroll_up();
        assert_eq!(nav.cursor(), Some(0));
        nav.scroll_down();
        nav.scroll_up();
        nav.scroll_up();
        assert_eq!(nav.cursor(), Some(0));
    }

    #[test]
    fn cursor_stays_in_bounds_for_mixed_scrolls() {
        let mut nav = navigator(&[OUTPUT, OUTPUT, OUTPUT, OUTPUT], vec![]);
        let len = nav.current().options().len();
        // Deterministic pseudo-random up/down sequence.
        let mut seed: u32 = 7;
        for _ in 0..500 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            if seed & 0x100 == 0 {
                nav.scroll_up();
            } else {
                nav.scroll_down();
            }
            let cursor = nav.cursor().expect("cursor");
            assert!(cursor < len);
        }
    }

    #[test]
    fn scrolling_without_options_is_a_no_op() {
        let mut nav = navigator(&[OUTPUT], vec![]);
        nav.go_to_post_execute_output();
        nav.scroll_down();
        nav.scroll_up();
        assert_eq!(nav.cursor(), None);
        assert_eq!(nav.current().id, OUTPUT);
    }

    #[test]
    fn select_without_cursor_is_an_error() {
        let mut nav = navigator(&[OUTPUT], vec![]);
        nav.select_current().expect("select output");
        assert_eq!(nav.current().id, OUTPUT);
        assert_eq!(
            nav.select_current().unwrap_err(),
            NavigationError::NothingSelected(OUTPUT.to_string())
        );
    }

    #[test]
    fn select_records_last_selection_menu() {
        let mut nav = navigator(
            &["sub"],
            vec![selection("sub", &["job"]), execution("job", "E1")],
        );
        nav.select_current().expect("to sub");
        assert_eq!(nav.current().id, "sub");
        assert_eq!(nav.last_selection().id, ROOT);

        nav.select_current().expect("to job");
        assert_eq!(nav.current().id, "job");
        assert_eq!(nav.cursor(), None);
        assert_eq!(nav.last_selection().id, "sub");
    }

    #[test]
    fn selecting_from_confirmation_keeps_last_selection() {
        let mut nav = navigator(
            &["sub"],
            vec![selection("sub", &["job"]), execution("job", "E1")],
        );
        nav.select_current().expect("to sub");
        nav.select_current().expect("to job");
        nav.go_to_confirmation();
        assert_eq!(nav.cursor(), Some(0));

        nav.select_current().expect("to no");
        assert_eq!(nav.current().id, NO);
        assert_eq!(nav.last_selection().id, "sub");

        nav.go_to_last_selection_menu();
        assert_eq!(nav.current().id, "sub");
        assert_eq!(nav.cursor(), Some(0));

        nav.select_current().expect("to job");
        nav.go_to_confirmation();
        nav.scroll_down();
        nav.select_current().expect("to yes");
        assert_eq!(nav.current().id, YES);
        assert_eq!(nav.last_selection().id, "sub");
    }

    #[test]
    fn home_is_idempotent() {
        let mut nav = navigator(&["sub"], vec![selection("sub", &[OUTPUT, OUTPUT])]);
        nav.select_current().expect("to sub");
        nav.scroll_down();

        nav.home();
        let once = (nav.current().id.clone(), nav.cursor(), nav.last_selection().id.clone());
        nav.home();
        let twice = (nav.current().id.clone(), nav.cursor(), nav.last_selection().id.clone());
        assert_eq!(once, twice);
        assert_eq!(once.0, ROOT);
        assert_eq!(once.1, Some(0));
    }

    #[test]
    fn home_resets_cursor() {
        let mut nav = navigator(&[OUTPUT, OUTPUT], vec![]);
        nav.scroll_down();
        assert_eq!(nav.cursor(), Some(1));
        nav.home();
        assert_eq!(nav.cursor(), Some(0));
    }
}
