//! Display collaborators: where menus and execution output are rendered.
//!
//! The engine calls a [`Display`] synchronously after every processed event.
//! Display failures are the display's problem; the engine logs them and keeps
//! going. [`RetryingDisplay`] adds a bounded retry policy for flaky devices.

use std::io::{self, Write};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::{debug, warn};

use crate::menu::{MenuNode, SelectionOption};

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

pub trait Display {
    /// Render a SELECTION node with the cursor row highlighted.
    fn render_menu(&mut self, node: &MenuNode, cursor: Option<usize>) -> Result<()>;

    /// Render the text produced by the last execution.
    fn render_output(&mut self, node: &MenuNode, text: &str) -> Result<()>;

    fn clear(&mut self) -> Result<()>;

    /// Release the device on shutdown.
    fn cleanup(&mut self) -> Result<()> {
        self.clear()
    }
}

impl<D: Display + ?Sized> Display for Box<D> {
    fn render_menu(&mut self, node: &MenuNode, cursor: Option<usize>) -> Result<()> {
        (**self).render_menu(node, cursor)
    }

    fn render_output(&mut self, node: &MenuNode, text: &str) -> Result<()> {
        (**self).render_output(node, text)
    }

    fn clear(&mut self) -> Result<()> {
        (**self).clear()
    }

    fn cleanup(&mut self) -> Result<()> {
        (**self).cleanup()
    }
}

fn require_options(node: &MenuNode) -> Result<&[SelectionOption]> {
    let options = node.options();
    if options.is_empty() {
        bail!("menu node '{}' has no selection options to display", node.id);
    }
    Ok(options)
}

/// Unbounded line display: every option on its own line, 0-based numbering.
#[derive(Debug)]
pub struct PlainDisplay<W: Write> {
    out: W,
}

impl PlainDisplay<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> PlainDisplay<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Display for PlainDisplay<W> {
    fn render_menu(&mut self, node: &MenuNode, cursor: Option<usize>) -> Result<()> {
        let options = require_options(node)?;
        for (position, option) in options.iter().enumerate() {
            let marker = if cursor == Some(position) { '>' } else { ' ' };
            writeln!(self.out, "{marker} {position}: {}", option.display_label)
                .context("write menu row")?;
        }
        self.out.flush().context("flush display")
    }

    fn render_output(&mut self, _node: &MenuNode, text: &str) -> Result<()> {
        self.out.write_all(text.as_bytes()).context("write output")?;
        if !text.ends_with('\n') {
            writeln!(self.out).context("write output")?;
        }
        self.out.flush().context("flush display")
    }

    fn clear(&mut self) -> Result<()> {
        self.out
            .write_all(CLEAR_SCREEN.as_bytes())
            .context("clear display")?;
        self.out.flush().context("flush display")
    }
}

/// Fixed rows x columns character display, like a small LCD.
///
/// Menus show a window of `rows` options that follows the cursor, numbered
/// from 1. Every row is clipped and padded to exactly `columns` characters.
#[derive(Debug)]
pub struct BoundedDisplay<W: Write> {
    out: W,
    rows: usize,
    columns: usize,
    window_top: usize,
}

impl BoundedDisplay<io::Stdout> {
    pub fn stdout(rows: usize, columns: usize) -> Result<Self> {
        Self::new(io::stdout(), rows, columns)
    }
}

impl<W: Write> BoundedDisplay<W> {
    pub fn new(out: W, rows: usize, columns: usize) -> Result<Self> {
        if rows == 0 {
            bail!("number of rows must be greater than zero");
        }
        if columns == 0 {
            bail!("number of columns must be greater than zero");
        }
        Ok(Self {
            out,
            rows,
            columns,
            window_top: 0,
        })
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Index of the first option currently shown.
    pub fn window_top(&self) -> usize {
        self.window_top
    }

    /// Slide the window the minimum distance needed to keep `cursor` visible.
    fn follow(&mut self, cursor: usize) {
        if cursor < self.window_top {
            self.window_top = cursor;
        } else if cursor >= self.window_top + self.rows {
            self.window_top = cursor + 1 - self.rows;
        }
    }

    fn menu_rows(&self, options: &[SelectionOption], cursor: Option<usize>) -> Vec<String> {
        options
            .iter()
            .enumerate()
            .skip(self.window_top)
            .take(self.rows)
            .map(|(position, option)| {
                let marker = if cursor == Some(position) { '>' } else { ' ' };
                self.fit(&format!("{marker}{}: {}", position + 1, option.display_label))
            })
            .collect()
    }

    fn output_rows(&self, text: &str) -> Vec<String> {
        let mut rows = Vec::new();
        for line in text.lines() {
            let chars: Vec<char> = line.chars().collect();
            if chars.is_empty() {
                rows.push(String::new());
            }
            rows.extend(chars.chunks(self.columns).map(|chunk| chunk.iter().collect()));
        }
        rows.truncate(self.rows);
        rows
    }

    fn fit(&self, row: &str) -> String {
        let clipped: String = row.chars().take(self.columns).collect();
        format!("{clipped:<width$}", width = self.columns)
    }

    fn write_rows(&mut self, rows: &[String]) -> Result<()> {
        for row in rows {
            writeln!(self.out, "{row}").context("write display row")?;
        }
        self.out.flush().context("flush display")
    }
}

impl<W: Write> Display for BoundedDisplay<W> {
    fn render_menu(&mut self, node: &MenuNode, cursor: Option<usize>) -> Result<()> {
        let options = require_options(node)?;
        self.follow(cursor.unwrap_or(0));
        let rows = self.menu_rows(options, cursor);
        self.write_rows(&rows)
    }

    fn render_output(&mut self, _node: &MenuNode, text: &str) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        let rows = self.output_rows(text);
        self.write_rows(&rows)
    }

    fn clear(&mut self) -> Result<()> {
        self.out
            .write_all(CLEAR_SCREEN.as_bytes())
            .context("clear display")?;
        self.out.flush().context("flush display")
    }
}

/// Fixed attempt count with a fixed pause between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, backoff: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            backoff,
        }
    }
}

/// Wraps a display and retries failed calls according to a [`RetryPolicy`].
#[derive(Debug)]
pub struct RetryingDisplay<D> {
    inner: D,
    policy: RetryPolicy,
}

impl<D: Display> RetryingDisplay<D> {
    pub fn new(inner: D, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }

    fn retry<F>(&mut self, op: &str, mut call: F) -> Result<()>
    where
        F: FnMut(&mut D) -> Result<()>,
    {
        let attempts = self.policy.attempts.max(1);
        let mut attempt = 1;
        loop {
            match call(&mut self.inner) {
                Ok(()) => {
                    if attempt > 1 {
                        debug!(op, attempt, "display recovered");
                    }
                    return Ok(());
                }
                Err(err) if attempt < attempts => {
                    warn!(op, attempt, err = format!("{err:#}"), "display call failed, retrying");
                    thread::sleep(self.policy.backoff);
                    attempt += 1;
                }
                Err(err) => {
                    return Err(err.context(format!("{op} failed after {attempts} attempts")));
                }
            }
        }
    }
}

impl<D: Display> Display for RetryingDisplay<D> {
    fn render_menu(&mut self, node: &MenuNode, cursor: Option<usize>) -> Result<()> {
        self.retry("render_menu", |inner| inner.render_menu(node, cursor))
    }

    fn render_output(&mut self, node: &MenuNode, text: &str) -> Result<()> {
        self.retry("render_output", |inner| inner.render_output(node, text))
    }

    fn clear(&mut self) -> Result<()> {
        self.retry("clear", |inner| inner.clear())
    }

    fn cleanup(&mut self) -> Result<()> {
        self.retry("cleanup", |inner| inner.cleanup())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::{NodeKind, OUTPUT};
    use crate::test_support::selection_with_labels;

    fn output_node() -> MenuNode {
        MenuNode {
            id: OUTPUT.to_string(),
            kind: NodeKind::Output,
            selection_options: None,
            executor_id: None,
            requires_confirmation: false,
        }
    }

    fn rendered(bytes: Vec<u8>) -> Vec<String> {
        String::from_utf8(bytes)
            .expect("utf8")
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn plain_display_marks_cursor_row() {
        let node = selection_with_labels("ROOT", &[("a", "Alpha"), ("b", "Beta")]);
        let mut display = PlainDisplay::new(Vec::new());
        display.render_menu(&node, Some(1)).expect("render");
        assert_eq!(
            rendered(display.into_inner()),
            vec!["  0: Alpha", "> 1: Beta"]
        );
    }

    #[test]
    fn plain_display_prints_output_verbatim() {
        let mut display = PlainDisplay::new(Vec::new());
        display
            .render_output(&output_node(), "line one\nline two\n")
            .expect("render");
        assert_eq!(
            String::from_utf8(display.into_inner()).expect("utf8"),
            "line one\nline two\n"
        );
    }

    #[test]
    fn menu_without_options_is_an_error() {
        let node = selection_with_labels("EMPTY", &[]);
        let mut display = PlainDisplay::new(Vec::new());
        let err = display.render_menu(&node, None).unwrap_err();
        assert!(err.to_string().contains("no selection options"));
    }

    #[test]
    fn bounded_display_rejects_zero_size() {
        assert!(BoundedDisplay::new(Vec::new(), 0, 20).is_err());
        assert!(BoundedDisplay::new(Vec::new(), 4, 0).is_err());
    }

    #[test]
    fn bounded_display_clips_and_pads_rows() {
        let node = selection_with_labels(
            "ROOT",
            &[("a", "A very long label indeed"), ("b", "Short")],
        );
        let mut display = BoundedDisplay::new(Vec::new(), 4, 10).expect("display");
        display.render_menu(&node, Some(0)).expect("render");
        assert_eq!(
            rendered(display.into_inner()),
            vec![">1: A very", " 2: Short "]
        );
    }

    #[test]
    fn bounded_window_follows_cursor() {
        let labels = [("a", "A"), ("b", "B"), ("c", "C"), ("d", "D")];
        let node = selection_with_labels("ROOT", &labels);
        let mut display = BoundedDisplay::new(Vec::new(), 2, 5).expect("display");

        display.render_menu(&node, Some(0)).expect("render 0");
        assert_eq!(display.window_top(), 0);
        display.render_menu(&node, Some(1)).expect("render 1");
        assert_eq!(display.window_top(), 0);
        display.render_menu(&node, Some(2)).expect("render 2");
        assert_eq!(display.window_top(), 1);
        display.render_menu(&node, Some(3)).expect("render 3");
        assert_eq!(display.window_top(), 2);
        display.render_menu(&node, Some(2)).expect("render 2 again");
        assert_eq!(display.window_top(), 2);
        display.render_menu(&node, Some(1)).expect("render 1 again");
        assert_eq!(display.window_top(), 1);

        let rows = rendered(display.into_inner());
        assert_eq!(rows[rows.len() - 2..], [">2: B", " 3: C"]);
    }

    #[test]
    fn bounded_output_wraps_and_truncates() {
        let mut display = BoundedDisplay::new(Vec::new(), 2, 4).expect("display");
        display
            .render_output(&output_node(), "abcdefghij\nxyz")
            .expect("render");
        assert_eq!(rendered(display.into_inner()), vec!["abcd", "efgh"]);
    }

    #[test]
    fn bounded_output_skips_empty_text() {
        let mut display = BoundedDisplay::new(Vec::new(), 2, 4).expect("display");
        display.render_output(&output_node(), "").expect("render");
        assert!(display.into_inner().is_empty());
    }

    struct Flaky {
        failures_left: u32,
        calls: u32,
    }

    impl Display for Flaky {
        fn render_menu(&mut self, _node: &MenuNode, _cursor: Option<usize>) -> Result<()> {
            self.calls += 1;
            if self.failures_left > 0 {
                self.failures_left -= 1;
                bail!("device busy");
            }
            Ok(())
        }

        fn render_output(&mut self, node: &MenuNode, _text: &str) -> Result<()> {
            self.render_menu(node, None)
        }

        fn clear(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn retrying_display_recovers_within_budget() {
        let node = selection_with_labels("ROOT", &[("a", "A")]);
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let mut display = RetryingDisplay::new(
            Flaky {
                failures_left: 2,
                calls: 0,
            },
            policy,
        );
        display.render_menu(&node, Some(0)).expect("render");
        assert_eq!(display.inner().calls, 3);
    }

    #[test]
    fn retrying_display_gives_up_after_budget() {
        let node = selection_with_labels("ROOT", &[("a", "A")]);
        let policy = RetryPolicy::new(2, Duration::ZERO);
        let mut display = RetryingDisplay::new(
            Flaky {
                failures_left: 5,
                calls: 0,
            },
            policy,
        );
        let err = display.render_menu(&node, Some(0)).unwrap_err();
        assert_eq!(display.inner().calls, 2);
        assert!(format!("{err:#}").contains("device busy"));
        assert!(err.to_string().contains("after 2 attempts"));
    }
}
