//! Menu navigation and execution engine for small character displays.
//!
//! A menu is a graph of nodes loaded from JSON documents. Selection nodes
//! list options, execution nodes run a script or an in-process action, and
//! an output node shows what the last execution printed. The architecture
//! keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (graph validation, navigation).
//!   No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting collaborators (documents, config, processes,
//!   displays, input devices).
//!
//! [`dispatch`] runs executors, [`engine`] drives navigation from a queue of
//! input events, and [`app`] / [`validate`] assemble everything for the CLI.

pub mod actions;
pub mod app;
pub mod core;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod menu;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod validate;
