//! I/O collaborators for the menu engine.

pub mod config;
pub mod display;
pub mod init;
pub mod input;
pub mod menu_store;
pub mod process;
