//! Deterministic, pure logic shared by the menu engine.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod executors;
pub mod graph;
pub mod invariants;
pub mod navigator;
pub mod types;
