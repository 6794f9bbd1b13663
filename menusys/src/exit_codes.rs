//! Stable exit codes for menusys CLI commands.

/// Command succeeded; the menu is valid or the engine exited on quit.
pub const OK: i32 = 0;
/// Configuration is invalid or unreadable, or any other error.
pub const INVALID: i32 = 1;
/// The engine stopped because configuration and runtime disagreed.
pub const DISPATCH: i32 = 2;
