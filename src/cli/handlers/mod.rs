// src/cli/handlers/mod.rs

// One module per CLI action.

/// Helpers shared by several handlers.
pub mod commons;
/// `dirs`
pub mod dirs;
/// `info`
pub mod info;
/// `list`
pub mod list;
/// `run`
pub mod run;
/// `settings`
pub mod settings;
/// `watch`
pub mod watch;
