//! Discovers annotated script files, keeps a live registry of them and turns
//! each one into a runnable command.

include!(concat!(env!("OUT_DIR"), "/translations.rs"));

/// Argument parsing and one handler per action.
pub mod cli;
/// Fixed names and limits.
pub mod constants;
/// Settings and registry shared by the handlers.
pub mod context;
/// Parsing, discovery, the registry, watching and launching.
pub mod core;
/// Timing helpers.
pub mod dev_utils;
/// Data types shared across layers.
pub mod models;
/// Process execution.
pub mod system;
