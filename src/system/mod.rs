//! # System Interaction Layer
//!
//! The boundary between the engine and the operating system's process model.
//!
//! ## Modules
//!
//! - **`executor`**: spawns script interpreters from a `LaunchSpec`, either
//!   interactively or with standard output captured (optionally bounded by a
//!   timeout), and maps the result to a `ScriptOutcome`.

/// Spawns interpreters and collects their output.
pub mod executor;
