// src/core/mod.rs

/// Decoding of `argumentN` directives.
pub mod arguments;
/// Channel fan-out for notifications.
pub mod events;
/// Content hashes.
pub mod fingerprint;
/// Light and dark icon resolution.
pub mod icons;
/// Interpreter command lines and run outcomes.
pub mod launcher;
/// Directive parsing.
pub mod metadata_parser;
/// Config locations and path normalization.
pub mod paths;
/// Fields shown for listed scripts.
pub mod presentation;
/// `refreshTime` parsing.
pub mod refresh;
/// The sorted script registry.
pub mod registry;
/// Directory discovery.
pub mod scanner;
/// Settings file persistence.
pub mod settings;
/// Filesystem watching.
pub mod watcher;
