// src/core/icons.rs

use crate::models::{IconInfo, ScriptMetadata};
use std::path::Path;

/// Resolves the icon to show for each theme.
///
/// The light theme prefers `icon` and falls back to `iconDark`; the dark theme
/// does the opposite. Missing icons resolve to an empty string.
pub fn resolve_icons(metadata: &ScriptMetadata) -> IconInfo {
    let script_dir = metadata.script_directory();
    let icon = metadata.icon.as_deref().filter(|v| !v.trim().is_empty());
    let icon_dark = metadata.icon_dark.as_deref().filter(|v| !v.trim().is_empty());

    let resolve = |value: Option<&str>| {
        value
            .map(|value| resolve_icon_value(value.trim(), script_dir))
            .unwrap_or_default()
    };

    IconInfo {
        light: resolve(icon.or(icon_dark)),
        dark: resolve(icon_dark.or(icon)),
    }
}

/// Resolves a single icon value.
///
/// Emoji (at most two characters), web URLs and absolute paths are kept as they
/// are. A relative path is resolved against `script_dir` when that file exists.
pub fn resolve_icon_value(value: &str, script_dir: Option<&Path>) -> String {
    if value.chars().count() <= 2
        || value.starts_with("http://")
        || value.starts_with("https://")
        || Path::new(value).is_absolute()
    {
        return value.to_string();
    }

    match script_dir.map(|dir| dir.join(value)) {
        Some(candidate) if candidate.is_file() => candidate.to_string_lossy().into_owned(),
        _ => value.to_string(),
    }
}
