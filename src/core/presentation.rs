// src/core/presentation.rs

use crate::models::{ListItemView, ScriptMetadata};

/// The subtitle shown under a script's title.
///
/// Uses `packageName`, or the name of the folder holding the script when no
/// package is declared.
pub fn subtitle(metadata: &ScriptMetadata) -> String {
    match metadata.package_name.as_deref().filter(|p| !p.is_empty()) {
        Some(package) => package.to_string(),
        None => metadata
            .script_directory()
            .and_then(|dir| dir.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
    }
}

/// The detail pane: the description, then the script body in a fenced block.
pub fn details(metadata: &ScriptMetadata) -> String {
    let mut details = String::new();
    if let Some(description) = metadata.description.as_deref().filter(|d| !d.is_empty()) {
        details.push_str(description);
        details.push_str("\n\n");
    }
    details.push_str("```");
    details.push_str(metadata.language_tag().text);
    details.push('\n');
    details.push_str(metadata.script_body.trim_end());
    details.push_str("\n```");
    details
}

/// Everything a list row shows for `metadata`.
pub fn list_item_view(metadata: &ScriptMetadata) -> ListItemView {
    ListItemView {
        title: metadata.display_title().to_string(),
        subtitle: subtitle(metadata),
        tags: vec![metadata.language_tag()],
        details: details(metadata),
    }
}
