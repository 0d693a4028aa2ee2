// src/cli/handlers/commons.rs

// Shared helpers used by multiple handlers.

use anyhow::{Result, anyhow};
use colored::Colorize;
use dialoguer::{Select, theme::ColorfulTheme};
use std::sync::Arc;

use crate::{
    context::AppContext,
    core::paths,
    models::{CommandResult, ScriptDirectoryInfo, ScriptMetadata, ScriptOutcome},
};

/// Loads the registry and fails early when no directory is configured.
pub fn load_registry(ctx: &AppContext) -> Result<usize> {
    if ctx.lock_settings().directories.is_empty() {
        return Err(anyhow!(t!("error.no_directories")));
    }
    Ok(ctx.reload_registry())
}

/// Finds the script the user meant by `query` (a title or a path).
///
/// When several titles match, the user picks one interactively.
pub fn resolve_script(query: &str, ctx: &AppContext) -> Result<Arc<ScriptMetadata>> {
    let mut matches = ctx.registry().find(query);

    match matches.len() {
        0 => Err(anyhow!(t!("error.script_not_found"), query = query)),
        1 => Ok(matches.remove(0)),
        _ => {
            let items: Vec<String> = matches
                .iter()
                .map(|m| {
                    format!(
                        "{}  {}",
                        m.display_title(),
                        m.script_file_path.display().to_string().dimmed()
                    )
                })
                .collect();

            let selection = Select::with_theme(&ColorfulTheme::default())
                .with_prompt(format!(t!("prompt.pick_script"), query = query))
                .items(&items)
                .default(0)
                .interact()?;

            Ok(matches.remove(selection))
        }
    }
}

/// The configured root a script was loaded from, if any.
pub fn source_directory<'a>(
    metadata: &ScriptMetadata,
    directories: &'a [ScriptDirectoryInfo],
) -> Option<&'a ScriptDirectoryInfo> {
    directories
        .iter()
        .find(|d| paths::is_within_root(&metadata.script_file_path, &d.full_path))
}

/// Prints what the launcher would show after a run.
pub fn print_outcome(outcome: &ScriptOutcome) {
    if let Some(toast) = &outcome.toast {
        println!("{} {}", "›".cyan().bold(), toast);
    }
    if let Some(subtitle) = &outcome.inline_subtitle {
        println!("{} {}", t!("run.label.inline").dimmed(), subtitle.bold());
    }
    match &outcome.result {
        CommandResult::ShowToast(message) => println!("{} {}", "✔".green().bold(), message),
        CommandResult::Dismiss | CommandResult::KeepOpen => {}
    }
}
