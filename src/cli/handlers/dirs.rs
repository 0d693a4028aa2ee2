use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use crate::{
    context::AppContext,
    core::{paths, scanner},
    models::{ScriptDirectoryInfo, Settings},
};

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true, about = "Manages the monitored script directories.")]
struct DirsArgs {
    #[command(subcommand)]
    action: Option<DirsAction>,
}

#[derive(Subcommand, Debug)]
enum DirsAction {
    /// Lists the monitored directories (default).
    #[command(alias = "ls")]
    List,
    /// Adds a directory to monitor.
    Add {
        /// The directory; `~` and environment variables are expanded.
        path: String,
    },
    /// Stops monitoring a directory.
    #[command(alias = "rm")]
    Remove {
        /// The directory, as added or as listed.
        path: String,
    },
}

/// Lists, adds or removes monitored directories.
pub fn handle(args: Vec<String>, ctx: &AppContext) -> Result<()> {
    let dirs_args = DirsArgs::try_parse_from(&args)?;

    match dirs_args.action.unwrap_or(DirsAction::List) {
        DirsAction::List => list(&ctx.settings()),
        DirsAction::Add { path } => {
            let added = {
                let mut settings = ctx.lock_settings();
                add_directory(&mut settings, &path)?
            };
            println!(
                "\n{} {}",
                t!("common.success").green().bold(),
                format!(t!("dirs.info.added"), path = added.display().to_string().cyan())
            );
            if !added.is_dir() {
                println!("  {}", t!("dirs.warning.missing").yellow());
            }
            Ok(())
        }
        DirsAction::Remove { path } => {
            let removed = {
                let mut settings = ctx.lock_settings();
                remove_directory(&mut settings, &path)?
            };
            println!(
                "\n{} {}",
                t!("common.success").green().bold(),
                format!(t!("dirs.info.removed"), path = removed.full_path.display())
            );
            Ok(())
        }
    }
}

fn list(settings: &Settings) -> Result<()> {
    if settings.directories.is_empty() {
        println!("\n{}", t!("dirs.info.none").yellow());
        return Ok(());
    }

    println!("\n{}", t!("dirs.header").bold());
    for directory in &settings.directories {
        let status = if directory.full_path.is_dir() {
            format!(
                t!("dirs.label.script_count"),
                count = scanner::find_script_files(&directory.full_path).len()
            )
            .dimmed()
            .to_string()
        } else {
            t!("dirs.label.missing").red().to_string()
        };
        println!(
            "  {:<24} {} {}",
            directory.display_name().green(),
            directory.full_path.display(),
            status
        );
    }
    Ok(())
}

/// Normalizes `raw` and appends it, rejecting duplicates (case-insensitive).
fn add_directory(settings: &mut Settings, raw: &str) -> Result<PathBuf> {
    let normalized = paths::normalize_directory(raw)
        .with_context(|| format!(t!("dirs.error.invalid_path"), path = raw))?;

    if settings
        .directories
        .iter()
        .any(|d| paths::paths_equal_ignore_case(&d.full_path, &normalized))
    {
        return Err(anyhow!(
            t!("dirs.error.duplicate"),
            path = normalized.display()
        ));
    }

    settings
        .directories
        .push(ScriptDirectoryInfo::new(normalized.clone()));
    Ok(normalized)
}

/// Removes the directory matching `raw`, either as typed or after normalization.
fn remove_directory(settings: &mut Settings, raw: &str) -> Result<ScriptDirectoryInfo> {
    let normalized = paths::normalize_directory(raw).ok();
    let position = settings.directories.iter().position(|d| {
        paths::paths_equal_ignore_case(&d.full_path, &PathBuf::from(raw))
            || normalized
                .as_deref()
                .is_some_and(|n| paths::paths_equal_ignore_case(&d.full_path, n))
    });

    match position {
        Some(index) => Ok(settings.directories.remove(index)),
        None => Err(anyhow!(t!("dirs.error.not_found"), path = raw)),
    }
}
