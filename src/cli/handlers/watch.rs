use anyhow::{Context, Result, anyhow};
use clap::Parser;
use colored::Colorize;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crate::{
    context::AppContext,
    core::watcher::WatchCoordinator,
    models::RegistryEvent,
};

#[derive(Parser, Debug, Default)]
#[command(
    no_binary_name = true,
    about = "Watches the script directories and reports changes until interrupted."
)]
struct WatchArgs {}

/// Watches until interrupted, printing registry changes as they happen.
pub fn handle(args: Vec<String>, ctx: &AppContext) -> Result<()> {
    WatchArgs::try_parse_from(&args)?;

    let directories = ctx.settings().directories;
    if directories.is_empty() {
        return Err(anyhow!(t!("error.no_directories")));
    }

    let events = ctx.registry().subscribe();
    let coordinator = WatchCoordinator::new(Arc::clone(ctx.registry()));
    let count = coordinator.set_directories(&directories)?;

    println!(
        "\n{}",
        format!(
            t!("watch.info.started"),
            count = count,
            directories = directories.len()
        )
        .green()
        .bold()
    );
    println!("{}", t!("watch.info.stop_hint").dimmed());

    // Kept alive for the whole loop; dropping it stops the settings observation.
    let (_settings_watcher, settings_changes) = observe_settings_file(ctx.store().path())?;

    loop {
        match events.recv_timeout(Duration::from_millis(250)) {
            Ok(event) => print_event(&event, ctx),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        if settings_changes.try_iter().count() > 0 {
            let settings = ctx.reload_settings();
            if settings.directories != coordinator.watched_roots() {
                log::info!("Settings changed on disk; switching directories.");
                coordinator.set_directories(&settings.directories)?;
            }
        }
    }

    Ok(())
}

/// Watches the folder holding the settings file and signals writes to the file itself.
fn observe_settings_file(settings_path: &Path) -> Result<(RecommendedWatcher, Receiver<()>)> {
    let (tx, rx) = mpsc::channel();
    let file_name = settings_path.file_name().map(|name| name.to_os_string());

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        let Ok(event) = res else {
            return;
        };
        let touches_settings = event
            .paths
            .iter()
            .any(|path| path.file_name().map(|n| n.to_os_string()) == file_name);
        if touches_settings && !event.kind.is_access() {
            let _ = tx.send(());
        }
    })?;

    if let Some(parent) = settings_path.parent().filter(|p| p.is_dir()) {
        watcher
            .watch(parent, RecursiveMode::NonRecursive)
            .with_context(|| format!("Could not watch '{}'", parent.display()))?;
    }
    Ok((watcher, rx))
}

fn print_event(event: &RegistryEvent, ctx: &AppContext) {
    match event {
        RegistryEvent::Reloaded { count } => {
            println!("{}", format!(t!("watch.event.reloaded"), count = count).dimmed());
        }
        RegistryEvent::Inserted { path } => {
            let title = ctx
                .registry()
                .get(path)
                .map(|m| m.display_title().to_string())
                .unwrap_or_default();
            println!(
                "{} {} {}",
                "+".green().bold(),
                title.cyan(),
                path.display().to_string().dimmed()
            );
        }
        RegistryEvent::Removed { path } => {
            println!("{} {}", "-".red().bold(), path.display());
        }
        RegistryEvent::DirectoriesChanged { directories } => {
            let names: Vec<String> = directories.iter().map(|d| d.display_name()).collect();
            println!(
                "{}",
                format!(t!("watch.event.directories"), names = names.join(", ")).yellow()
            );
        }
    }
}
