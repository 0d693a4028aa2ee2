// src/bin/scriptdeck.rs

use anyhow::Result;
use clap::Parser;
use colored::*;
use scriptdeck::{
    cli::{Cli, handlers},
    context::AppContext,
    core::settings::SettingsStore,
};

// --- Command Definition and Registry ---

/// Every handler receives the arguments after the action and the shared context.
type Handler = fn(Vec<String>, &AppContext) -> Result<()>;

/// Defines a system command, its aliases, and its handler function.
/// The handler signature is kept consistent across all commands for simplicity in the registry.
struct CommandDefinition {
    name: &'static str,
    aliases: &'static [&'static str],
    handler: Handler,
}

/// The single source of truth for all system commands.
/// To add a new command, add a new entry to this static array.
static COMMAND_REGISTRY: &[CommandDefinition] = &[
    CommandDefinition {
        name: "dirs",
        aliases: &["dir"],
        handler: handlers::dirs::handle,
    },
    CommandDefinition {
        name: "info",
        aliases: &[],
        handler: handlers::info::handle,
    },
    CommandDefinition {
        name: "list",
        aliases: &["ls"],
        handler: handlers::list::handle,
    },
    CommandDefinition {
        name: "run",
        aliases: &[],
        handler: handlers::run::handle,
    },
    CommandDefinition {
        name: "settings",
        aliases: &["config"],
        handler: handlers::settings::handle,
    },
    CommandDefinition {
        name: "watch",
        aliases: &[],
        handler: handlers::watch::handle,
    },
];

/// Finds a command definition in the registry by its name or alias.
fn find_command(name: &str) -> Option<&'static CommandDefinition> {
    COMMAND_REGISTRY
        .iter()
        .find(|cmd| cmd.name == name || cmd.aliases.contains(&name))
}

/// The main entry point of the `scriptdeck` application.
/// It sets up logging, parses arguments, dispatches to the correct handler,
/// and performs centralized error handling.
fn main() {
    env_logger::init();

    if let Err(e) = run_cli(Cli::parse()) {
        eprintln!("\n{}: {:#}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// Builds the application context, routes to a handler and saves any settings
/// the handler changed.
fn run_cli(cli: Cli) -> Result<()> {
    log::debug!("CLI args parsed: {:?}", cli);

    let store = SettingsStore::from_default_location()?;
    let ctx = AppContext::new(store);

    let (handler, args) = match cli.action {
        // No arguments: list what is available.
        None => (handlers::list::handle as Handler, cli.args),
        Some(action) => match find_command(&action) {
            Some(command) => (command.handler, cli.args),
            None => {
                // Not a system command, so it's a script. Shortcut for `run`.
                let mut run_args = vec![action];
                run_args.extend(cli.args);
                (handlers::run::handle as Handler, run_args)
            }
        },
    };

    handler(args, &ctx)?;

    if ctx.persist_if_needed()? {
        log::debug!("Settings saved to '{}'.", ctx.store().path().display());
    }
    Ok(())
}
