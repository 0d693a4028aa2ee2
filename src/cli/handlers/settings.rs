use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use colored::Colorize;

use crate::{context::AppContext, core::launcher, models::Settings};

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true, about = "Shows or changes scriptdeck's settings.")]
struct SettingsArgs {
    #[command(subcommand)]
    action: Option<SettingsAction>,
}

#[derive(Subcommand, Debug)]
enum SettingsAction {
    /// Prints the current settings (default).
    Show,
    /// Sets the command used to run shell scripts, e.g. `wsl -- bash`.
    SetBash {
        /// The shell executable followed by its flags.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        command: Vec<String>,
    },
    /// Limits how long captured scripts may run. Use `none` to wait indefinitely.
    SetTimeout {
        /// Seconds, or `none`.
        value: String,
    },
}

/// Shows or edits the settings file.
pub fn handle(args: Vec<String>, ctx: &AppContext) -> Result<()> {
    let settings_args = SettingsArgs::try_parse_from(&args)?;

    match settings_args.action.unwrap_or(SettingsAction::Show) {
        SettingsAction::Show => {
            show(&ctx.settings(), ctx);
        }
        SettingsAction::SetBash { command } => {
            let command = command.join(" ");
            if command.trim().is_empty() {
                return Err(anyhow!(t!("settings.error.empty_shell")));
            }
            ctx.lock_settings().bash_path = command.trim().to_string();
            println!(
                "\n{} {}",
                t!("common.success").green().bold(),
                format!(t!("settings.info.bash_set"), command = command.trim().cyan())
            );
        }
        SettingsAction::SetTimeout { value } => {
            let timeout = parse_timeout(&value)?;
            ctx.lock_settings().launch_timeout_secs = timeout;
            println!("\n{}", t!("common.success").green().bold());
        }
    }
    Ok(())
}

fn show(settings: &Settings, ctx: &AppContext) {
    let (executable, flags) = launcher::split_shell_command(&settings.bash_path);

    println!("\n{}", t!("settings.header").bold());
    println!("  {:<20} {}", "File:".blue(), ctx.store().path().display());
    println!("  {:<20} {}", "Shell:".blue(), settings.bash_path.cyan());
    println!(
        "  {:<20} {} {}",
        "",
        executable.dimmed(),
        format!("{} -c \"<script>\"", flags).trim().dimmed()
    );
    let timeout = settings
        .launch_timeout_secs
        .map(|secs| format!("{}s", secs))
        .unwrap_or_else(|| t!("settings.label.no_timeout").to_string());
    println!("  {:<20} {}", "Timeout:".blue(), timeout);
    println!("  {:<20} {}", "Directories:".blue(), settings.directories.len());
    for directory in &settings.directories {
        println!("    - {}", directory.full_path.display());
    }
}

fn parse_timeout(value: &str) -> Result<Option<u64>> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("none") || value == "0" {
        return Ok(None);
    }
    value
        .parse::<u64>()
        .map(Some)
        .map_err(|_| anyhow!(t!("settings.error.invalid_timeout"), value = value))
}
