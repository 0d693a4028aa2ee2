use anyhow::{Context, Result, anyhow};
use clap::Parser;
use colored::Colorize;
use dialoguer::{Confirm, theme::ColorfulTheme};

use crate::{
    cli::handlers::commons,
    context::AppContext,
    core::launcher,
    models::ScriptMetadata,
    system::executor,
};

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true, about = "Runs a script.")]
struct RunArgs {
    /// Skip the confirmation prompt of scripts that ask for one.
    #[arg(long, short)]
    yes: bool,

    /// The script's title (or part of it) or its path.
    script: String,

    /// Values for the script's declared arguments, in order.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

///
/// Main entry point for the 'run' command.
/// Also reached through the `scriptdeck <script> [args...]` shortcut.
///
pub fn handle(args: Vec<String>, ctx: &AppContext) -> Result<()> {
    let run_args = RunArgs::try_parse_from(&args)?;

    commons::load_registry(ctx)?;
    let metadata = commons::resolve_script(&run_args.script, ctx)?;

    check_required_arguments(&metadata, &run_args.args)?;

    if metadata.needs_confirmation && !run_args.yes && !confirm_run(&metadata)? {
        println!("\n{}", t!("common.info.operation_cancelled"));
        return Ok(());
    }

    let spec = launcher::build_launch_spec(&metadata, &run_args.args, &ctx.settings());
    log::info!(
        "Launching '{}' in '{}'.",
        executor::describe(&spec),
        spec.working_directory.display()
    );

    let outcome = executor::run_launch_spec(&spec, ctx.launch_timeout())
        .with_context(|| format!(t!("run.error.failed"), title = metadata.display_title()))?;

    commons::print_outcome(&outcome);
    Ok(())
}

/// Fails when a non-optional declared argument has no value.
fn check_required_arguments(metadata: &ScriptMetadata, values: &[String]) -> Result<()> {
    for (slot, argument) in metadata.declared_arguments() {
        let provided = values.get(slot).is_some_and(|value| !value.is_empty());
        if !argument.optional && !provided {
            return Err(anyhow!(
                t!("run.error.missing_argument"),
                position = slot + 1,
                placeholder = argument.placeholder
            ));
        }
    }
    Ok(())
}

fn confirm_run(metadata: &ScriptMetadata) -> Result<bool> {
    let confirmed = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(format!(
            t!("run.prompt.confirm"),
            title = metadata.display_title().yellow()
        ))
        .default(false)
        .interact()?;
    Ok(confirmed)
}
