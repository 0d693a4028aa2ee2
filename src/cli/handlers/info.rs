use anyhow::Result;
use clap::Parser;
use colored::Colorize;

use crate::{
    cli::handlers::commons,
    context::AppContext,
    core::{icons, presentation, refresh},
};

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true, about = "Shows everything known about a script.")]
struct InfoArgs {
    /// The script's title (or part of it) or its path.
    script: String,
}

/// Prints every known field of one script.
pub fn handle(args: Vec<String>, ctx: &AppContext) -> Result<()> {
    let info_args = InfoArgs::try_parse_from(&args)?;
    commons::load_registry(ctx)?;
    let metadata = commons::resolve_script(&info_args.script, ctx)?;

    let row = |label: &str, value: &str| {
        if !value.is_empty() {
            println!("  {:<22} {}", format!("{}:", label).blue(), value);
        }
    };
    let optional = |value: &Option<String>| value.clone().unwrap_or_default();

    println!(
        "\n{}",
        format!(t!("info.header"), title = metadata.display_title().cyan()).bold()
    );
    row("Path", &metadata.script_file_path.display().to_string());
    row("Language", metadata.language_tag().text);
    row("Package", &presentation::subtitle(&metadata));
    row("Mode", metadata.mode.as_str());
    row("Schema Version", &optional(&metadata.schema_version));
    row("Author", &optional(&metadata.author));
    row("Author URL", &optional(&metadata.author_url));
    row("Description", &optional(&metadata.description));
    row(
        "Needs Confirmation",
        if metadata.needs_confirmation { "yes" } else { "" },
    );
    row(
        "Working Directory",
        &crate::core::launcher::resolve_working_directory(&metadata)
            .display()
            .to_string(),
    );

    let icons = icons::resolve_icons(&metadata);
    row("Icon", &icons.light);
    if icons.dark != icons.light {
        row("Icon (dark)", &icons.dark);
    }

    if let Some(raw) = &metadata.refresh_time {
        let interval = match refresh::parse_refresh_time(raw) {
            Some(duration) => format!("{} ({}s)", raw, duration.as_secs()),
            None => format!("{} ({})", raw, t!("info.label.invalid").red()),
        };
        row("Refresh", &interval);
    }

    let declared: Vec<_> = metadata.declared_arguments().collect();
    if !declared.is_empty() {
        println!("\n  {}", t!("info.header.arguments").bold());
        for (slot, argument) in declared {
            let optional_marker = if argument.optional {
                t!("info.label.optional").dimmed().to_string()
            } else {
                String::new()
            };
            println!(
                "    {}. {} {} {}",
                slot + 1,
                argument.placeholder.cyan(),
                format!("<{}>", argument.kind).dimmed(),
                optional_marker
            );
            for option in argument.data.iter().flatten() {
                println!("         - {} = {}", option.title, option.value.dimmed());
            }
        }
    }

    Ok(())
}
