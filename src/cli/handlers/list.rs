use anyhow::Result;
use clap::Parser;
use colored::Colorize;

use crate::{
    cli::handlers::commons,
    context::AppContext,
    core::presentation,
    models::ScriptMetadata,
};

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true, about = "Lists every discovered script.")]
struct ListArgs {
    /// Also show each script's path, mode and description.
    #[arg(long, short)]
    long: bool,
}

/// Prints the registry, grouped by source directory.
pub fn handle(args: Vec<String>, ctx: &AppContext) -> Result<()> {
    let list_args = ListArgs::try_parse_from(&args)?;

    let count = commons::load_registry(ctx)?;
    if count == 0 {
        println!("\n{}", t!("list.info.empty").yellow());
        return Ok(());
    }

    let directories = ctx.settings().directories;
    let scripts = ctx.registry().snapshot();

    println!("\n{}", format!(t!("list.header"), count = count).bold());

    // The registry is ordered directory by directory, so a header is printed
    // whenever the source root changes.
    let mut current_root = None;
    for metadata in &scripts {
        let root = commons::source_directory(metadata, &directories);
        if root != current_root {
            if let Some(root) = root {
                println!(
                    "\n{} {}",
                    root.display_name().green().bold(),
                    root.full_path.display().to_string().dimmed()
                );
            }
            current_root = root;
        }
        print_item(metadata, list_args.long);
    }

    Ok(())
}

fn print_item(metadata: &ScriptMetadata, long: bool) {
    let view = presentation::list_item_view(metadata);
    let tags: Vec<&str> = view.tags.iter().map(|tag| tag.text).collect();

    println!(
        "  {:<32} {:<20} {}",
        view.title.cyan(),
        view.subtitle,
        format!("[{}]", tags.join(", ")).dimmed()
    );

    if long {
        println!("      {}", metadata.script_file_path.display().to_string().dimmed());
        println!("      {} {}", t!("list.label.mode").dimmed(), metadata.mode.as_str());
        if let Some(description) = &metadata.description {
            println!("      {}", description);
        }
    }
}
