// src/cli/handlers/unregister.rs

use anyhow::Result;
use clap::Parser;
use colored::*;

use super::commons;
use crate::models::ContextType;

#[derive(Parser, Debug)]
#[command(no_binary_name = true)]
struct UnregisterArgs {
    /// The key name of the entry (see `womm list`).
    key_name: String,

    /// Locations to remove the entry from. Defaults to directory and background.
    #[arg(long = "context", value_delimiter = ',')]
    contexts: Vec<ContextType>,

    /// Show what would be removed without touching the registry.
    #[arg(long)]
    dry_run: bool,

    /// Do not ask for confirmation.
    #[arg(long, short)]
    yes: bool,
}

pub fn handle(args: Vec<String>) -> Result<()> {
    let unregister_args = UnregisterArgs::try_parse_from(&args)?;
    let (manager, _) = commons::load_manager()?;

    let unregister = |dry_run: bool| {
        if unregister_args.contexts.is_empty() {
            manager.unregister_script(&unregister_args.key_name, dry_run)
        } else {
            manager.unregister_script_from(
                &unregister_args.key_name,
                &unregister_args.contexts,
                dry_run,
            )
        }
    };

    // Always preview first so the prompt can say what will happen.
    let preview = unregister(true)?;
    println!(
        "\n{}",
        format!(t!("unregister.info.header"), key = preview.key_name)
            .yellow()
            .bold()
    );
    for context in &preview.removed_from {
        println!("  - {}", context.description());
    }

    if unregister_args.dry_run {
        println!("\n{}", t!("common.info.dry_run").cyan());
        return Ok(());
    }
    if !commons::confirm(unregister_args.yes)? {
        return Ok(());
    }

    let report = unregister(false)?;
    println!(
        "\n{} {}",
        t!("common.success").green().bold(),
        format_args!(
            t!("unregister.success"),
            key = report.key_name,
            count = report.removed_from.len()
        )
    );
    commons::print_warnings(&report.warnings);
    Ok(())
}
