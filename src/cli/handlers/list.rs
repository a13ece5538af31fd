// src/cli/handlers/list.rs

use anyhow::Result;
use clap::Parser;
use colored::*;

use super::commons;
use crate::models::ContextType;

#[derive(Parser, Debug)]
#[command(no_binary_name = true)]
struct ListArgs {
    /// Only list these locations. Defaults to all of them.
    #[arg(long = "context", value_delimiter = ',')]
    contexts: Vec<ContextType>,

    /// Print the listing as JSON.
    #[arg(long)]
    json: bool,
}

pub fn handle(args: Vec<String>) -> Result<()> {
    let list_args = ListArgs::try_parse_from(&args)?;
    let (manager, _) = commons::load_manager()?;

    let contexts = (!list_args.contexts.is_empty()).then_some(list_args.contexts.as_slice());
    let listing = manager.list_entries(contexts);

    if list_args.json {
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    if listing.values().all(Vec::is_empty) {
        println!("{}", t!("list.info.empty").dimmed());
        return Ok(());
    }

    for (context, entries) in &listing {
        if entries.is_empty() {
            continue;
        }
        println!(
            "\n{}",
            format!(t!("list.info.header"), context = context, count = entries.len())
                .yellow()
                .bold()
        );
        for entry in entries {
            println!("  {} {}", entry.key_name.cyan(), entry.display_name);
            if let Some(command) = &entry.command {
                println!("      {}", command.dimmed());
            }
        }
    }
    Ok(())
}
