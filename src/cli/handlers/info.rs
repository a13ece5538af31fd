// src/cli/handlers/info.rs

use anyhow::Result;
use clap::Parser;
use colored::*;
use std::path::PathBuf;

use super::commons;

#[derive(Parser, Debug)]
#[command(
    no_binary_name = true,
    about = "Shows how a script would be invoked from the context menu."
)]
struct InfoArgs {
    /// The script or executable to inspect.
    script: PathBuf,

    /// Print the information as JSON.
    #[arg(long)]
    json: bool,
}

pub fn handle(args: Vec<String>) -> Result<()> {
    let info_args = InfoArgs::try_parse_from(&args)?;
    let (manager, _) = commons::load_manager()?;

    let info = manager.get_script_info(&info_args.script)?;
    if info_args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!(
        "\n--- {} '{}' ---",
        t!("info.header"),
        info.path.display().to_string().yellow()
    );
    println!("  {:<12} {}", t!("info.label.type").blue(), info.script_type);
    println!("  {:<12} {}", t!("info.label.extension").blue(), info.extension);
    println!("  {:<12} {}", t!("info.label.command").blue(), info.command);
    println!(
        "  {:<12} {}",
        t!("info.label.icon").blue(),
        info.default_icon.as_deref().unwrap_or("-")
    );
    println!("  {:<12} {}", t!("info.label.placeholder").blue(), info.placeholder);
    Ok(())
}
