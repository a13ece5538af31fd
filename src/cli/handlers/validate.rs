// src/cli/handlers/validate.rs

use anyhow::{Result, anyhow};
use clap::Parser;
use colored::*;
use std::path::PathBuf;

use super::commons;

#[derive(Parser, Debug)]
#[command(no_binary_name = true)]
struct ValidateArgs {
    /// The script or executable to check.
    script: PathBuf,
}

pub fn handle(args: Vec<String>) -> Result<()> {
    let validate_args = ValidateArgs::try_parse_from(&args)?;
    let (manager, _) = commons::load_manager()?;

    let result = manager.validate_script(&validate_args.script);
    for (key, value) in &result.details {
        println!("  {:<14} {}", key.blue(), value);
    }
    commons::print_warnings(&result.warnings);

    if !result.valid {
        for error in &result.errors {
            println!("  {} {}", "x".red().bold(), error);
        }
        return Err(anyhow!(format!(
            t!("validate.error.invalid"),
            path = validate_args.script.display()
        )));
    }

    println!(
        "\n{} {}",
        t!("common.success").green().bold(),
        format_args!(t!("validate.success"), path = validate_args.script.display())
    );
    Ok(())
}
