// src/cli/handlers/restore.rs

use anyhow::Result;
use clap::Parser;
use colored::*;
use std::path::PathBuf;

use super::commons;

#[derive(Parser, Debug)]
#[command(no_binary_name = true)]
struct RestoreArgs {
    /// The backup file to restore.
    path: PathBuf,

    /// Do not ask for confirmation.
    #[arg(long, short)]
    yes: bool,
}

pub fn handle(args: Vec<String>) -> Result<()> {
    let restore_args = RestoreArgs::try_parse_from(&args)?;
    let (manager, _) = commons::load_manager()?;

    println!(
        "\n{}",
        format!(t!("restore.info.header"), path = restore_args.path.display())
            .yellow()
            .bold()
    );
    if !commons::confirm(restore_args.yes)? {
        return Ok(());
    }

    let report = manager.restore_entries(&restore_args.path)?;
    let summary = format!(
        t!("restore.success"),
        restored = report.restored,
        skipped = report.skipped,
        failed = report.failed
    );
    if report.failed > 0 {
        println!("{} {}", t!("common.warning").yellow().bold(), summary);
    } else {
        println!("{} {}", t!("common.success").green().bold(), summary);
    }
    Ok(())
}
