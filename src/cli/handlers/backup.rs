// src/cli/handlers/backup.rs

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::path::PathBuf;

use super::commons;
use crate::core::{backup_store, paths};
use crate::models::ContextType;

#[derive(Parser, Debug)]
#[command(no_binary_name = true)]
struct BackupArgs {
    /// Where to write the backup. Defaults to a timestamped file in the backup directory.
    path: Option<PathBuf>,

    /// Only back up these locations. Defaults to all of them.
    #[arg(long = "context", value_delimiter = ',')]
    contexts: Vec<ContextType>,
}

pub fn handle(args: Vec<String>) -> Result<()> {
    let backup_args = BackupArgs::try_parse_from(&args)?;
    let (manager, settings) = commons::load_manager()?;

    let path = match backup_args.path {
        Some(path) => path,
        None => {
            let dir = settings.backup_dir()?;
            paths::ensure_dir(&dir).context("Failed to prepare the backup directory")?;
            dir.join(backup_store::default_backup_filename())
        }
    };

    let contexts = (!backup_args.contexts.is_empty()).then_some(backup_args.contexts.as_slice());
    let snapshot = manager.backup_entries_for(&path, contexts)?;

    println!(
        "{} {}",
        t!("common.success").green().bold(),
        format_args!(
            t!("backup.success"),
            count = snapshot.metadata.total_entries,
            path = path.display()
        )
    );
    Ok(())
}
