// src/cli/handlers/commons.rs

// Shared helpers for the command handlers.

use anyhow::{Context, Result};
use colored::Colorize;
use dialoguer::{Confirm, theme::ColorfulTheme};

use crate::core::{manager::ContextMenuManager, settings::Settings};

/// Loads the user settings and wires a manager to the real registry.
pub fn load_manager() -> Result<(ContextMenuManager, Settings)> {
    let settings = Settings::load().context("Failed to load settings")?;
    let manager = ContextMenuManager::system(&settings)?;
    Ok((manager, settings))
}

/// Asks for confirmation unless `assume_yes` is set.
pub fn confirm(assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    let confirmed = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(t!("common.prompt.continue"))
        .default(false)
        .interact()?;
    if !confirmed {
        println!("\n{}", t!("common.info.operation_cancelled"));
    }
    Ok(confirmed)
}

pub fn print_warnings(warnings: &[String]) {
    for warning in warnings {
        println!("  {} {}", t!("common.warning").yellow().bold(), warning);
    }
}
