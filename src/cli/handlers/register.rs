// src/cli/handlers/register.rs

use anyhow::Result;
use clap::Parser;
use colored::*;
use std::path::PathBuf;

use super::commons;
use crate::core::{
    context_parameters::{ContextFlags, ContextParameters},
    manager::Registration,
};
use crate::models::RegistrationOutcome;

#[derive(Parser, Debug)]
#[command(no_binary_name = true)]
struct RegisterArgs {
    /// The script or executable to register.
    script: PathBuf,

    /// The menu label. Defaults to the file name without its extension.
    #[arg(long, short)]
    label: Option<String>,

    /// `auto`, `none`, a named system icon, or a path to an icon file.
    #[arg(long, short)]
    icon: Option<String>,

    /// Show what would be written without touching the registry.
    #[arg(long)]
    dry_run: bool,

    /// Show the entry when right-clicking a folder.
    #[arg(long)]
    directory: bool,

    /// Show the entry when right-clicking a folder background.
    #[arg(long)]
    background: bool,

    /// Show the entry when right-clicking a single file.
    #[arg(long)]
    file: bool,

    /// Show the entry when right-clicking a multi-item selection.
    #[arg(long)]
    files: bool,

    /// Show the entry when right-clicking a drive.
    #[arg(long)]
    root: bool,

    /// With `--file`: restrict file entries to a family (image, text, code, document, archive, audio, video).
    #[arg(long = "file-type", value_delimiter = ',')]
    file_types: Vec<String>,

    /// With `--file`: restrict file entries to custom extensions (e.g. `.log`).
    #[arg(long = "ext", value_delimiter = ',')]
    extensions: Vec<String>,
}

pub fn handle(args: Vec<String>) -> Result<()> {
    let register_args = RegisterArgs::try_parse_from(&args)?;
    let (manager, _) = commons::load_manager()?;

    let flags = ContextFlags {
        directory: register_args.directory,
        background: register_args.background,
        file: register_args.file,
        files: register_args.files,
        root: register_args.root,
    };
    let params = ContextParameters::from_flags(
        &flags,
        &register_args.file_types,
        &register_args.extensions,
    );

    let label = register_args.label.unwrap_or_else(|| {
        register_args
            .script
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    });

    let mut request = Registration::new(&register_args.script, label)
        .dry_run(register_args.dry_run)
        .params(params);
    if let Some(icon) = register_args.icon {
        request = request.icon(icon);
    }

    let outcome = manager.register_script(&request)?;
    let plan = outcome.plan();

    println!(
        "\n{}",
        format!(t!("register.info.header"), key = plan.key_name)
            .yellow()
            .bold()
    );
    println!("  {:<10} {}", t!("register.label.command").blue(), plan.command);
    match &plan.icon {
        Some(icon) => println!("  {:<10} {}", t!("register.label.icon").blue(), icon),
        None => println!(
            "  {:<10} {}",
            t!("register.label.icon").blue(),
            t!("register.info.no_icon").dimmed()
        ),
    }
    for entry in &plan.entries {
        println!("  - {}", entry.description);
    }
    commons::print_warnings(&plan.warnings);

    match outcome {
        RegistrationOutcome::DryRun(_) => println!("\n{}", t!("common.info.dry_run").cyan()),
        RegistrationOutcome::Registered(ref plan) => println!(
            "\n{} {}",
            t!("common.success").green().bold(),
            format_args!(t!("register.success"), label = plan.label, key = plan.key_name)
        ),
    }
    Ok(())
}
