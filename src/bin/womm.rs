// src/bin/womm.rs

use anyhow::{Result, anyhow};
use clap::{CommandFactory, Parser};
use colored::*;
use womm::cli::{Cli, handlers};
use womm::t;

// --- Command Definition and Registry ---

/// A command, its aliases, and the handler that parses and runs it.
struct CommandDefinition {
    name: &'static str,
    aliases: &'static [&'static str],
    handler: fn(Vec<String>) -> Result<()>,
}

static COMMAND_REGISTRY: &[CommandDefinition] = &[
    CommandDefinition {
        name: "backup",
        aliases: &[],
        handler: handlers::backup::handle,
    },
    CommandDefinition {
        name: "info",
        aliases: &["inspect"],
        handler: handlers::info::handle,
    },
    CommandDefinition {
        name: "list",
        aliases: &["ls"],
        handler: handlers::list::handle,
    },
    CommandDefinition {
        name: "register",
        aliases: &["reg", "add"],
        handler: handlers::register::handle,
    },
    CommandDefinition {
        name: "restore",
        aliases: &[],
        handler: handlers::restore::handle,
    },
    CommandDefinition {
        name: "unregister",
        aliases: &["unreg", "remove"],
        handler: handlers::unregister::handle,
    },
    CommandDefinition {
        name: "validate",
        aliases: &["check"],
        handler: handlers::validate::handle,
    },
];

fn find_command(name: &str) -> Option<&'static CommandDefinition> {
    COMMAND_REGISTRY
        .iter()
        .find(|cmd| cmd.name == name || cmd.aliases.contains(&name))
}

/// Sets up logging, dispatches to the handler and prints any error in one place.
fn main() {
    env_logger::init();

    if let Err(e) = run_cli(Cli::parse()) {
        eprintln!("\n{}: {}", "Error".red().bold(), e);
        for cause in e.chain().skip(1) {
            log::debug!("caused by: {}", cause);
        }
        std::process::exit(1);
    }
}

fn run_cli(cli: Cli) -> Result<()> {
    log::debug!("CLI args parsed: {:?}", cli);

    let Some(name) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    match find_command(&name) {
        Some(command) => (command.handler)(cli.args),
        None => Err(anyhow!(format!(t!("error.unknown_command"), name = name))),
    }
}
