//! pmrc CLI
//!
//! Inspect and edit the layered configuration of a package manager.

mod cli;
mod commands;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("PMRC_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .try_init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    tracing::debug!("Verbose mode enabled");

    let command = cli.command.unwrap_or(Commands::List {
        json: false,
        long: false,
    });
    execute_command(command, &cli.with)
}

fn execute_command(cmd: Commands, with: &[String]) -> Result<()> {
    let mut resolver = commands::load(with)?;
    match cmd {
        Commands::Get { keys } if keys.is_empty() => commands::run_list(&resolver, false, false),
        Commands::Get { keys } => commands::run_get(&resolver, &keys),
        Commands::Set { pairs, location } => {
            commands::run_set(&mut resolver, &pairs, location.as_deref())
        }
        Commands::Delete { keys, location } => {
            commands::run_delete(&mut resolver, &keys, location.as_deref())
        }
        Commands::List { json, long } => commands::run_list(&resolver, json, long),
        Commands::Edit { location } => commands::run_edit(&mut resolver, location.as_deref()),
        Commands::Validate { json } => commands::run_validate(&mut resolver, json),
        Commands::Fix => commands::run_fix(&mut resolver),
        Commands::Env => commands::run_env(&resolver),
    }
}
