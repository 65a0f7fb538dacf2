//! Refit CLI - Plugin updates with backup and rollback
//!
//! This is the main entry point for the Refit command-line interface.

mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI args
    let cli = Cli::parse();

    // Initialize tracing
    init_tracing(cli.verbose, cli.quiet);

    // Startup rollback runs before anything else touches the plugins
    if cli.rollback {
        commands::rollback::startup(cli.config.as_deref())?;
    }

    // Run command
    match cli.command {
        Commands::Check(args) => commands::check::run(args, cli.config.as_deref()).await,
        Commands::Status(args) => commands::status::run(args, cli.config.as_deref()),
        Commands::Update(args) => commands::update::run(args, cli.config.as_deref()).await,
        Commands::UpdateAll(args) => commands::update::run_all(args, cli.config.as_deref()).await,
        Commands::Rollback(args) => commands::rollback::run(args, cli.config.as_deref()),
        Commands::Backup(args) => commands::backup::run(args, cli.config.as_deref()),
        Commands::Watch => commands::watch::run(cli.config.as_deref()).await,
    }
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}
