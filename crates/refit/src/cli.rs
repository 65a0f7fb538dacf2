//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

pub use crate::commands::backup::BackupCommands;

/// Refit - Keep host plugins current, with rollback
#[derive(Parser, Debug)]
#[command(name = "refit")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to refit.yaml config file
    #[arg(short, long, global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Restore the plugins directory from the backup and restart before
    /// running the command
    #[arg(long, global = true)]
    pub rollback: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check every plugin against its remote
    Check(CheckArgs),

    /// Show the stored update state of every plugin
    Status(StatusArgs),

    /// Update one plugin
    Update(UpdateArgs),

    /// Update all enabled plugins
    UpdateAll(UpdateAllArgs),

    /// Restore the plugins directory from the backup
    Rollback(RollbackArgs),

    /// Inspect or clear the backup
    #[command(subcommand)]
    Backup(BackupCommands),

    /// Run checks on the configured interval until interrupted
    Watch,
}

// Check command
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// Status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// Update command
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Plugin id
    pub plugin: String,

    /// Skip replacing the backup before pulling
    #[arg(long)]
    pub no_backup: bool,
}

// Update-all command
#[derive(Args, Debug)]
pub struct UpdateAllArgs {
    /// Skip the backup before the batch
    #[arg(long)]
    pub no_backup: bool,

    /// Also update disabled plugins
    #[arg(long)]
    pub include_disabled: bool,

    /// Restart once every plugin was processed
    #[arg(long)]
    pub reboot: bool,
}

// Rollback command
#[derive(Args, Debug)]
pub struct RollbackArgs {
    /// Do not restart after the rollback
    #[arg(long)]
    pub no_reboot: bool,

    /// Skip confirmation
    #[arg(short, long)]
    pub yes: bool,
}
