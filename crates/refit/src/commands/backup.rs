//! Backup slot commands

use anyhow::Result;
use camino::Utf8Path;
use clap::{Args, Subcommand};
use dialoguer::Confirm;

use crate::output;

#[derive(Subcommand, Debug)]
pub enum BackupCommands {
    /// Show whether a backup is available
    Status,

    /// Delete the backup
    Clear(ClearArgs),
}

#[derive(Args, Debug)]
pub struct ClearArgs {
    /// Skip confirmation
    #[arg(short, long)]
    pub yes: bool,
}

pub fn run(command: BackupCommands, config_path: Option<&Utf8Path>) -> Result<()> {
    match command {
        BackupCommands::Status => status(config_path),
        BackupCommands::Clear(args) => clear(args, config_path),
    }
}

fn status(config_path: Option<&Utf8Path>) -> Result<()> {
    let updater = super::open_updater(config_path)?;
    let backup = updater.backup();

    output::header("Backup");
    output::kv("Plugins", backup.plugins_dir().as_str());
    output::kv("Location", backup.backup_dir().as_str());

    if backup.is_available() {
        output::kv("Available", "yes");
        if let Ok(modified) = std::fs::metadata(backup.backup_dir()).and_then(|m| m.modified()) {
            let taken: chrono::DateTime<chrono::Local> = modified.into();
            output::kv("Taken", &taken.format("%Y-%m-%d %H:%M:%S").to_string());
        }
    } else {
        output::kv("Available", "no");
    }

    Ok(())
}

fn clear(args: ClearArgs, config_path: Option<&Utf8Path>) -> Result<()> {
    let updater = super::open_updater(config_path)?;

    if !updater.backup_available() {
        output::info("No backup to clear");
        return Ok(());
    }

    if !args.yes
        && !Confirm::new()
            .with_prompt("Delete the backup? Rollback will no longer be possible")
            .default(false)
            .interact()?
    {
        output::info("Cancelled");
        return Ok(());
    }

    updater.clear_backup()?;
    output::success("Backup cleared");
    Ok(())
}
