//! Update commands

use anyhow::{anyhow, Result};
use camino::Utf8Path;
use refit_update::UpdateAllOptions;

use crate::cli::{UpdateAllArgs, UpdateArgs};
use crate::output;

pub async fn run(args: UpdateArgs, config_path: Option<&Utf8Path>) -> Result<()> {
    let updater = super::open_updater(config_path)?;

    let spinner = output::spinner(&format!("Updating {}...", args.plugin));
    let result = updater.update_plugin(&args.plugin, !args.no_backup).await;
    spinner.finish_and_clear();
    result?;

    output::success(&format!("Updated {}", args.plugin));
    if updater.backup_available() {
        output::info("Run 'refit rollback' to restore the previous plugins directory");
    }
    Ok(())
}

pub async fn run_all(args: UpdateAllArgs, config_path: Option<&Utf8Path>) -> Result<()> {
    let updater = super::open_updater(config_path)?;
    let options = UpdateAllOptions {
        save_backup: !args.no_backup,
        include_disabled: args.include_disabled,
        reboot: args.reboot,
    };

    let spinner = output::spinner("Updating plugins...");
    let report = updater.update_all(options).await;
    spinner.finish_and_clear();
    let report = report?;

    if report.backup_taken {
        output::info(&format!(
            "Backup saved to {}",
            updater.config().rollback_directory()
        ));
    }
    for plugin in &report.updated {
        output::success(&format!("Updated {}", plugin));
    }
    for skipped in &report.skipped {
        output::info(&format!("Skipped {} ({})", skipped.plugin, skipped.reason));
    }
    for failure in &report.failed {
        output::error(&format!("{}: {}", failure.plugin, failure.error));
    }

    if let Some(e) = &report.restart_error {
        output::error(&format!("Restart failed: {}", e));
    }

    if !report.failed.is_empty() {
        return Err(anyhow!("{} plugin(s) failed to update", report.failed.len()));
    }
    match report.restart_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}
