//! Rollback command and the `--rollback` startup flag

use anyhow::{anyhow, Result};
use camino::Utf8Path;
use dialoguer::Confirm;

use crate::cli::RollbackArgs;
use crate::output;

pub fn run(args: RollbackArgs, config_path: Option<&Utf8Path>) -> Result<()> {
    let updater = super::open_updater(config_path)?;

    if !updater.backup_available() {
        return Err(anyhow!(
            "No backup available in {}",
            updater.config().rollback_directory()
        ));
    }

    output::warning(&format!(
        "{} will be replaced by the backup",
        updater.config().plugins_directory()
    ));

    if !args.yes
        && !Confirm::new()
            .with_prompt("Proceed with rollback?")
            .default(false)
            .interact()?
    {
        output::info("Rollback cancelled");
        return Ok(());
    }

    updater.rollback(!args.no_reboot)?;
    output::success("Plugins directory restored from backup");
    Ok(())
}

/// Roll back and restart before the requested command runs
///
/// A missing backup is reported and startup continues.
pub fn startup(config_path: Option<&Utf8Path>) -> Result<()> {
    let updater = super::open_updater(config_path)?;

    match updater.rollback(true) {
        Ok(()) => Ok(()),
        Err(e) if e.is_precondition() => {
            output::warning(&format!("Startup rollback skipped: {}", e));
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
