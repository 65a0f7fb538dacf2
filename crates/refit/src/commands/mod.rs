//! CLI command implementations

pub mod backup;
pub mod check;
pub mod rollback;
pub mod status;
pub mod update;
pub mod watch;

use anyhow::{Context, Result};
use camino::Utf8Path;
use refit_core::RefitConfig;
use refit_update::PluginUpdater;
use tracing::debug;

/// Load configuration and build the production updater
pub(crate) fn open_updater(config_path: Option<&Utf8Path>) -> Result<PluginUpdater> {
    let config = RefitConfig::load(config_path)?;
    debug!("Using configuration {}", config.config_path);
    PluginUpdater::open(config).context("Failed to initialize updater")
}
