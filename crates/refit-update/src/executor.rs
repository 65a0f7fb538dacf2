//! Plugin updates: backup, pull, record
//!
//! A single update runs its preconditions first (configured, version
//! controlled, present on disk), then takes the backup, then pulls. Nothing
//! destructive happens before every precondition has passed.

use refit_core::types::UpdateState;
use refit_core::RefitConfig;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::backup::BackupManager;
use crate::checker::PluginFailure;
use crate::error::{Error, Result};
use crate::restart::Restarter;
use crate::state::StateStore;
use crate::vcs::{Checkout, VcsAdapter};

/// Options for [`UpdateExecutor::update_all`]
#[derive(Debug, Clone, Copy)]
pub struct UpdateAllOptions {
    /// Take one backup of the plugins directory before updating
    pub save_backup: bool,

    /// Also update plugins the host has disabled
    pub include_disabled: bool,

    /// Restart the process once every plugin was processed
    pub reboot: bool,
}

impl Default for UpdateAllOptions {
    fn default() -> Self {
        Self {
            save_backup: true,
            include_disabled: false,
            reboot: false,
        }
    }
}

/// Why a plugin was passed over in a batch update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Disabled,
    NotVersionControlled,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Disabled => write!(f, "disabled"),
            SkipReason::NotVersionControlled => write!(f, "not a git repository"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPlugin {
    pub plugin: String,
    pub reason: SkipReason,
}

/// Outcome of a batch update
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Whether a backup was taken before the batch
    pub backup_taken: bool,

    pub updated: Vec<String>,
    pub skipped: Vec<SkippedPlugin>,
    pub failed: Vec<PluginFailure>,

    /// Set when a restart was requested and could not be triggered
    pub restart_error: Option<Error>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.restart_error.is_none()
    }
}

/// Performs plugin updates
pub struct UpdateExecutor {
    config: Arc<RefitConfig>,
    vcs: Arc<dyn VcsAdapter>,
    store: Arc<dyn StateStore>,
    backup: Arc<BackupManager>,
    restarter: Arc<dyn Restarter>,
}

impl UpdateExecutor {
    pub fn new(
        config: Arc<RefitConfig>,
        vcs: Arc<dyn VcsAdapter>,
        store: Arc<dyn StateStore>,
        backup: Arc<BackupManager>,
        restarter: Arc<dyn Restarter>,
    ) -> Self {
        Self {
            config,
            vcs,
            store,
            backup,
            restarter,
        }
    }

    /// Update one plugin to the head of its remote tracking branch
    ///
    /// With `save_backup` the rollback slot is replaced first; a backup
    /// failure aborts before the pull. If the pull fails the stored state
    /// is left alone and any backup taken stays available.
    pub async fn update_plugin(&self, plugin_id: &str, save_backup: bool) -> Result<()> {
        info!("Updating plugin: {}", plugin_id);
        let plugin = self.config.plugin(plugin_id)?;

        if !plugin.git {
            warn!("Can not update plugin {}: not a git repo", plugin_id);
            return Err(Error::not_version_controlled(plugin_id));
        }

        // The backup only covers the plugins root, so the plugin must live there
        if !self.config.plugin_directory(plugin_id).is_dir() {
            error!(
                "Plugin {} not found in plugin directory: {}",
                plugin_id,
                self.config.plugins_directory()
            );
            return Err(Error::plugin_not_found(
                plugin_id,
                self.config.plugins_directory().as_str(),
            ));
        }

        if save_backup {
            self.backup.replace()?;
        }

        let checkout = Checkout::for_plugin(plugin_id, plugin, self.config.plugins_directory());
        if let Err(e) = self.vcs.pull(&checkout).await {
            error!("Failed to pull {}: {}", plugin_id, e);
            if self.backup.is_available() {
                info!("Backup remains available for rollback");
            }
            return Err(e);
        }

        self.store.upsert(plugin_id, UpdateState::Updated)?;
        info!("Plugin updated: {}", plugin_id);
        Ok(())
    }

    /// Update every enabled plugin (and disabled ones if asked)
    ///
    /// At most one backup is taken, before the first plugin; if it fails
    /// nothing is pulled. Per-plugin failures are collected and do not stop
    /// the batch. A failed restart is reported in the returned report.
    pub async fn update_all(&self, options: UpdateAllOptions) -> Result<BatchReport> {
        info!("Updating all plugins");
        let mut report = BatchReport::default();

        if options.save_backup {
            self.backup.replace()?;
            report.backup_taken = true;
        }

        for (id, _) in self.config.plugins() {
            if !options.include_disabled && !self.config.plugin_enabled(id) {
                info!("Skipping disabled plugin: {}", id);
                report.skipped.push(SkippedPlugin {
                    plugin: id.to_string(),
                    reason: SkipReason::Disabled,
                });
                continue;
            }

            match self.update_plugin(id, false).await {
                Ok(()) => report.updated.push(id.to_string()),
                Err(Error::NotVersionControlled { .. }) => {
                    report.skipped.push(SkippedPlugin {
                        plugin: id.to_string(),
                        reason: SkipReason::NotVersionControlled,
                    });
                }
                Err(error) => {
                    warn!("Update of {} failed, continuing: {}", id, error);
                    report.failed.push(PluginFailure {
                        plugin: id.to_string(),
                        error,
                    });
                }
            }
        }

        info!(
            "All plugins processed: {} updated, {} skipped, {} failed",
            report.updated.len(),
            report.skipped.len(),
            report.failed.len()
        );

        if options.reboot {
            if let Err(e) = self.restarter.restart() {
                error!("Restart after update failed: {}", e);
                report.restart_error = Some(e);
            }
        }

        Ok(report)
    }
}
