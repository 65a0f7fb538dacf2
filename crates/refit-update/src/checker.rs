//! Scheduled update check
//!
//! Computes a fresh [`UpdateRecord`] for every configured plugin and
//! replaces the stored record set. A plugin that cannot be checked is
//! logged and left out; it never stops the others from being checked.

use refit_core::types::{PluginConfig, UpdateRecord, UpdateState};
use refit_core::RefitConfig;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::state::StateStore;
use crate::vcs::{Checkout, VcsAdapter};

/// A plugin whose check or update failed, and why
#[derive(Debug)]
pub struct PluginFailure {
    pub plugin: String,
    pub error: Error,
}

/// Outcome of one check run
#[derive(Debug, Default)]
pub struct CheckReport {
    /// Records written to the state store
    pub records: Vec<UpdateRecord>,

    /// Plugins that could not be checked
    pub failures: Vec<PluginFailure>,
}

impl CheckReport {
    /// Ids of plugins found behind their remote
    pub fn behind(&self) -> impl Iterator<Item = &str> {
        self.records
            .iter()
            .filter(|r| r.state == UpdateState::Behind)
            .map(|r| r.name.as_str())
    }

    /// True if every plugin was checked
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Classifies every configured plugin as Updated, Behind or Unknown
pub struct UpdateChecker {
    config: Arc<RefitConfig>,
    vcs: Arc<dyn VcsAdapter>,
    store: Arc<dyn StateStore>,
}

impl UpdateChecker {
    pub fn new(
        config: Arc<RefitConfig>,
        vcs: Arc<dyn VcsAdapter>,
        store: Arc<dyn StateStore>,
    ) -> Self {
        Self { config, vcs, store }
    }

    /// Check all plugins and replace the stored record set
    ///
    /// Only a failure to write the state store fails the run.
    pub async fn run(&self) -> Result<CheckReport> {
        info!("Update check initiated");
        let mut report = CheckReport::default();

        for (id, plugin) in self.config.plugins() {
            debug!("Checking {} for updates...", id);

            if !plugin.git {
                info!("{} has no git repo", id);
                report.records.push(UpdateRecord::untracked(id));
                continue;
            }

            match self.check_plugin(id, plugin).await {
                Ok(record) => report.records.push(record),
                Err(error) => {
                    warn!("Failed to check {} for updates: {}", id, error);
                    report.failures.push(PluginFailure {
                        plugin: id.to_string(),
                        error,
                    });
                }
            }
        }

        self.store.replace_all(report.records.clone())?;

        info!(
            "Update check complete: {} checked, {} behind, {} failed",
            report.records.len(),
            report.behind().count(),
            report.failures.len()
        );
        Ok(report)
    }

    async fn check_plugin(&self, id: &str, plugin: &PluginConfig) -> Result<UpdateRecord> {
        debug!("Found git repo: {}", id);
        let checkout = Checkout::for_plugin(id, plugin, self.config.plugins_directory());

        if !checkout.path.is_dir() {
            return Err(Error::plugin_not_found(id, checkout.path.as_str()));
        }

        self.vcs.fetch_remote(&checkout).await?;
        let count = self.vcs.commits_behind(&checkout).await?;

        if count > 0 {
            info!(
                "{} is behind {} by {} commit(s)",
                id,
                checkout.tracking_ref(),
                count
            );
        } else {
            info!("{} is up-to-date", id);
        }

        Ok(UpdateRecord::git(id, count))
    }
}
