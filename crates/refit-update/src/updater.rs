//! Facade wiring checker, executor and rollback to one state store
//!
//! Every mutating operation holds the host-wide [`OperationLock`] so a
//! scheduled check can never interleave with an update or a rollback.

use refit_core::types::{UpdateRecord, UpdateState};
use refit_core::RefitConfig;
use std::sync::Arc;
use tracing::debug;

use crate::backup::BackupManager;
use crate::checker::{CheckReport, UpdateChecker};
use crate::error::Result;
use crate::executor::{BatchReport, UpdateAllOptions, UpdateExecutor};
use crate::lock::{OperationGuard, OperationLock};
use crate::restart::{ExecRestarter, Restarter};
use crate::rollback::RollbackExecutor;
use crate::schedule::CheckSchedule;
use crate::state::{FileStateStore, StateStore};
use crate::vcs::{GitCli, VcsAdapter};

/// Entry point for hosts: check, update, roll back, query
pub struct PluginUpdater {
    config: Arc<RefitConfig>,
    store: Arc<dyn StateStore>,
    backup: Arc<BackupManager>,
    lock: OperationLock,
    checker: UpdateChecker,
    executor: UpdateExecutor,
    rollback: RollbackExecutor,
}

impl PluginUpdater {
    /// Build an updater over explicit collaborators
    pub fn new(
        config: Arc<RefitConfig>,
        store: Arc<dyn StateStore>,
        vcs: Arc<dyn VcsAdapter>,
        restarter: Arc<dyn Restarter>,
    ) -> Result<Self> {
        let lock = OperationLock::new(config.lock_file()?);
        let backup = Arc::new(BackupManager::from_config(&config));

        Ok(Self {
            checker: UpdateChecker::new(config.clone(), vcs.clone(), store.clone()),
            executor: UpdateExecutor::new(
                config.clone(),
                vcs,
                store.clone(),
                backup.clone(),
                restarter.clone(),
            ),
            rollback: RollbackExecutor::new(backup.clone(), store.clone(), restarter),
            config,
            store,
            backup,
            lock,
        })
    }

    /// Build an updater backed by the state file, the `git` CLI and a
    /// re-exec of the current process
    pub fn open(config: RefitConfig) -> Result<Self> {
        let store = FileStateStore::open(config.state_file()?)?;
        let vcs = GitCli::new(config.vcs_timeout());
        let restarter = ExecRestarter::from_current_process()?;

        Self::new(
            Arc::new(config),
            Arc::new(store),
            Arc::new(vcs),
            Arc::new(restarter),
        )
    }

    pub fn config(&self) -> &RefitConfig {
        &self.config
    }

    pub fn backup(&self) -> &BackupManager {
        &self.backup
    }

    pub fn lock(&self) -> &OperationLock {
        &self.lock
    }

    /// Periodic schedule for [`Self::check`] at the configured interval
    pub fn schedule(&self) -> CheckSchedule {
        CheckSchedule::from_config(&self.config)
    }

    fn guard(&self) -> Result<OperationGuard> {
        debug!("Acquiring operation lock {}", self.lock.path());
        self.lock.acquire()
    }

    async fn guard_async(&self) -> Result<OperationGuard> {
        debug!("Acquiring operation lock {}", self.lock.path());
        self.lock.acquire_async().await
    }

    /// Run an update check over every configured plugin
    pub async fn check(&self) -> Result<CheckReport> {
        let _guard = self.guard_async().await?;
        self.checker.run().await
    }

    /// Update one plugin, optionally replacing the backup first
    pub async fn update_plugin(&self, plugin_id: &str, save_backup: bool) -> Result<()> {
        let _guard = self.guard_async().await?;
        self.executor.update_plugin(plugin_id, save_backup).await
    }

    /// Update all enabled plugins under a single backup
    pub async fn update_all(&self, options: UpdateAllOptions) -> Result<BatchReport> {
        let _guard = self.guard_async().await?;
        self.executor.update_all(options).await
    }

    /// Restore the plugins directory from the backup slot
    ///
    /// A restart replaces the process image; the lock file descriptor is
    /// close-on-exec so the restarted process can take the lock again.
    pub fn rollback(&self, reboot: bool) -> Result<()> {
        let _guard = self.guard()?;
        self.rollback.rollback(reboot)
    }

    /// Stored state of one plugin; `Unknown` if never recorded
    pub fn state(&self, plugin_id: &str) -> Result<UpdateState> {
        self.store.get(plugin_id)
    }

    /// Every stored record
    pub fn records(&self) -> Result<Vec<UpdateRecord>> {
        self.store.records()
    }

    pub fn is_behind(&self, plugin_id: &str) -> Result<bool> {
        self.store.is_behind(plugin_id)
    }

    pub fn is_updated(&self, plugin_id: &str) -> Result<bool> {
        self.store.is_updated(plugin_id)
    }

    pub fn is_unknown(&self, plugin_id: &str) -> Result<bool> {
        self.store.is_unknown(plugin_id)
    }

    pub fn backup_available(&self) -> bool {
        self.backup.is_available()
    }

    /// Drop the backup slot
    pub fn clear_backup(&self) -> Result<()> {
        let _guard = self.guard()?;
        self.backup.clear()
    }
}
