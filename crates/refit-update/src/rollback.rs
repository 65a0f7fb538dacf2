//! Rollback of the plugins directory from the backup slot

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::backup::BackupManager;
use crate::error::{Error, Result};
use crate::restart::Restarter;
use crate::state::StateStore;

/// Restores the plugins directory from the rollback slot
pub struct RollbackExecutor {
    backup: Arc<BackupManager>,
    store: Arc<dyn StateStore>,
    restarter: Arc<dyn Restarter>,
}

impl RollbackExecutor {
    pub fn new(
        backup: Arc<BackupManager>,
        store: Arc<dyn StateStore>,
        restarter: Arc<dyn Restarter>,
    ) -> Self {
        Self {
            backup,
            store,
            restarter,
        }
    }

    /// Swap the backup in as the plugins directory
    ///
    /// Without a backup nothing is touched and no restart happens. After the
    /// swap the slot is gone and every stored state is reset to `Unknown`
    /// until the next check.
    pub fn rollback(&self, reboot: bool) -> Result<()> {
        warn!("Rollback initiated");

        if !self.backup.is_available() {
            error!(
                "Failed to rollback - rollback directory is empty or does not exist: {}",
                self.backup.backup_dir()
            );
            return Err(Error::no_backup_available(self.backup.backup_dir().as_str()));
        }

        self.backup.restore_into_plugins()?;
        info!("Rollback complete");

        if let Err(e) = self.store.invalidate_all() {
            warn!("Failed to mark update states stale after rollback: {}", e);
        }

        if reboot {
            self.restarter.restart()?;
        }

        Ok(())
    }
}
