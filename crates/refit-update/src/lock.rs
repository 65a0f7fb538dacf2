//! Host-wide lock serialising check, update and rollback

use camino::{Utf8Path, Utf8PathBuf};
use fs4::fs_std::FileExt;
use std::fs::{self, File, OpenOptions};
use tracing::debug;

use crate::error::{Error, Result};

/// Exclusive advisory lock on a file shared by every Refit process
#[derive(Debug, Clone)]
pub struct OperationLock {
    path: Utf8PathBuf,
}

/// Held for the duration of one operation; unlocks on drop
#[derive(Debug)]
pub struct OperationGuard {
    _file: File,
    path: Utf8PathBuf,
}

impl OperationLock {
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Block until the lock is held
    pub fn acquire(&self) -> Result<OperationGuard> {
        let lock_err = |source| Error::Lock {
            path: self.path.to_string(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_str().is_empty() {
                fs::create_dir_all(parent).map_err(lock_err)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&self.path)
            .map_err(lock_err)?;

        debug!("Waiting for operation lock {}", self.path);
        FileExt::lock_exclusive(&file).map_err(lock_err)?;
        debug!("Acquired operation lock {}", self.path);

        Ok(OperationGuard {
            _file: file,
            path: self.path.clone(),
        })
    }

    /// Wait for the lock on the blocking pool, leaving the async worker free
    pub async fn acquire_async(&self) -> Result<OperationGuard> {
        let lock = self.clone();
        tokio::task::spawn_blocking(move || lock.acquire())
            .await
            .map_err(|e| Error::Lock {
                path: self.path.to_string(),
                source: std::io::Error::other(e),
            })?
    }
}

impl Drop for OperationGuard {
    fn drop(&mut self) {
        debug!("Released operation lock {}", self.path);
    }
}
