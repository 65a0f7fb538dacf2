//! Single-slot backup of the plugins directory
//!
//! The slot holds at most one full copy of the plugins root. Callers replace
//! it (clear, then create) before a destructive operation and consume it on
//! rollback.

use camino::{Utf8Path, Utf8PathBuf};
use refit_core::RefitConfig;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Owner of the rollback slot
#[derive(Debug, Clone)]
pub struct BackupManager {
    plugins_dir: Utf8PathBuf,
    backup_dir: Utf8PathBuf,
}

impl BackupManager {
    pub fn new(plugins_dir: impl Into<Utf8PathBuf>, backup_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            plugins_dir: plugins_dir.into(),
            backup_dir: backup_dir.into(),
        }
    }

    pub fn from_config(config: &RefitConfig) -> Self {
        Self::new(config.plugins_directory(), config.rollback_directory())
    }

    pub fn plugins_dir(&self) -> &Utf8Path {
        &self.plugins_dir
    }

    pub fn backup_dir(&self) -> &Utf8Path {
        &self.backup_dir
    }

    /// True iff the slot exists and is a non-empty directory
    pub fn is_available(&self) -> bool {
        fs::read_dir(&self.backup_dir)
            .map(|mut entries| entries.next().is_some())
            .unwrap_or(false)
    }

    /// Copy the whole plugins directory into the slot
    ///
    /// A partially written slot is removed again on failure, so a failed
    /// create never leaves something that looks restorable.
    pub fn create(&self) -> Result<()> {
        info!("Creating backup of plugins directory");

        if !self.plugins_dir.is_dir() {
            return Err(Error::backup_failed(format!(
                "plugins directory {} does not exist",
                self.plugins_dir
            )));
        }

        if self.is_available() {
            warn!(
                "Overwriting existing backup at {} without clearing it first",
                self.backup_dir
            );
        }

        match copy_tree(&self.plugins_dir, &self.backup_dir) {
            Ok(files) => {
                info!("Backup created at {} ({} files)", self.backup_dir, files);
                Ok(())
            }
            Err(e) => {
                error!("Backup to {} failed: {}", self.backup_dir, e);
                if let Err(cleanup) = remove_path(&self.backup_dir) {
                    warn!(
                        "Failed to remove partial backup {}: {}",
                        self.backup_dir, cleanup
                    );
                }
                Err(Error::backup_failed(format!(
                    "copying {} to {}: {}",
                    self.plugins_dir, self.backup_dir, e
                )))
            }
        }
    }

    /// Delete the slot; no-op when it does not exist
    pub fn clear(&self) -> Result<()> {
        if fs::symlink_metadata(&self.backup_dir).is_err() {
            debug!("No backup to clear at {}", self.backup_dir);
            return Ok(());
        }

        info!("Removing existing rollback directory");
        remove_path(&self.backup_dir).map_err(|e| {
            Error::backup_failed(format!("removing {}: {}", self.backup_dir, e))
        })
    }

    /// Clear the slot, then fill it with the current plugins directory
    pub fn replace(&self) -> Result<()> {
        self.clear()?;
        self.create()
    }

    /// Swap the slot in as the plugins directory, consuming it
    ///
    /// The live tree is renamed aside first and only deleted once the backup
    /// is in place; if the backup cannot be moved in, the live tree is put
    /// back. When rename is not possible (slot on another filesystem) the
    /// backup is copied and then removed.
    pub fn restore_into_plugins(&self) -> Result<()> {
        if !self.is_available() {
            return Err(Error::no_backup_available(self.backup_dir.as_str()));
        }

        let aside = self.aside_path();
        let had_live = fs::symlink_metadata(&self.plugins_dir).is_ok();

        if had_live {
            debug!("Moving {} aside to {}", self.plugins_dir, aside);
            fs::rename(&self.plugins_dir, &aside).map_err(|e| {
                Error::backup_failed(format!("moving {} aside: {}", self.plugins_dir, e))
            })?;
        }

        if let Err(rename_err) = fs::rename(&self.backup_dir, &self.plugins_dir) {
            debug!(
                "Rename of {} failed ({}), copying instead",
                self.backup_dir, rename_err
            );

            if let Err(copy_err) = copy_tree(&self.backup_dir, &self.plugins_dir) {
                let aside = had_live.then_some(aside.as_path());
                return Err(self.abandon_restore(aside, copy_err));
            }

            if let Err(e) = remove_path(&self.backup_dir) {
                warn!("Restored backup but failed to remove {}: {}", self.backup_dir, e);
            }
        }

        if had_live {
            if let Err(e) = remove_path(&aside) {
                warn!("Failed to delete previous plugins tree {}: {}", aside, e);
            }
        }

        Ok(())
    }

    /// Drop a partially restored tree and move the live tree back from `aside`
    ///
    /// The returned error names `aside` when the live tree could not be
    /// moved back, since that is where it still is.
    fn abandon_restore(&self, aside: Option<&Utf8Path>, cause: io::Error) -> Error {
        error!("Failed to restore backup: {}", cause);
        let message = format!(
            "restoring {} to {}: {}",
            self.backup_dir, self.plugins_dir, cause
        );

        if let Err(e) = remove_path(&self.plugins_dir) {
            error!(
                "Failed to remove partially restored {}: {}",
                self.plugins_dir, e
            );
        }

        let Some(aside) = aside else {
            return Error::backup_failed(message);
        };

        match fs::rename(aside, &self.plugins_dir) {
            Ok(()) => Error::backup_failed(message),
            Err(e) => {
                error!(
                    "Failed to put plugins directory back from {}: {}",
                    aside, e
                );
                Error::backup_failed(format!(
                    "{}; previous plugins tree left at {} ({})",
                    message, aside, e
                ))
            }
        }
    }

    fn aside_path(&self) -> Utf8PathBuf {
        let name = self.plugins_dir.file_name().unwrap_or("plugins");
        let aside_name = format!(".{}.refit-old-{}", name, Uuid::new_v4().simple());
        match self.plugins_dir.parent() {
            Some(parent) => parent.join(aside_name),
            None => Utf8PathBuf::from(aside_name),
        }
    }
}

/// Recursively copy `source` into `dest`, returning the number of files copied
fn copy_tree(source: &Utf8Path, dest: &Utf8Path) -> io::Result<u64> {
    fs::create_dir_all(dest)?;
    let mut files = 0;

    for entry in WalkDir::new(source).min_depth(1).follow_links(false) {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(source.as_std_path())
            .map_err(io::Error::other)?;
        let target = dest.as_std_path().join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
            files += 1;
        }
    }

    Ok(files)
}

#[cfg(unix)]
fn copy_symlink(source: &Path, dest: &Path) -> io::Result<()> {
    let link = fs::read_link(source)?;
    std::os::unix::fs::symlink(link, dest)
}

#[cfg(not(unix))]
fn copy_symlink(source: &Path, dest: &Path) -> io::Result<()> {
    fs::copy(source, dest).map(|_| ())
}

fn remove_path(path: &Utf8Path) -> io::Result<()> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };

    if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}
