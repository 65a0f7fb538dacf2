//! Error types for refit-update

use thiserror::Error;

/// Result type alias using refit-update's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Failures of check, update and rollback operations
#[derive(Error, Debug)]
pub enum Error {
    /// Remote could not be reached or the VCS client failed
    #[error("Version control unavailable for {path}: {message}")]
    VcsUnavailable { path: String, message: String },

    /// Local checkout cannot be fast-forwarded to its remote tracking branch
    #[error("Cannot fast-forward {path}: {message}")]
    VcsConflict { path: String, message: String },

    /// Copying, moving or deleting the rollback slot failed
    #[error("Backup failed: {message}")]
    BackupFailed { message: String },

    /// Plugin directory is missing on disk
    #[error("Plugin {plugin} not found in plugin directory: {directory}")]
    PluginNotFound { plugin: String, directory: String },

    /// Update requested for a plugin without version control
    #[error("Plugin {plugin} is not a git repository")]
    NotVersionControlled { plugin: String },

    /// Rollback requested while the slot is empty
    #[error("No rollback available: {path} is empty or does not exist")]
    NoBackupAvailable { path: String },

    /// Reading or writing update records failed
    #[error("State store error: {message}")]
    StateStore { message: String },

    /// Process restart could not be triggered
    #[error("Restart failed: {message}")]
    Restart { message: String },

    /// Host-wide operation lock could not be taken
    #[error("Failed to acquire operation lock {path}: {source}")]
    Lock {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration error
    #[error(transparent)]
    Config(#[from] refit_core::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a VCS unavailable error
    pub fn vcs_unavailable(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::VcsUnavailable {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a VCS conflict error
    pub fn vcs_conflict(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::VcsConflict {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a backup failed error
    pub fn backup_failed(message: impl Into<String>) -> Self {
        Self::BackupFailed {
            message: message.into(),
        }
    }

    /// Create a plugin not found error
    pub fn plugin_not_found(plugin: impl Into<String>, directory: impl Into<String>) -> Self {
        Self::PluginNotFound {
            plugin: plugin.into(),
            directory: directory.into(),
        }
    }

    /// Create a not version controlled error
    pub fn not_version_controlled(plugin: impl Into<String>) -> Self {
        Self::NotVersionControlled {
            plugin: plugin.into(),
        }
    }

    /// Create a no backup available error
    pub fn no_backup_available(path: impl Into<String>) -> Self {
        Self::NoBackupAvailable { path: path.into() }
    }

    /// Create a state store error
    pub fn state_store(message: impl Into<String>) -> Self {
        Self::StateStore {
            message: message.into(),
        }
    }

    /// Create a restart error
    pub fn restart(message: impl Into<String>) -> Self {
        Self::Restart {
            message: message.into(),
        }
    }

    /// True for failures that happen before anything on disk was touched
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Error::PluginNotFound { .. }
                | Error::NotVersionControlled { .. }
                | Error::NoBackupAvailable { .. }
                | Error::Config(refit_core::Error::UnknownPlugin { .. })
        )
    }
}
