//! Plugin update management for Refit
//!
//! Provides:
//! - Per-plugin update state tracking against a remote tracking branch
//! - In-place plugin updates guarded by a single-slot backup
//! - Rollback of the whole plugins directory from that slot
//! - A host-wide operation lock and a periodic check trigger
//!
//! The [`PluginUpdater`] facade wires the pieces together; each component
//! can also be driven on its own (tests use in-memory fakes for the
//! version-control and restart seams).

pub mod backup;
pub mod checker;
pub mod error;
pub mod executor;
pub mod lock;
pub mod restart;
pub mod rollback;
pub mod schedule;
pub mod state;
pub mod updater;
pub mod vcs;

pub use backup::BackupManager;
pub use checker::{CheckReport, PluginFailure, UpdateChecker};
pub use error::{Error, Result};
pub use executor::{BatchReport, SkipReason, SkippedPlugin, UpdateAllOptions, UpdateExecutor};
pub use lock::{OperationGuard, OperationLock};
pub use restart::{ExecRestarter, Restarter, ROLLBACK_FLAG};
pub use rollback::RollbackExecutor;
pub use schedule::{CheckSchedule, CHECK_JOB_ID};
pub use state::{FileStateStore, MemoryStateStore, StateStore};
pub use updater::PluginUpdater;
pub use vcs::{Checkout, GitCli, VcsAdapter};

pub use refit_core::types::{SourceKind, UpdateRecord, UpdateState};
