//! Mock implementations for testing
//!
//! Provides in-memory stand-ins for the version-control client and the
//! process restarter so updater logic runs without git or exec.

#![allow(dead_code)]

use async_trait::async_trait;
use refit_update::{Checkout, Error, Restarter, Result, VcsAdapter};
use std::collections::HashMap;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Marker file a successful fake pull writes into the checkout
pub const PULL_MARKER: &str = "PULLED";

#[derive(Debug, Clone, Default)]
struct FakeRepo {
    behind: u64,
    fail_fetch: bool,
    fail_pull: bool,
}

/// Fake VCS keyed by checkout directory name
#[derive(Default)]
pub struct FakeVcs {
    repos: Mutex<HashMap<String, FakeRepo>>,
    pulls: Mutex<Vec<String>>,
}

impl FakeVcs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_behind(self, plugin: &str, count: u64) -> Self {
        self.repo_mut(plugin, |r| r.behind = count);
        self
    }

    pub fn with_fetch_failure(self, plugin: &str) -> Self {
        self.repo_mut(plugin, |r| r.fail_fetch = true);
        self
    }

    pub fn with_pull_failure(self, plugin: &str) -> Self {
        self.repo_mut(plugin, |r| r.fail_pull = true);
        self
    }

    /// Plugins pulled so far, in order
    pub fn pulls(&self) -> Vec<String> {
        self.pulls.lock().unwrap().clone()
    }

    fn repo_mut(&self, plugin: &str, f: impl FnOnce(&mut FakeRepo)) {
        let mut repos = self.repos.lock().unwrap();
        f(repos.entry(plugin.to_string()).or_default());
    }

    fn repo(&self, checkout: &Checkout) -> (String, FakeRepo) {
        let name = checkout.path.file_name().unwrap_or_default().to_string();
        let repo = self
            .repos
            .lock()
            .unwrap()
            .get(&name)
            .cloned()
            .unwrap_or_default();
        (name, repo)
    }
}

#[async_trait]
impl VcsAdapter for FakeVcs {
    async fn fetch_remote(&self, checkout: &Checkout) -> Result<()> {
        let (_, repo) = self.repo(checkout);
        if repo.fail_fetch {
            return Err(Error::vcs_unavailable(
                checkout.path.as_str(),
                "could not resolve host",
            ));
        }
        Ok(())
    }

    async fn commits_behind(&self, checkout: &Checkout) -> Result<u64> {
        let (_, repo) = self.repo(checkout);
        Ok(repo.behind)
    }

    async fn pull(&self, checkout: &Checkout) -> Result<()> {
        let (name, repo) = self.repo(checkout);
        if repo.fail_pull {
            return Err(Error::vcs_conflict(
                checkout.path.as_str(),
                "Not possible to fast-forward, aborting.",
            ));
        }

        fs::write(checkout.path.join(PULL_MARKER), "pulled\n").map_err(Error::Io)?;
        self.repo_mut(&name, |r| r.behind = 0);
        self.pulls.lock().unwrap().push(name);
        Ok(())
    }
}

/// Counts restart requests instead of replacing the process
#[derive(Default)]
pub struct RecordingRestarter {
    restarts: AtomicUsize,
}

impl RecordingRestarter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn restarts(&self) -> usize {
        self.restarts.load(Ordering::SeqCst)
    }
}

/// Refuses every restart request
#[derive(Default)]
pub struct FailingRestarter {
    attempts: AtomicUsize,
}

impl FailingRestarter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Restarter for FailingRestarter {
    fn restart(&self) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(Error::restart("exec failed: permission denied"))
    }
}

impl Restarter for RecordingRestarter {
    fn restart(&self) -> Result<()> {
        self.restarts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
