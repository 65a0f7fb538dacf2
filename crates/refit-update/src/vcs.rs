//! Version-control operations against a plugin checkout
//!
//! [`VcsAdapter`] is the seam between update logic and the VCS client.
//! [`GitCli`] is the production implementation and shells out to `git`.

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use refit_core::types::PluginConfig;
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::error::{Error, Result};

/// A plugin checkout and the remote branch it tracks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkout {
    /// Working tree path
    pub path: Utf8PathBuf,

    /// Remote name (e.g., "origin")
    pub remote: String,

    /// Local branch compared against `<remote>/<branch>`
    pub branch: String,
}

impl Checkout {
    pub fn new(
        path: impl Into<Utf8PathBuf>,
        remote: impl Into<String>,
        branch: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            remote: remote.into(),
            branch: branch.into(),
        }
    }

    /// Build from a plugin's configuration entry
    pub fn for_plugin(id: &str, plugin: &PluginConfig, plugins_directory: &Utf8Path) -> Self {
        Self::new(
            plugin.checkout_path(id, plugins_directory),
            plugin.remote.clone(),
            plugin.branch.clone(),
        )
    }

    /// Remote tracking ref, e.g. `origin/master`
    pub fn tracking_ref(&self) -> String {
        format!("{}/{}", self.remote, self.branch)
    }
}

/// Fetch/compare/pull capability for one checkout at a time
#[async_trait]
pub trait VcsAdapter: Send + Sync {
    /// Update remote-tracking refs without touching the working tree
    async fn fetch_remote(&self, checkout: &Checkout) -> Result<()>;

    /// Number of commits on the remote tracking branch missing locally
    async fn commits_behind(&self, checkout: &Checkout) -> Result<u64>;

    /// Fast-forward the checkout to its remote tracking branch
    ///
    /// Either the fast-forward completes or the working tree is unchanged.
    async fn pull(&self, checkout: &Checkout) -> Result<()>;
}

/// `git` command-line client
pub struct GitCli {
    binary: Option<PathBuf>,
    timeout: Duration,
}

impl GitCli {
    /// Locate `git` on PATH; calls fail with `VcsUnavailable` if it is missing
    pub fn new(timeout: Duration) -> Self {
        let binary = which::which("git").ok();
        if binary.is_none() {
            debug!("git executable not found in PATH");
        }
        Self { binary, timeout }
    }

    /// Use an explicit git executable
    pub fn with_binary(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: Some(binary.into()),
            timeout,
        }
    }

    /// Run git in the checkout, returning trimmed stdout or a failure message
    async fn run(&self, checkout: &Checkout, args: &[&str]) -> std::result::Result<String, String> {
        let git = self
            .binary
            .as_ref()
            .ok_or_else(|| "git executable not found in PATH".to_string())?;

        debug!("git {} (in {})", args.join(" "), checkout.path);

        let mut command = Command::new(git);
        command
            .current_dir(&checkout.path)
            .args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .kill_on_drop(true);

        let output = match timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(format!("failed to run git: {}", e)),
            Err(_) => {
                return Err(format!(
                    "git {} timed out after {}s",
                    args.first().unwrap_or(&""),
                    self.timeout.as_secs()
                ))
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(if stderr.is_empty() {
                format!("git exited with {}", output.status)
            } else {
                stderr
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn current_branch(&self, checkout: &Checkout) -> Result<String> {
        self.run(checkout, &["rev-parse", "--abbrev-ref", "HEAD"])
            .await
            .map_err(|e| Error::vcs_unavailable(checkout.path.as_str(), e))
    }
}

#[async_trait]
impl VcsAdapter for GitCli {
    async fn fetch_remote(&self, checkout: &Checkout) -> Result<()> {
        self.run(checkout, &["fetch", "--quiet", &checkout.remote])
            .await
            .map(|_| ())
            .map_err(|e| Error::vcs_unavailable(checkout.path.as_str(), e))
    }

    async fn commits_behind(&self, checkout: &Checkout) -> Result<u64> {
        let range = format!("{}..{}", checkout.branch, checkout.tracking_ref());
        let stdout = self
            .run(checkout, &["rev-list", "--count", &range])
            .await
            .map_err(|e| Error::vcs_unavailable(checkout.path.as_str(), e))?;

        stdout.parse::<u64>().map_err(|_| {
            Error::vcs_unavailable(
                checkout.path.as_str(),
                format!("unexpected rev-list output: {}", stdout),
            )
        })
    }

    async fn pull(&self, checkout: &Checkout) -> Result<()> {
        self.fetch_remote(checkout).await?;

        let head = self.current_branch(checkout).await?;
        if head != checkout.branch {
            return Err(Error::vcs_conflict(
                checkout.path.as_str(),
                format!(
                    "checked out branch is '{}', expected '{}'",
                    head, checkout.branch
                ),
            ));
        }

        let tracking = checkout.tracking_ref();
        self.run(checkout, &["merge", "--ff-only", "--quiet", &tracking])
            .await
            .map(|_| ())
            .map_err(|e| Error::vcs_conflict(checkout.path.as_str(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracking_ref() {
        let checkout = Checkout::new("/opt/plugins/alpha", "origin", "master");
        assert_eq!(checkout.tracking_ref(), "origin/master");
    }

    #[test]
    fn test_for_plugin_uses_configured_branch() {
        let plugin = PluginConfig {
            git: true,
            branch: "main".to_string(),
            remote: "upstream".to_string(),
            ..PluginConfig::default()
        };
        let checkout = Checkout::for_plugin("alpha", &plugin, Utf8Path::new("/opt/plugins"));
        assert_eq!(checkout.path, Utf8PathBuf::from("/opt/plugins/alpha"));
        assert_eq!(checkout.tracking_ref(), "upstream/main");
    }

    #[tokio::test]
    async fn test_missing_binary_is_unavailable() {
        let git = GitCli {
            binary: None,
            timeout: Duration::from_secs(5),
        };
        let checkout = Checkout::new("/tmp", "origin", "master");
        let err = git.fetch_remote(&checkout).await.unwrap_err();
        assert!(matches!(err, Error::VcsUnavailable { .. }));
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_nonexistent_binary_is_unavailable() {
        let git = GitCli::with_binary("/nonexistent/git", Duration::from_secs(5));
        let checkout = Checkout::new("/tmp", "origin", "master");
        let err = git.commits_behind(&checkout).await.unwrap_err();
        assert!(matches!(err, Error::VcsUnavailable { .. }));
    }
}
