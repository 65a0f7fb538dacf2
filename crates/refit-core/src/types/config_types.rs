//! Configuration types for refit.yaml

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default interval between scheduled update checks, in hours
pub const DEFAULT_CHECK_INTERVAL_HOURS: u64 = 24;

/// Default upper bound for a single version-control command, in seconds
pub const DEFAULT_VCS_TIMEOUT_SECS: u64 = 300;

/// Default remote name for version-controlled plugins
pub const DEFAULT_REMOTE: &str = "origin";

/// Default tracking branch for version-controlled plugins
pub const DEFAULT_BRANCH: &str = "master";

/// Root refit.yaml configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefitConfigFile {
    /// Updater settings
    pub updater: UpdaterSettings,

    /// Installed plugins keyed by plugin id
    #[serde(default)]
    pub plugins: BTreeMap<String, PluginConfig>,
}

/// Settings for the updater itself
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdaterSettings {
    /// Hours between scheduled update checks
    #[serde(default = "default_check_interval")]
    pub update_check_interval: u64,

    /// Root directory holding one subdirectory per plugin
    pub plugins_directory: Utf8PathBuf,

    /// Location of the single rollback slot
    pub rollback_directory: Utf8PathBuf,

    /// Where update records are persisted
    #[serde(default)]
    pub state_file: Option<Utf8PathBuf>,

    /// Host-wide operation lock file
    #[serde(default)]
    pub lock_file: Option<Utf8PathBuf>,

    /// Timeout for a single fetch/compare/pull command
    #[serde(default = "default_vcs_timeout")]
    pub vcs_timeout_secs: u64,
}

/// Per-plugin configuration entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Checkout path; defaults to `<plugins_directory>/<id>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Utf8PathBuf>,

    /// Whether the plugin is a git checkout
    #[serde(default)]
    pub git: bool,

    /// Whether the host has the plugin enabled
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Remote to fetch from
    #[serde(default = "default_remote")]
    pub remote: String,

    /// Branch compared against `<remote>/<branch>`
    #[serde(default = "default_branch")]
    pub branch: String,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            path: None,
            git: false,
            enabled: true,
            remote: default_remote(),
            branch: default_branch(),
        }
    }
}

impl PluginConfig {
    /// Path of the plugin's checkout, resolved against the plugins root
    pub fn checkout_path(&self, id: &str, plugins_directory: &Utf8Path) -> Utf8PathBuf {
        match &self.path {
            Some(path) => path.clone(),
            None => plugins_directory.join(id),
        }
    }
}

fn default_check_interval() -> u64 {
    DEFAULT_CHECK_INTERVAL_HOURS
}

fn default_vcs_timeout() -> u64 {
    DEFAULT_VCS_TIMEOUT_SECS
}

fn default_true() -> bool {
    true
}

fn default_remote() -> String {
    DEFAULT_REMOTE.to_string()
}

fn default_branch() -> String {
    DEFAULT_BRANCH.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plugin_defaults() {
        let plugin: PluginConfig = serde_yaml_ng::from_str("git: true").unwrap();
        assert!(plugin.git);
        assert!(plugin.enabled);
        assert_eq!(plugin.remote, "origin");
        assert_eq!(plugin.branch, "master");
        assert!(plugin.path.is_none());
    }

    #[test]
    fn test_checkout_path_defaults_under_root() {
        let plugin = PluginConfig::default();
        let path = plugin.checkout_path("alpha", Utf8Path::new("/opt/plugins"));
        assert_eq!(path, Utf8PathBuf::from("/opt/plugins/alpha"));
    }

    #[test]
    fn test_checkout_path_explicit() {
        let plugin = PluginConfig {
            path: Some(Utf8PathBuf::from("/srv/alpha-src")),
            ..PluginConfig::default()
        };
        let path = plugin.checkout_path("alpha", Utf8Path::new("/opt/plugins"));
        assert_eq!(path, Utf8PathBuf::from("/srv/alpha-src"));
    }

    #[test]
    fn test_custom_branch() {
        let yaml = "git: true\nbranch: main\nremote: upstream\nenabled: false\n";
        let plugin: PluginConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(plugin.branch, "main");
        assert_eq!(plugin.remote, "upstream");
        assert!(!plugin.enabled);
    }
}
