//! Configuration file loading and parsing

use crate::error::{Error, Result};
use crate::types::{PluginConfig, RefitConfigFile};
use crate::utils::get_data_dir;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::time::Duration;
use tracing::debug;

/// Configuration file names to search for
const CONFIG_FILE_NAMES: &[&str] = &["refit.yaml", "refit.yml"];

/// Environment variable pointing at an explicit configuration file
pub const CONFIG_ENV_VAR: &str = "REFIT_CONFIG";

const SECS_PER_HOUR: u64 = 60 * 60;

/// Default state file name inside the data directory
const STATE_FILE_NAME: &str = "update_state.json";

/// Loaded and validated Refit configuration
#[derive(Debug, Clone)]
pub struct RefitConfig {
    /// The parsed configuration
    pub config: RefitConfigFile,

    /// Path to the configuration file
    pub config_path: Utf8PathBuf,
}

impl RefitConfig {
    /// Load configuration from the given path, `$REFIT_CONFIG`, or by searching
    /// the current directory and its parents
    pub fn load(path: Option<&Utf8Path>) -> Result<Self> {
        let (config_path, content) = match path {
            Some(p) => (p.to_owned(), read_config(p)?),
            None => match std::env::var(CONFIG_ENV_VAR) {
                Ok(env_path) if !env_path.is_empty() => {
                    let p = Utf8PathBuf::from(env_path);
                    let content = read_config(&p)?;
                    (p, content)
                }
                _ => Self::find_config()?,
            },
        };

        debug!("Loading configuration from {}", config_path);
        Self::from_yaml(&content, config_path)
    }

    /// Parse and validate configuration from a YAML string
    pub fn from_yaml(content: &str, config_path: Utf8PathBuf) -> Result<Self> {
        let config: RefitConfigFile = serde_yaml_ng::from_str(content)?;
        let loaded = Self {
            config,
            config_path,
        };
        loaded.validate()?;
        Ok(loaded)
    }

    /// Build from an already parsed file, validating it
    pub fn from_file(config: RefitConfigFile, config_path: Utf8PathBuf) -> Result<Self> {
        let loaded = Self {
            config,
            config_path,
        };
        loaded.validate()?;
        Ok(loaded)
    }

    /// Find configuration file in current directory or parent directories
    fn find_config() -> Result<(Utf8PathBuf, String)> {
        let cwd = std::env::current_dir().map_err(Error::Io)?;
        let cwd = Utf8PathBuf::try_from(cwd)
            .map_err(|_| Error::invalid_config("Current directory path is not valid UTF-8"))?;

        let mut current = cwd.as_path();

        loop {
            for name in CONFIG_FILE_NAMES {
                let path = current.join(name);
                if path.exists() {
                    let content = fs::read_to_string(&path)?;
                    return Ok((path, content));
                }
            }

            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }

        Err(Error::config_not_found(
            "refit.yaml (searched current and parent directories)",
        ))
    }

    fn validate(&self) -> Result<()> {
        let updater = &self.config.updater;

        if updater.update_check_interval == 0 {
            return Err(Error::invalid_config(
                "updater.update_check_interval must be at least 1 hour",
            ));
        }

        if updater.update_check_interval.checked_mul(SECS_PER_HOUR).is_none() {
            return Err(Error::invalid_config(format!(
                "updater.update_check_interval of {} hours is too large",
                updater.update_check_interval
            )));
        }

        if updater.vcs_timeout_secs == 0 {
            return Err(Error::invalid_config(
                "updater.vcs_timeout_secs must be greater than zero",
            ));
        }

        let plugins = &updater.plugins_directory;
        let rollback = &updater.rollback_directory;
        if plugins.starts_with(rollback) || rollback.starts_with(plugins) {
            return Err(Error::invalid_config(format!(
                "rollback_directory ({}) and plugins_directory ({}) must not overlap",
                rollback, plugins
            )));
        }

        for id in self.config.plugins.keys() {
            if id.is_empty() || id.contains(['/', '\\']) || id == "." || id == ".." {
                return Err(Error::invalid_config(format!(
                    "Invalid plugin id '{}': must be a single directory name",
                    id
                )));
            }
        }

        Ok(())
    }

    /// Root directory holding the plugin checkouts
    pub fn plugins_directory(&self) -> &Utf8Path {
        &self.config.updater.plugins_directory
    }

    /// Location of the rollback slot
    pub fn rollback_directory(&self) -> &Utf8Path {
        &self.config.updater.rollback_directory
    }

    /// Interval between scheduled update checks
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(
            self.config
                .updater
                .update_check_interval
                .saturating_mul(SECS_PER_HOUR),
        )
    }

    /// Upper bound for a single version-control command
    pub fn vcs_timeout(&self) -> Duration {
        Duration::from_secs(self.config.updater.vcs_timeout_secs)
    }

    /// Path of the persisted update records
    pub fn state_file(&self) -> Result<Utf8PathBuf> {
        if let Some(path) = &self.config.updater.state_file {
            return Ok(path.clone());
        }

        let data_dir = get_data_dir().map_err(|e| Error::invalid_config(e.to_string()))?;
        Ok(data_dir.join(STATE_FILE_NAME))
    }

    /// Path of the host-wide operation lock
    pub fn lock_file(&self) -> Result<Utf8PathBuf> {
        if let Some(path) = &self.config.updater.lock_file {
            return Ok(path.clone());
        }

        Ok(self.state_file()?.with_extension("lock"))
    }

    /// Configured plugins in id order
    pub fn plugins(&self) -> impl Iterator<Item = (&str, &PluginConfig)> {
        self.config
            .plugins
            .iter()
            .map(|(id, plugin)| (id.as_str(), plugin))
    }

    /// Look up a single plugin
    pub fn plugin(&self, id: &str) -> Result<&PluginConfig> {
        self.config
            .plugins
            .get(id)
            .ok_or_else(|| Error::unknown_plugin(id))
    }

    /// Whether the host has the plugin enabled (unknown plugins are not)
    pub fn plugin_enabled(&self, id: &str) -> bool {
        self.config
            .plugins
            .get(id)
            .map(|p| p.enabled)
            .unwrap_or(false)
    }

    /// Directory the plugin must occupy under the plugins root
    pub fn plugin_directory(&self, id: &str) -> Utf8PathBuf {
        self.plugins_directory().join(id)
    }
}

fn read_config(path: &Utf8Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::config_not_found(path.as_str())
        } else {
            Error::Io(e)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
updater:
  update_check_interval: 6
  plugins_directory: /opt/host/plugins
  rollback_directory: /opt/host/rollback
  state_file: /var/lib/refit/state.json
plugins:
  alpha:
    git: true
  beta:
    git: true
    enabled: false
    branch: main
  notes: {}
"#;

    fn sample() -> RefitConfig {
        RefitConfig::from_yaml(SAMPLE, Utf8PathBuf::from("refit.yaml")).unwrap()
    }

    #[test]
    fn test_parse_sample() {
        let config = sample();
        assert_eq!(config.plugins().count(), 3);
        assert_eq!(config.check_interval(), Duration::from_secs(6 * 3600));
        assert_eq!(config.vcs_timeout(), Duration::from_secs(300));
        assert!(config.plugin_enabled("alpha"));
        assert!(!config.plugin_enabled("beta"));
        assert!(!config.plugin_enabled("missing"));
        assert_eq!(config.plugin("beta").unwrap().branch, "main");
        assert!(!config.plugin("notes").unwrap().git);
    }

    #[test]
    fn test_plugins_iterate_sorted() {
        let config = sample();
        let ids: Vec<&str> = config.plugins().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["alpha", "beta", "notes"]);
    }

    #[test]
    fn test_lock_file_defaults_next_to_state() {
        let config = sample();
        assert_eq!(
            config.lock_file().unwrap(),
            Utf8PathBuf::from("/var/lib/refit/state.lock")
        );
    }

    #[test]
    fn test_unknown_plugin() {
        let config = sample();
        let err = config.plugin("gamma").unwrap_err();
        assert!(matches!(err, Error::UnknownPlugin { .. }));
    }

    #[test]
    fn test_rejects_zero_interval() {
        let yaml = SAMPLE.replace("update_check_interval: 6", "update_check_interval: 0");
        let err = RefitConfig::from_yaml(&yaml, Utf8PathBuf::from("refit.yaml")).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }

    #[test]
    fn test_rejects_interval_overflowing_seconds() {
        let yaml = SAMPLE.replace(
            "update_check_interval: 6",
            "update_check_interval: 18446744073709551615",
        );
        let err = RefitConfig::from_yaml(&yaml, Utf8PathBuf::from("refit.yaml")).unwrap_err();
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn test_rejects_nested_rollback_directory() {
        let yaml = SAMPLE.replace("/opt/host/rollback", "/opt/host/plugins/.rollback");
        let err = RefitConfig::from_yaml(&yaml, Utf8PathBuf::from("refit.yaml")).unwrap_err();
        assert!(err.to_string().contains("must not overlap"));
    }

    #[test]
    fn test_rejects_path_like_plugin_id() {
        let yaml = format!("{}  ../evil:\n    git: true\n", SAMPLE);
        let err = RefitConfig::from_yaml(&yaml, Utf8PathBuf::from("refit.yaml")).unwrap_err();
        assert!(err.to_string().contains("Invalid plugin id"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = RefitConfig::load(Some(Utf8Path::new("/nonexistent/refit.yaml"))).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound { .. }));
    }

    #[test]
    #[serial]
    fn test_load_from_env_var() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("custom.yaml");
        fs::write(&path, SAMPLE).unwrap();

        std::env::set_var(CONFIG_ENV_VAR, path.to_str().unwrap());
        let loaded = RefitConfig::load(None);
        std::env::remove_var(CONFIG_ENV_VAR);

        let loaded = loaded.unwrap();
        assert_eq!(loaded.config_path.as_str(), path.to_str().unwrap());
        assert_eq!(loaded.plugins().count(), 3);
    }
}
