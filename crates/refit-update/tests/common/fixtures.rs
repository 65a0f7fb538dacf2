//! Temporary host layout for updater tests

#![allow(dead_code)]

use camino::{Utf8Path, Utf8PathBuf};
use refit_core::types::{PluginConfig, RefitConfigFile, UpdaterSettings};
use refit_core::RefitConfig;
use std::collections::BTreeMap;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use walkdir::WalkDir;

/// A throwaway host: plugins root, rollback slot and state file under one
/// temporary directory
pub struct TestHost {
    temp_dir: TempDir,
    root: Utf8PathBuf,
    rollback_dir: Utf8PathBuf,
    plugins: BTreeMap<String, PluginConfig>,
}

impl TestHost {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = Utf8PathBuf::from_path_buf(temp_dir.path().to_path_buf())
            .expect("temp directory is not UTF-8");
        fs::create_dir_all(root.join("plugins")).expect("Failed to create plugins directory");

        Self {
            temp_dir,
            rollback_dir: root.join("rollback"),
            root,
            plugins: BTreeMap::new(),
        }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn plugins_dir(&self) -> Utf8PathBuf {
        self.root.join("plugins")
    }

    pub fn rollback_dir(&self) -> Utf8PathBuf {
        self.rollback_dir.clone()
    }

    pub fn state_file(&self) -> Utf8PathBuf {
        self.root.join("state").join("update_state.json")
    }

    pub fn lock_file(&self) -> Utf8PathBuf {
        self.root.join("state").join("refit.lock")
    }

    /// Register a git plugin and create its checkout directory
    pub fn with_git_plugin(mut self, id: &str) -> Self {
        self.add_plugin(id, true, true);
        self
    }

    /// Register a git plugin the host has disabled
    pub fn with_disabled_plugin(mut self, id: &str) -> Self {
        self.add_plugin(id, true, false);
        self
    }

    /// Register a plugin that is not a git checkout
    pub fn with_plain_plugin(mut self, id: &str) -> Self {
        self.add_plugin(id, false, true);
        self
    }

    /// Register a git plugin without creating its directory
    pub fn with_missing_plugin(mut self, id: &str) -> Self {
        self.plugins.insert(
            id.to_string(),
            PluginConfig {
                git: true,
                ..Default::default()
            },
        );
        self
    }

    /// Register a git plugin whose checkout lives outside the plugins root
    pub fn with_external_plugin(mut self, id: &str) -> Self {
        let path = self.root.join("elsewhere").join(id);
        fs::create_dir_all(&path).expect("Failed to create external checkout");
        fs::write(path.join("plugin.py"), format!("# {}\n", id)).expect("Failed to write file");

        self.plugins.insert(
            id.to_string(),
            PluginConfig {
                git: true,
                path: Some(path),
                ..Default::default()
            },
        );
        self
    }

    /// Point the rollback slot below a regular file so no backup can be written
    pub fn with_unwritable_rollback_dir(mut self) -> Self {
        let blocker = self.root.join("blocker");
        fs::write(&blocker, "not a directory\n").expect("Failed to write blocker file");
        self.rollback_dir = blocker.join("rollback");
        self
    }

    fn add_plugin(&mut self, id: &str, git: bool, enabled: bool) {
        self.plugins.insert(
            id.to_string(),
            PluginConfig {
                git,
                enabled,
                ..Default::default()
            },
        );
        self.write_file(&format!("{}/plugin.py", id), &format!("# {}\n", id));
    }

    /// Write a file relative to the plugins root
    pub fn write_file(&self, relative: &str, contents: &str) {
        let path = self.plugins_dir().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(path, contents).expect("Failed to write file");
    }

    pub fn config(&self) -> Arc<RefitConfig> {
        let file = RefitConfigFile {
            updater: UpdaterSettings {
                update_check_interval: 24,
                plugins_directory: self.plugins_dir(),
                rollback_directory: self.rollback_dir(),
                state_file: Some(self.state_file()),
                lock_file: Some(self.lock_file()),
                vcs_timeout_secs: 30,
            },
            plugins: self.plugins.clone(),
        };

        Arc::new(
            RefitConfig::from_file(file, self.root.join("refit.yaml"))
                .expect("test configuration is valid"),
        )
    }
}

impl Default for TestHost {
    fn default() -> Self {
        Self::new()
    }
}

/// Relative path -> contents for every file under `root`
pub fn snapshot(root: &Utf8Path) -> BTreeMap<String, Vec<u8>> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let relative = e
                .path()
                .strip_prefix(root)
                .expect("entry is under root")
                .to_string_lossy()
                .into_owned();
            let contents = fs::read(e.path()).expect("Failed to read file");
            (relative, contents)
        })
        .collect()
}
