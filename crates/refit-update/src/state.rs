//! Persistence of per-plugin update records

use camino::Utf8PathBuf;
use chrono::Utc;
use fs4::fs_std::FileExt;
use refit_core::types::{UpdateRecord, UpdateState};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::sync::Mutex;
use tracing::debug;

use crate::error::{Error, Result};

/// Store of the last known update state of every plugin
pub trait StateStore: Send + Sync {
    /// Replace the full record set
    fn replace_all(&self, records: Vec<UpdateRecord>) -> Result<()>;

    /// Set one plugin's state, creating its record if absent
    fn upsert(&self, plugin_id: &str, state: UpdateState) -> Result<()>;

    /// All stored records
    fn records(&self) -> Result<Vec<UpdateRecord>>;

    /// State of one plugin, `Unknown` when no record exists
    fn get(&self, plugin_id: &str) -> Result<UpdateState> {
        Ok(self
            .records()?
            .into_iter()
            .find(|r| r.name == plugin_id)
            .map(|r| r.state)
            .unwrap_or_default())
    }

    fn is_behind(&self, plugin_id: &str) -> Result<bool> {
        Ok(self.get(plugin_id)? == UpdateState::Behind)
    }

    fn is_updated(&self, plugin_id: &str) -> Result<bool> {
        Ok(self.get(plugin_id)? == UpdateState::Updated)
    }

    fn is_unknown(&self, plugin_id: &str) -> Result<bool> {
        Ok(self.get(plugin_id)? == UpdateState::Unknown)
    }

    /// Mark every record stale (`Unknown`), keeping its source kind
    fn invalidate_all(&self) -> Result<()> {
        let records = self
            .records()?
            .into_iter()
            .map(|mut r| {
                r.state = UpdateState::Unknown;
                r.commits_behind = None;
                r
            })
            .collect();
        self.replace_all(records)
    }
}

fn apply_upsert(records: &mut Vec<UpdateRecord>, plugin_id: &str, state: UpdateState) {
    let commits_behind = match state {
        UpdateState::Updated => Some(0),
        _ => None,
    };

    match records.iter_mut().find(|r| r.name == plugin_id) {
        Some(record) => {
            record.state = state;
            record.commits_behind = commits_behind;
            record.checked_at = Some(Utc::now());
        }
        None => records.push(UpdateRecord {
            name: plugin_id.to_string(),
            state,
            source: None,
            commits_behind,
            checked_at: Some(Utc::now()),
        }),
    }
}

/// JSON file store guarded by an advisory file lock
///
/// The store is a single JSON array. Writes go to a temp file that is
/// renamed over the store, so readers see either the old or the new set.
pub struct FileStateStore {
    path: Utf8PathBuf,
    lock_path: Utf8PathBuf,
}

impl FileStateStore {
    /// Open (or create) the store at `path`
    pub fn open(path: impl Into<Utf8PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    Error::state_store(format!("Failed to create {}: {}", parent, e))
                })?;
            }
        }

        let store = Self {
            lock_path: Utf8PathBuf::from(format!("{}.lock", path)),
            path,
        };

        // Fail on open rather than on first use if the file is corrupt
        store.with_lock(false, || store.read_unlocked())?;
        debug!("Opened state store at {}", store.path);

        Ok(store)
    }

    /// Close the handle
    pub fn close(self) {
        debug!("Closed state store at {}", self.path);
    }

    fn with_lock<T>(&self, exclusive: bool, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&self.lock_path)
            .map_err(|e| Error::state_store(format!("Failed to open {}: {}", self.lock_path, e)))?;

        let locked = if exclusive {
            FileExt::lock_exclusive(&lock_file)
        } else {
            FileExt::lock_shared(&lock_file)
        };
        locked.map_err(|e| {
            Error::state_store(format!("Failed to lock {}: {}", self.lock_path, e))
        })?;

        // Lock is released when `lock_file` is dropped
        f()
    }

    fn read_unlocked(&self) -> Result<Vec<UpdateRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| Error::state_store(format!("Failed to read {}: {}", self.path, e)))?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&content)
            .map_err(|e| Error::state_store(format!("Corrupt state file {}: {}", self.path, e)))
    }

    fn write_unlocked(&self, records: &[UpdateRecord]) -> Result<()> {
        let temp_path = Utf8PathBuf::from(format!("{}.tmp", self.path));
        let json = serde_json::to_string_pretty(records)
            .map_err(|e| Error::state_store(format!("Failed to serialize records: {}", e)))?;

        let write = || -> std::io::Result<()> {
            let mut file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&temp_path)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
            fs::rename(&temp_path, &self.path)
        };

        write().map_err(|e| Error::state_store(format!("Failed to write {}: {}", self.path, e)))
    }
}

impl StateStore for FileStateStore {
    fn replace_all(&self, records: Vec<UpdateRecord>) -> Result<()> {
        self.with_lock(true, || {
            debug!("Replacing {} update records", records.len());
            self.write_unlocked(&records)
        })
    }

    fn upsert(&self, plugin_id: &str, state: UpdateState) -> Result<()> {
        self.with_lock(true, || {
            let mut records = self.read_unlocked()?;
            apply_upsert(&mut records, plugin_id, state);
            self.write_unlocked(&records)
        })
    }

    fn records(&self) -> Result<Vec<UpdateRecord>> {
        self.with_lock(false, || self.read_unlocked())
    }
}

/// In-memory store, for tests and embedding without persistence
#[derive(Default)]
pub struct MemoryStateStore {
    records: Mutex<Vec<UpdateRecord>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<UpdateRecord>>> {
        self.records
            .lock()
            .map_err(|_| Error::state_store("state store mutex poisoned"))
    }
}

impl StateStore for MemoryStateStore {
    fn replace_all(&self, records: Vec<UpdateRecord>) -> Result<()> {
        *self.lock()? = records;
        Ok(())
    }

    fn upsert(&self, plugin_id: &str, state: UpdateState) -> Result<()> {
        let mut records = self.lock()?;
        apply_upsert(&mut records, plugin_id, state);
        Ok(())
    }

    fn records(&self) -> Result<Vec<UpdateRecord>> {
        Ok(self.lock()?.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use refit_core::types::SourceKind;
    use tempfile::TempDir;

    fn file_store() -> (FileStateStore, TempDir) {
        let temp = TempDir::new().unwrap();
        let path = Utf8PathBuf::from_path_buf(temp.path().join("state/updates.json")).unwrap();
        let store = FileStateStore::open(path).unwrap();
        (store, temp)
    }

    fn stores() -> Vec<(Box<dyn StateStore>, Option<TempDir>)> {
        let (file, temp) = file_store();
        vec![
            (Box::new(file) as Box<dyn StateStore>, Some(temp)),
            (Box::new(MemoryStateStore::new()) as Box<dyn StateStore>, None),
        ]
    }

    #[test]
    fn test_get_missing_is_unknown() {
        for (store, _temp) in stores() {
            assert_eq!(store.get("alpha").unwrap(), UpdateState::Unknown);
            assert!(store.is_unknown("alpha").unwrap());
        }
    }

    #[test]
    fn test_replace_all_discards_previous_records() {
        for (store, _temp) in stores() {
            store
                .replace_all(vec![UpdateRecord::git("alpha", 2), UpdateRecord::git("beta", 0)])
                .unwrap();
            store.replace_all(vec![UpdateRecord::git("beta", 1)]).unwrap();

            let records = store.records().unwrap();
            assert_eq!(records.len(), 1);
            assert_eq!(store.get("alpha").unwrap(), UpdateState::Unknown);
            assert!(store.is_behind("beta").unwrap());
        }
    }

    #[test]
    fn test_upsert_uses_given_state() {
        for (store, _temp) in stores() {
            store.upsert("alpha", UpdateState::Behind).unwrap();
            assert_eq!(store.get("alpha").unwrap(), UpdateState::Behind);

            store.upsert("alpha", UpdateState::Updated).unwrap();
            assert!(store.is_updated("alpha").unwrap());

            store.upsert("alpha", UpdateState::Unknown).unwrap();
            assert!(store.is_unknown("alpha").unwrap());
        }
    }

    #[test]
    fn test_upsert_keeps_source_kind() {
        for (store, _temp) in stores() {
            store.replace_all(vec![UpdateRecord::git("alpha", 3)]).unwrap();
            store.upsert("alpha", UpdateState::Updated).unwrap();

            let records = store.records().unwrap();
            assert_eq!(records.len(), 1);
            assert_eq!(records[0].source, Some(SourceKind::Git));
            assert_eq!(records[0].commits_behind, Some(0));
        }
    }

    #[test]
    fn test_invalidate_all() {
        for (store, _temp) in stores() {
            store
                .replace_all(vec![
                    UpdateRecord::git("alpha", 3),
                    UpdateRecord::untracked("notes"),
                ])
                .unwrap();
            store.invalidate_all().unwrap();

            let records = store.records().unwrap();
            assert_eq!(records.len(), 2);
            assert!(records.iter().all(|r| r.state == UpdateState::Unknown));
            assert_eq!(records[0].source, Some(SourceKind::Git));
        }
    }

    #[test]
    fn test_file_store_persists_across_handles() {
        let temp = TempDir::new().unwrap();
        let path = Utf8PathBuf::from_path_buf(temp.path().join("updates.json")).unwrap();

        let store = FileStateStore::open(path.clone()).unwrap();
        store.replace_all(vec![UpdateRecord::git("alpha", 3)]).unwrap();
        store.close();

        let reopened = FileStateStore::open(path).unwrap();
        assert!(reopened.is_behind("alpha").unwrap());
    }

    #[test]
    fn test_file_store_reads_record_without_state() {
        let temp = TempDir::new().unwrap();
        let path = Utf8PathBuf::from_path_buf(temp.path().join("updates.json")).unwrap();
        fs::write(&path, r#"[{"name": "alpha", "type": "git"}]"#).unwrap();

        let store = FileStateStore::open(path).unwrap();
        assert_eq!(store.get("alpha").unwrap(), UpdateState::Unknown);
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let temp = TempDir::new().unwrap();
        let path = Utf8PathBuf::from_path_buf(temp.path().join("updates.json")).unwrap();
        fs::write(&path, "{not json").unwrap();

        let result = FileStateStore::open(path);
        assert!(matches!(result, Err(Error::StateStore { .. })));
    }
}
