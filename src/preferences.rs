//! Local preference store
//!
//! Small string preferences (the component database filters) survive between
//! runs in an embedded `sled` database. Values are stored JSON-encoded; a
//! missing key or a value that no longer decodes reads as the default.

use crate::config::PreferencesConfig;
use crate::error::{MentorError, Result};
use directories::ProjectDirs;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Component database search term
pub const KEY_DB_SEARCH: &str = "arduino_db_search";
/// Component database type filter
pub const KEY_DB_TYPE: &str = "arduino_db_type";
/// Component database difficulty filter
pub const KEY_DB_DIFFICULTY: &str = "arduino_db_difficulty";

/// Known keys with their defaults
pub const DEFAULTS: [(&str, &str); 3] = [
    (KEY_DB_SEARCH, ""),
    (KEY_DB_TYPE, "All"),
    (KEY_DB_DIFFICULTY, "All"),
];

/// Default value for a known key
pub fn default_for(key: &str) -> Option<&'static str> {
    DEFAULTS
        .iter()
        .find(|(known, _)| *known == key)
        .map(|(_, value)| *value)
}

/// Key-value preference storage
pub trait PreferenceStore: Send + Sync {
    /// Read a value; `None` when missing or undecodable
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value through to the backing store
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove every stored value
    fn clear(&self) -> Result<()>;

    /// All stored key-value pairs, sorted by key
    fn entries(&self) -> Vec<(String, String)>;

    fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }
}

/// Preference store backed by an embedded sled database
pub struct SledPreferenceStore {
    db: sled::Db,
    path: PathBuf,
}

impl SledPreferenceStore {
    /// Open the store in the platform data directory
    pub fn new() -> Result<Self> {
        let proj_dirs = ProjectDirs::from("dev", "arduino-mentor", "arduino-mentor").ok_or_else(
            || MentorError::Preferences("Could not determine data directory".to_string()),
        )?;
        Self::open(proj_dirs.data_dir().join("preferences"))
    }

    /// Open or create a store at the given directory
    ///
    /// # Examples
    ///
    /// ```
    /// use arduino_mentor::preferences::{PreferenceStore, SledPreferenceStore};
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let store = SledPreferenceStore::open(dir.path().join("prefs")).unwrap();
    /// store.set("arduino_db_type", "Sensor").unwrap();
    /// assert_eq!(store.get_or("arduino_db_type", "All"), "Sensor");
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                MentorError::Preferences(format!("Failed to create data directory: {}", e))
            })?;
        }
        let db = sled::open(&path).map_err(|e| {
            MentorError::Preferences(format!("Failed to open preference store: {}", e))
        })?;
        tracing::debug!("Opened preference store at {}", path.display());
        Ok(Self { db, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for SledPreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        let bytes = match self.db.get(key.as_bytes()) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Failed to read preference {}: {}", key, e);
                return None;
            }
        };
        match serde_json::from_slice::<String>(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Ignoring undecodable preference {}: {}", key, e);
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let encoded = serde_json::to_vec(value)?;
        self.db
            .insert(key.as_bytes(), encoded)
            .map_err(|e| MentorError::Preferences(format!("Insert failed: {}", e)))?;
        self.db
            .flush()
            .map_err(|e| MentorError::Preferences(format!("Flush failed: {}", e)))?;
        tracing::debug!("Stored preference {}={:?}", key, value);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.db
            .clear()
            .map_err(|e| MentorError::Preferences(format!("Clear failed: {}", e)))?;
        self.db
            .flush()
            .map_err(|e| MentorError::Preferences(format!("Flush failed: {}", e)))?;
        Ok(())
    }

    fn entries(&self) -> Vec<(String, String)> {
        self.db
            .iter()
            .filter_map(|item| item.ok())
            .filter_map(|(key, value)| {
                let key = String::from_utf8(key.to_vec()).ok()?;
                let value = serde_json::from_slice::<String>(&value).ok()?;
                Some((key, value))
            })
            .collect()
    }
}

/// In-memory preference store for tests and `--no-persist` runs
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .lock()
            .map_err(|_| MentorError::Preferences("Preference lock poisoned".to_string()))?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.values
            .lock()
            .map_err(|_| MentorError::Preferences("Preference lock poisoned".to_string()))?
            .clear();
        Ok(())
    }

    fn entries(&self) -> Vec<(String, String)> {
        self.values
            .lock()
            .map(|values| values.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default()
    }
}

/// Open the store selected by configuration
pub fn open_store(config: &PreferencesConfig) -> Result<Arc<dyn PreferenceStore>> {
    if !config.persist {
        tracing::info!("Preferences kept in memory only");
        return Ok(Arc::new(MemoryPreferenceStore::new()));
    }
    let store = match &config.path {
        Some(path) => SledPreferenceStore::open(path)?,
        None => SledPreferenceStore::new()?,
    };
    Ok(Arc::new(store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_sled_store_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs");
        {
            let store = SledPreferenceStore::open(&path).unwrap();
            store.set(KEY_DB_SEARCH, "servo").unwrap();
        }
        let store = SledPreferenceStore::open(&path).unwrap();
        assert_eq!(store.get_or(KEY_DB_SEARCH, ""), "servo");
    }

    #[test]
    fn test_sled_store_undecodable_value_reads_default() {
        let dir = tempdir().unwrap();
        let store = SledPreferenceStore::open(dir.path().join("prefs")).unwrap();
        store.db.insert(KEY_DB_TYPE.as_bytes(), &b"\xff\xfe"[..]).unwrap();
        assert_eq!(store.get_or(KEY_DB_TYPE, "All"), "All");
        assert!(store.entries().is_empty());
    }

    #[test]
    fn test_sled_store_clear() {
        let dir = tempdir().unwrap();
        let store = SledPreferenceStore::open(dir.path().join("prefs")).unwrap();
        store.set(KEY_DB_DIFFICULTY, "Beginner").unwrap();
        store.clear().unwrap();
        assert_eq!(store.get(KEY_DB_DIFFICULTY), None);
    }

    #[test]
    fn test_memory_store_entries_sorted() {
        let store = MemoryPreferenceStore::new();
        store.set(KEY_DB_TYPE, "Sensor").unwrap();
        store.set(KEY_DB_DIFFICULTY, "All").unwrap();
        let keys: Vec<String> = store.entries().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![KEY_DB_DIFFICULTY, KEY_DB_TYPE]);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(default_for(KEY_DB_SEARCH), Some(""));
        assert_eq!(default_for(KEY_DB_TYPE), Some("All"));
        assert_eq!(default_for("unknown"), None);
    }

    #[test]
    fn test_open_store_without_persistence_is_memory() {
        let config = PreferencesConfig {
            path: None,
            persist: false,
        };
        let store = open_store(&config).unwrap();
        assert_eq!(store.get(KEY_DB_TYPE), None);
    }
}
