use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use tracing::warn;

use crate::error::Result;

/// Small string settings surviving restarts
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Boolean flag, `default` when unset or unreadable
    fn flag(&self, key: &str, default: bool) -> bool {
        self.get(key)
            .and_then(|value| value.parse().ok())
            .unwrap_or(default)
    }

    fn set_flag(&self, key: &str, value: bool) -> Result<()> {
        self.set(key, &value.to_string())
    }
}

/// Settings written to a JSON object on every change
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                warn!("cannot parse settings {}: {e}", path.display());
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!("cannot read settings {}: {e}", path.display());
                BTreeMap::new()
            }
        };

        Self {
            path,
            values: Mutex::new(values),
        }
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);

        let mut next = values.clone();
        next.insert(key.to_owned(), value.to_owned());
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&next)?)?;
        *values = next;

        Ok(())
    }
}

/// Settings forgotten when the process exits
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Copy some keys of another store, the rest starts empty
    pub fn seeded(from: &dyn KeyValueStore, keys: &[&str]) -> Result<Self> {
        let store = Self::default();
        for key in keys {
            if let Some(value) = from.get(key) {
                store.set(key, &value)?;
            }
        }

        Ok(store)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_survive_reopening() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let store = JsonFileStore::open(&path);
        assert_eq!(store.get("last_day_before_reminder"), None);
        store.set("last_day_before_reminder", "2025-09-09").unwrap();
        store.set_flag("alarm_enabled", false).unwrap();

        let reopened = JsonFileStore::open(&path);
        assert_eq!(
            reopened.get("last_day_before_reminder").as_deref(),
            Some("2025-09-09")
        );
        assert!(!reopened.flag("alarm_enabled", true));
        assert!(reopened.flag("day_before_reminder", true));
    }

    #[test]
    fn unreadable_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "[1, 2").unwrap();

        let store = JsonFileStore::open(&path);
        assert_eq!(store.get("anything"), None);
        store.set("anything", "value").unwrap();
        assert_eq!(JsonFileStore::open(&path).get("anything").as_deref(), Some("value"));
    }

    #[test]
    fn seeded_copies_only_the_given_keys() {
        let source = MemoryStore::default();
        source.set_flag("alarm_enabled", false).unwrap();
        source.set("last_day_before_reminder", "2025-09-09").unwrap();

        let copy = MemoryStore::seeded(&source, &["alarm_enabled", "day_before_reminder"]).unwrap();

        assert!(!copy.flag("alarm_enabled", true));
        assert!(copy.flag("day_before_reminder", true));
        assert_eq!(copy.get("last_day_before_reminder"), None);
        copy.set("alarm_enabled", "true").unwrap();
        assert!(!source.flag("alarm_enabled", true));
    }

    #[test]
    fn flags_default_on_garbage() {
        let store = MemoryStore::default();
        store.set("alarm_enabled", "maybe").unwrap();

        assert!(store.flag("alarm_enabled", true));
        assert!(!store.flag("alarm_enabled", false));
    }
}
