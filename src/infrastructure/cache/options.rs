//! Durable settings store
//!
//! Holds string values only and has no notion of expiry, like a typical
//! application options table. Optionally persisted as a JSON document.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, warn};

use crate::domain::cache::{CacheValue, Store};
use crate::domain::CacheError;

use super::coerce::coerce_to_string;

/// Settings store that coerces every value to a string and ignores ttl
#[derive(Debug, Default)]
pub struct OptionsStore {
    options: RwLock<BTreeMap<String, String>>,
    path: Option<PathBuf>,
}

impl OptionsStore {
    /// Creates a store that lives only in memory
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a store persisted at `path`, loading it if the file exists
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let path = path.into();

        let options = if path.exists() {
            let data = fs::read_to_string(&path).map_err(|e| {
                CacheError::backend(format!("Failed to read {}: {}", path.display(), e))
            })?;
            serde_json::from_str(&data).map_err(|e| {
                CacheError::backend(format!("Failed to parse {}: {}", path.display(), e))
            })?
        } else {
            BTreeMap::new()
        };

        debug!(path = %path.display(), count = options.len(), "Opened options store");

        Ok(Self {
            options: RwLock::new(options),
            path: Some(path),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, String>>, CacheError> {
        self.options
            .read()
            .map_err(|_| CacheError::backend("Options store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<String, String>>, CacheError> {
        self.options
            .write()
            .map_err(|_| CacheError::backend("Options store lock poisoned"))
    }

    /// Writes the whole map through a temporary file and a rename
    fn persist(&self, options: &BTreeMap<String, String>) -> Result<(), CacheError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let data = serde_json::to_string_pretty(options)?;
        let tmp = path.with_extension("tmp");

        fs::write(&tmp, data)
            .and_then(|_| fs::rename(&tmp, path))
            .map_err(|e| CacheError::backend(format!("Failed to write {}: {}", path.display(), e)))
    }

    /// Applies `change` and persists; on a failed write the change is undone
    /// and `false` reported.
    fn mutate<F>(&self, change: F) -> Result<bool, CacheError>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> bool,
    {
        let mut options = self.write()?;
        let snapshot = self.path.as_ref().map(|_| options.clone());

        let changed = change(&mut options);

        if let Err(e) = self.persist(&options) {
            warn!(error = %e, "Failed to persist options store");
            if let Some(snapshot) = snapshot {
                *options = snapshot;
            }
            return Ok(false);
        }

        Ok(changed)
    }
}

impl Store for OptionsStore {
    fn get(&self, key: &str) -> Result<Option<CacheValue>, CacheError> {
        Ok(self.read()?.get(key).cloned().map(CacheValue::String))
    }

    fn set(&self, key: &str, value: CacheValue, _ttl: Option<i64>) -> Result<bool, CacheError> {
        let value = coerce_to_string(&value);

        self.mutate(|options| {
            options.insert(key.to_string(), value);
            true
        })
    }

    fn delete(&self, key: &str) -> Result<bool, CacheError> {
        self.mutate(|options| options.remove(key).is_some())
    }

    fn clear(&self) -> Result<bool, CacheError> {
        self.mutate(|options| {
            options.clear();
            true
        })
    }

    fn has(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.read()?.contains_key(key))
    }

    fn set_multiple(
        &self,
        entries: Vec<(String, CacheValue)>,
        _ttl: Option<i64>,
    ) -> Result<bool, CacheError> {
        self.mutate(|options| {
            for (key, value) in entries {
                options.insert(key, coerce_to_string(&value));
            }
            true
        })
    }

    fn delete_multiple(&self, keys: &[String]) -> Result<bool, CacheError> {
        self.mutate(|options| {
            keys.iter()
                .fold(true, |all, key| options.remove(key).is_some() && all)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_are_coerced_to_strings() {
        let store = OptionsStore::new();

        store.set("int", CacheValue::Int(5), None).unwrap();
        store.set("flag", CacheValue::Bool(true), None).unwrap();
        store.set("off", CacheValue::Bool(false), None).unwrap();

        assert_eq!(store.get("int").unwrap(), Some(CacheValue::from("5")));
        assert_eq!(store.get("flag").unwrap(), Some(CacheValue::from("1")));
        assert_eq!(store.get("off").unwrap(), Some(CacheValue::from("")));
    }

    #[test]
    fn test_ttl_is_ignored() {
        let store = OptionsStore::new();

        store.set("key", CacheValue::from("v"), Some(1)).unwrap();
        assert!(store.has("key").unwrap());
    }

    #[test]
    fn test_delete_and_clear() {
        let store = OptionsStore::new();

        store.set("a", CacheValue::from("1"), None).unwrap();
        store.set("b", CacheValue::from("2"), None).unwrap();

        assert!(store.delete("a").unwrap());
        assert!(!store.delete("a").unwrap());

        store.clear().unwrap();
        assert!(!store.has("b").unwrap());
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.json");

        {
            let store = OptionsStore::open(&path).unwrap();
            store
                .set_multiple(
                    vec![
                        ("a".to_string(), CacheValue::from("x")),
                        ("b".to_string(), CacheValue::Int(2)),
                    ],
                    None,
                )
                .unwrap();
            store.delete("a").unwrap();
        }

        let reopened = OptionsStore::open(&path).unwrap();
        assert_eq!(reopened.get("a").unwrap(), None);
        assert_eq!(reopened.get("b").unwrap(), Some(CacheValue::from("2")));
        assert_eq!(reopened.path(), Some(path.as_path()));
    }

    #[test]
    fn test_corrupt_file_is_a_backend_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.json");
        fs::write(&path, "not json").unwrap();

        let result = OptionsStore::open(&path);
        assert!(matches!(result, Err(CacheError::Backend { .. })));
    }

    #[test]
    fn test_failed_write_is_false_and_rolled_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("options.json");
        let store = OptionsStore::open(&path).unwrap();

        assert!(!store.set("key", CacheValue::from("v"), None).unwrap());
        assert!(!store.has("key").unwrap());
    }
}
