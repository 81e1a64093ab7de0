//! Backend store contract
//!
//! A `Store` is a plain key/value backend. It makes no promise about type
//! fidelity, expiry or key charset; those are layered on top by the
//! compliance decorator.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;

use crate::domain::CacheError;

use super::value::CacheValue;

/// Minimal synchronous key/value backend
pub trait Store: Send + Sync + Debug {
    /// Reads a value, `None` when absent
    fn get(&self, key: &str) -> Result<Option<CacheValue>, CacheError>;

    /// Writes a value. `ttl` is relative seconds; backends may ignore it.
    fn set(&self, key: &str, value: CacheValue, ttl: Option<i64>) -> Result<bool, CacheError>;

    /// Removes a value, returning whether it existed
    fn delete(&self, key: &str) -> Result<bool, CacheError>;

    /// Removes everything this store owns
    fn clear(&self) -> Result<bool, CacheError>;

    /// Checks if a key exists
    fn has(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.get(key)?.is_some())
    }

    /// Reads several values at once
    fn get_multiple(
        &self,
        keys: &[String],
    ) -> Result<BTreeMap<String, Option<CacheValue>>, CacheError> {
        let mut results = BTreeMap::new();

        for key in keys {
            results.insert(key.clone(), self.get(key)?);
        }

        Ok(results)
    }

    /// Writes several values; true only if every write succeeded.
    ///
    /// Not atomic: earlier writes stay in place when a later one fails.
    fn set_multiple(
        &self,
        entries: Vec<(String, CacheValue)>,
        ttl: Option<i64>,
    ) -> Result<bool, CacheError> {
        let mut success = true;

        for (key, value) in entries {
            success &= self.set(&key, value, ttl)?;
        }

        Ok(success)
    }

    /// Removes several values; true only if every delete succeeded
    fn delete_multiple(&self, keys: &[String]) -> Result<bool, CacheError> {
        let mut success = true;

        for key in keys {
            success &= self.delete(key)?;
        }

        Ok(success)
    }
}

macro_rules! forward_store {
    ($wrapper:ident) => {
        impl<S: Store + ?Sized> Store for $wrapper<S> {
            fn get(&self, key: &str) -> Result<Option<CacheValue>, CacheError> {
                (**self).get(key)
            }

            fn set(
                &self,
                key: &str,
                value: CacheValue,
                ttl: Option<i64>,
            ) -> Result<bool, CacheError> {
                (**self).set(key, value, ttl)
            }

            fn delete(&self, key: &str) -> Result<bool, CacheError> {
                (**self).delete(key)
            }

            fn clear(&self) -> Result<bool, CacheError> {
                (**self).clear()
            }

            fn has(&self, key: &str) -> Result<bool, CacheError> {
                (**self).has(key)
            }

            fn get_multiple(
                &self,
                keys: &[String],
            ) -> Result<BTreeMap<String, Option<CacheValue>>, CacheError> {
                (**self).get_multiple(keys)
            }

            fn set_multiple(
                &self,
                entries: Vec<(String, CacheValue)>,
                ttl: Option<i64>,
            ) -> Result<bool, CacheError> {
                (**self).set_multiple(entries, ttl)
            }

            fn delete_multiple(&self, keys: &[String]) -> Result<bool, CacheError> {
                (**self).delete_multiple(keys)
            }
        }
    };
}

forward_store!(Box);
forward_store!(Arc);

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    /// Mock store for testing
    ///
    /// Keeps raw values exactly as written, with the ttl each write carried.
    #[derive(Debug, Default)]
    pub struct MockStore {
        entries: Mutex<HashMap<String, (CacheValue, Option<i64>)>>,
        error: Mutex<Option<String>>,
        reject_writes: Mutex<bool>,
        rejected_keys: Mutex<HashSet<String>>,
        delete_error: Mutex<Option<String>>,
    }

    impl MockStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Seeds a raw value, bypassing any encoding
        pub fn with_raw(self, key: &str, value: impl Into<CacheValue>) -> Self {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), (value.into(), None));
            self
        }

        pub fn with_error(self, error: impl Into<String>) -> Self {
            *self.error.lock().unwrap() = Some(error.into());
            self
        }

        /// Makes every write report failure without storing anything
        pub fn with_rejected_writes(self) -> Self {
            *self.reject_writes.lock().unwrap() = true;
            self
        }

        /// Makes writes to `key` report failure while other writes succeed
        pub fn with_rejected_key(self, key: &str) -> Self {
            self.rejected_keys.lock().unwrap().insert(key.to_string());
            self
        }

        /// Makes every delete fail with a backend error; reads and writes still work
        pub fn with_delete_error(self, error: impl Into<String>) -> Self {
            *self.delete_error.lock().unwrap() = Some(error.into());
            self
        }

        pub fn raw(&self, key: &str) -> Option<CacheValue> {
            self.entries
                .lock()
                .unwrap()
                .get(key)
                .map(|(value, _)| value.clone())
        }

        pub fn ttl_of(&self, key: &str) -> Option<i64> {
            self.entries
                .lock()
                .unwrap()
                .get(key)
                .and_then(|(_, ttl)| *ttl)
        }

        pub fn keys(&self) -> Vec<String> {
            let mut keys: Vec<String> = self.entries.lock().unwrap().keys().cloned().collect();
            keys.sort();
            keys
        }

        fn check_error(&self) -> Result<(), CacheError> {
            if let Some(error) = self.error.lock().unwrap().clone() {
                return Err(CacheError::backend(error));
            }
            Ok(())
        }
    }

    impl Store for MockStore {
        fn get(&self, key: &str) -> Result<Option<CacheValue>, CacheError> {
            self.check_error()?;
            Ok(self.raw(key))
        }

        fn set(&self, key: &str, value: CacheValue, ttl: Option<i64>) -> Result<bool, CacheError> {
            self.check_error()?;

            let rejected = *self.reject_writes.lock().unwrap()
                || self.rejected_keys.lock().unwrap().contains(key);

            if rejected {
                return Ok(false);
            }

            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), (value, ttl));
            Ok(true)
        }

        fn delete(&self, key: &str) -> Result<bool, CacheError> {
            self.check_error()?;

            if let Some(error) = self.delete_error.lock().unwrap().clone() {
                return Err(CacheError::backend(error));
            }

            Ok(self.entries.lock().unwrap().remove(key).is_some())
        }

        fn clear(&self) -> Result<bool, CacheError> {
            self.check_error()?;
            self.entries.lock().unwrap().clear();
            Ok(true)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_mock_store_set_get() {
            let store = MockStore::new();
            assert!(store.set("key1", CacheValue::from("value1"), Some(60)).unwrap());

            assert_eq!(store.get("key1").unwrap(), Some(CacheValue::from("value1")));
            assert_eq!(store.ttl_of("key1"), Some(60));
        }

        #[test]
        fn test_mock_store_with_error() {
            let store = MockStore::new().with_error("Test error");
            assert!(store.get("key").is_err());
        }

        #[test]
        fn test_default_batch_operations() {
            let store = MockStore::new().with_raw("a", 1);

            let results = store
                .get_multiple(&["a".to_string(), "b".to_string()])
                .unwrap();
            assert_eq!(results.get("a"), Some(&Some(CacheValue::Int(1))));
            assert_eq!(results.get("b"), Some(&None));

            let written = store
                .set_multiple(
                    vec![
                        ("b".to_string(), CacheValue::Int(2)),
                        ("c".to_string(), CacheValue::Int(3)),
                    ],
                    None,
                )
                .unwrap();
            assert!(written);
            assert_eq!(store.keys(), vec!["a", "b", "c"]);

            // "z" never existed, so the aggregate is false, but the others go
            let deleted = store
                .delete_multiple(&["a".to_string(), "z".to_string(), "c".to_string()])
                .unwrap();
            assert!(!deleted);
            assert_eq!(store.keys(), vec!["b"]);
        }

        #[test]
        fn test_rejected_key_and_delete_error() {
            let store = MockStore::new()
                .with_rejected_key("bad")
                .with_delete_error("read-only");

            assert!(!store.set("bad", CacheValue::Int(1), None).unwrap());
            assert!(store.set("good", CacheValue::Int(2), None).unwrap());
            assert_eq!(store.keys(), vec!["good"]);
            assert!(store.delete("good").is_err());
        }

        #[test]
        fn test_rejected_writes() {
            let store = MockStore::new().with_rejected_writes();
            assert!(!store.set("key", CacheValue::Null, None).unwrap());
            assert!(store.raw("key").is_none());
        }
    }
}
