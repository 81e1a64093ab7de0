//! Key-rewriting store decorators
//!
//! A [`KeyTransform`] rewrites keys on the way down; [`TransformedStore`]
//! applies it to every operation and maps batch results back to the keys the
//! caller asked for. Two distinct keys that transform to the same backend key
//! share one slot and the last write wins.

use std::collections::{BTreeMap, HashSet};
use std::fmt::Debug;

use crate::domain::cache::{CacheValue, Store};
use crate::domain::CacheError;

/// Pure key-to-key rewrite
pub trait KeyTransform: Send + Sync + Debug {
    fn transform(&self, key: &str) -> String;
}

/// Store wrapper applying a [`KeyTransform`] to every key
#[derive(Debug)]
pub struct TransformedStore<S, T> {
    inner: S,
    transform: T,
}

impl<S: Store, T: KeyTransform> TransformedStore<S, T> {
    pub(super) fn with_transform(inner: S, transform: T) -> Self {
        Self { inner, transform }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    /// Backend key for a caller key
    pub fn backend_key(&self, key: &str) -> String {
        self.transform.transform(key)
    }

    /// Backend keys for `keys`, in order and without duplicates
    fn backend_keys(&self, keys: &[String]) -> Vec<String> {
        let mut seen = HashSet::with_capacity(keys.len());

        keys.iter()
            .map(|key| self.transform.transform(key))
            .filter(|backend_key| seen.insert(backend_key.clone()))
            .collect()
    }
}

impl<S: Store, T: KeyTransform> Store for TransformedStore<S, T> {
    fn get(&self, key: &str) -> Result<Option<CacheValue>, CacheError> {
        self.inner.get(&self.transform.transform(key))
    }

    fn set(&self, key: &str, value: CacheValue, ttl: Option<i64>) -> Result<bool, CacheError> {
        self.inner.set(&self.transform.transform(key), value, ttl)
    }

    fn delete(&self, key: &str) -> Result<bool, CacheError> {
        self.inner.delete(&self.transform.transform(key))
    }

    fn clear(&self) -> Result<bool, CacheError> {
        self.inner.clear()
    }

    fn has(&self, key: &str) -> Result<bool, CacheError> {
        self.inner.has(&self.transform.transform(key))
    }

    fn get_multiple(
        &self,
        keys: &[String],
    ) -> Result<BTreeMap<String, Option<CacheValue>>, CacheError> {
        let results = self.inner.get_multiple(&self.backend_keys(keys))?;

        // Caller keys sharing a backend key all see that slot
        Ok(keys
            .iter()
            .map(|key| {
                let value = results
                    .get(&self.transform.transform(key))
                    .cloned()
                    .flatten();
                (key.clone(), value)
            })
            .collect())
    }

    fn set_multiple(
        &self,
        entries: Vec<(String, CacheValue)>,
        ttl: Option<i64>,
    ) -> Result<bool, CacheError> {
        let entries = entries
            .into_iter()
            .map(|(key, value)| (self.transform.transform(&key), value))
            .collect();

        self.inner.set_multiple(entries, ttl)
    }

    fn delete_multiple(&self, keys: &[String]) -> Result<bool, CacheError> {
        self.inner.delete_multiple(&self.backend_keys(keys))
    }
}
