//! Compliance decorator
//!
//! Wraps any [`Store`] and makes it behave like a strict cache: keys are
//! validated, values come back with their original type, and ttls expire
//! against the injected [`Clock`] even when the backend has no notion of
//! expiry. Expired entries are removed lazily, when a read discovers them.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::cache::{
    normalize_ttl, validate_key, CacheValue, Clock, Envelope, KeyArg, Store, SystemClock, Ttl,
};
use crate::domain::CacheError;

/// Strict cache facade over a loosely typed backend
#[derive(Debug)]
pub struct ComplianceCache<S> {
    inner: S,
    clock: Arc<dyn Clock>,
}

impl<S: Store> ComplianceCache<S> {
    pub fn new(inner: S, clock: Arc<dyn Clock>) -> Self {
        Self { inner, clock }
    }

    /// Creates a cache that expires entries against wall-clock time
    pub fn with_system_clock(inner: S) -> Self {
        Self::new(inner, Arc::new(SystemClock))
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Reads a value, `CacheValue::Null` on a miss
    pub fn get<K: KeyArg + ?Sized>(&self, key: &K) -> Result<CacheValue, CacheError> {
        self.get_or(key, CacheValue::Null)
    }

    /// Reads a value, `default` on a miss
    pub fn get_or<K, D>(&self, key: &K, default: D) -> Result<CacheValue, CacheError>
    where
        K: KeyArg + ?Sized,
        D: Into<CacheValue>,
    {
        Ok(self.lookup(key)?.unwrap_or_else(|| default.into()))
    }

    /// Reads a value, `None` on a miss.
    ///
    /// Unlike [`get_or`](Self::get_or), a cached `Null` is distinguishable
    /// from an absent entry here.
    pub fn lookup<K: KeyArg + ?Sized>(&self, key: &K) -> Result<Option<CacheValue>, CacheError> {
        let key = validate_key(key)?;
        let raw = self.inner.get(key)?;

        Ok(self.decode(key, raw))
    }

    /// Writes a value.
    ///
    /// A ttl that resolves to zero or fewer seconds deletes the key instead
    /// and returns the result of that delete.
    pub fn set<K, V>(&self, key: &K, value: V, ttl: Option<Ttl>) -> Result<bool, CacheError>
    where
        K: KeyArg + ?Sized,
        V: Into<CacheValue>,
    {
        let key = validate_key(key)?;
        let ttl = normalize_ttl(ttl, self.clock.as_ref());

        if matches!(ttl, Some(seconds) if seconds <= 0) {
            debug!(key, "Non-positive ttl, deleting instead of writing");
            return self.inner.delete(key);
        }

        let raw = Envelope::new(key, value.into(), self.expires_at(ttl)).encode()?;
        self.inner.set(key, raw, ttl)
    }

    pub fn delete<K: KeyArg + ?Sized>(&self, key: &K) -> Result<bool, CacheError> {
        let key = validate_key(key)?;
        self.inner.delete(key)
    }

    pub fn clear(&self) -> Result<bool, CacheError> {
        self.inner.clear()
    }

    /// Checks for a live entry.
    ///
    /// A negative answer from the backend is final; a positive one is
    /// confirmed by decoding, so expired or foreign entries report absent.
    pub fn has<K: KeyArg + ?Sized>(&self, key: &K) -> Result<bool, CacheError> {
        let key = validate_key(key)?;

        if !self.inner.has(key)? {
            return Ok(false);
        }

        let raw = self.inner.get(key)?;
        Ok(self.decode(key, raw).is_some())
    }

    /// Reads several values. Every requested key appears in the result,
    /// with `default` for misses.
    pub fn get_multiple<I, K, D>(
        &self,
        keys: I,
        default: D,
    ) -> Result<BTreeMap<String, CacheValue>, CacheError>
    where
        I: IntoIterator<Item = K>,
        K: KeyArg,
        D: Into<CacheValue>,
    {
        let keys = validate_keys(keys)?;
        let default = default.into();

        let raw = self.inner.get_multiple(&keys)?;

        let mut results = BTreeMap::new();
        for key in keys {
            let value = self
                .decode(&key, raw.get(&key).cloned().flatten())
                .unwrap_or_else(|| default.clone());
            results.insert(key, value);
        }

        Ok(results)
    }

    /// Writes several values sharing one ttl.
    ///
    /// All keys are validated before anything is written. The batch is not
    /// atomic; the result is true only if every write succeeded.
    pub fn set_multiple<I, K, V>(&self, entries: I, ttl: Option<Ttl>) -> Result<bool, CacheError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: KeyArg,
        V: Into<CacheValue>,
    {
        let entries = entries
            .into_iter()
            .map(|(key, value)| -> Result<(String, CacheValue), CacheError> {
                Ok((validate_key(&key)?.to_string(), value.into()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let ttl = normalize_ttl(ttl, self.clock.as_ref());

        if matches!(ttl, Some(seconds) if seconds <= 0) {
            let keys: Vec<String> = entries.into_iter().map(|(key, _)| key).collect();
            debug!(count = keys.len(), "Non-positive ttl, deleting batch instead of writing");
            return self.inner.delete_multiple(&keys);
        }

        let expires_at = self.expires_at(ttl);
        let encoded = entries
            .into_iter()
            .map(|(key, value)| -> Result<(String, CacheValue), CacheError> {
                let raw = Envelope::new(key.clone(), value, expires_at).encode()?;
                Ok((key, raw))
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(count = encoded.len(), ttl = ?ttl, "Writing cache batch");
        self.inner.set_multiple(encoded, ttl)
    }

    pub fn delete_multiple<I, K>(&self, keys: I) -> Result<bool, CacheError>
    where
        I: IntoIterator<Item = K>,
        K: KeyArg,
    {
        let keys = validate_keys(keys)?;
        self.inner.delete_multiple(&keys)
    }

    /// [`get_multiple`](Self::get_multiple) for a dynamically typed key list
    pub fn get_multiple_value<D: Into<CacheValue>>(
        &self,
        keys: &CacheValue,
        default: D,
    ) -> Result<BTreeMap<String, CacheValue>, CacheError> {
        self.get_multiple(iterable_items(keys, "Cache keys")?, default)
    }

    /// [`set_multiple`](Self::set_multiple) for dynamically typed arguments.
    ///
    /// List positions become integer keys and are rejected as such.
    pub fn set_multiple_value(
        &self,
        values: &CacheValue,
        ttl: &CacheValue,
    ) -> Result<bool, CacheError> {
        let entries: Vec<(CacheValue, CacheValue)> = match values {
            CacheValue::Map(map) => map
                .iter()
                .map(|(key, value)| (CacheValue::String(key.clone()), value.clone()))
                .collect(),
            CacheValue::List(items) => items
                .iter()
                .enumerate()
                .map(|(index, value)| {
                    (
                        CacheValue::Int(i64::try_from(index).unwrap_or(i64::MAX)),
                        value.clone(),
                    )
                })
                .collect(),
            other => return Err(not_iterable("Cache values", other)),
        };
        let ttl = Ttl::from_value(ttl)?;

        self.set_multiple(entries, ttl)
    }

    /// [`delete_multiple`](Self::delete_multiple) for a dynamically typed key list
    pub fn delete_multiple_value(&self, keys: &CacheValue) -> Result<bool, CacheError> {
        self.delete_multiple(iterable_items(keys, "Cache keys")?)
    }

    /// Reads a value and deserializes it into `T`
    pub fn get_as<T, K>(&self, key: &K) -> Result<Option<T>, CacheError>
    where
        T: DeserializeOwned,
        K: KeyArg + ?Sized,
    {
        self.lookup(key)?
            .map(|value| value.deserialize_into())
            .transpose()
    }

    /// Captures a serializable value and writes it
    pub fn set_from<T, K>(&self, key: &K, value: &T, ttl: Option<Ttl>) -> Result<bool, CacheError>
    where
        T: Serialize + ?Sized,
        K: KeyArg + ?Sized,
    {
        let key = validate_key(key)?;
        self.set(key, CacheValue::from_serializable(value)?, ttl)
    }

    fn expires_at(&self, ttl: Option<i64>) -> Option<i64> {
        ttl.map(|seconds| self.clock.timestamp().saturating_add(seconds))
    }

    /// Turns a raw backend value back into the cached value.
    ///
    /// Anything not written by this layer for this exact key is a miss, never
    /// the raw value. Expired entries are deleted before reporting the miss.
    fn decode(&self, key: &str, raw: Option<CacheValue>) -> Option<CacheValue> {
        let raw = raw?;

        let Some(envelope) = Envelope::decode(&raw, key) else {
            debug!(key, raw_type = raw.type_name(), "Ignoring unrecognized cache entry");
            return None;
        };

        if envelope.is_expired(self.clock.timestamp()) {
            debug!(key, expires_at = ?envelope.expires_at, "Evicting expired cache entry");

            if let Err(e) = self.inner.delete(key) {
                warn!(key, error = %e, "Failed to evict expired cache entry");
            }

            return None;
        }

        Some(envelope.value)
    }
}

fn validate_keys<I, K>(keys: I) -> Result<Vec<String>, CacheError>
where
    I: IntoIterator<Item = K>,
    K: KeyArg,
{
    keys.into_iter()
        .map(|key| validate_key(&key).map(str::to_string))
        .collect()
}

fn iterable_items<'a>(
    value: &'a CacheValue,
    what: &str,
) -> Result<Vec<&'a CacheValue>, CacheError> {
    match value {
        CacheValue::List(items) => Ok(items.iter().collect()),
        CacheValue::Map(map) => Ok(map.values().collect()),
        other => Err(not_iterable(what, other)),
    }
}

fn not_iterable(what: &str, value: &CacheValue) -> CacheError {
    CacheError::type_error(format!(
        "{} must be iterable, \"{}\" given",
        what,
        value.type_name()
    ))
}
