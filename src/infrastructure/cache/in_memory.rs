//! Ephemeral object cache using moka

use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache as MokaCache;

use crate::domain::cache::{CacheValue, Clock, Store, SystemClock};
use crate::domain::CacheError;

/// Configuration for the ephemeral store
#[derive(Debug, Clone)]
pub struct EphemeralStoreConfig {
    /// Maximum number of entries
    pub max_capacity: u64,
    /// Time to idle - entries not accessed for this duration are evicted
    pub time_to_idle: Option<Duration>,
    /// Group namespacing this view of the cache
    pub group: Option<String>,
}

impl Default for EphemeralStoreConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            time_to_idle: None,
            group: None,
        }
    }
}

impl EphemeralStoreConfig {
    /// Sets the maximum capacity
    pub fn with_max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = capacity;
        self
    }

    /// Sets the time-to-idle duration
    pub fn with_time_to_idle(mut self, tti: Duration) -> Self {
        self.time_to_idle = Some(tti);
        self
    }

    /// Sets the group
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }
}

/// Entry stored in moka
#[derive(Debug, Clone)]
struct Entry {
    value: CacheValue,
    /// Expiration timestamp (seconds since epoch)
    expires_at: Option<i64>,
}

/// Process-wide in-memory object cache
///
/// Keeps values as given and honours the relative ttl it is handed, measured
/// on its own clock. Clones and [`with_group`](Self::with_group) views share
/// the same underlying moka cache.
#[derive(Debug, Clone)]
pub struct EphemeralStore {
    cache: MokaCache<String, Entry>,
    clock: Arc<dyn Clock>,
    group: Option<String>,
}

impl EphemeralStore {
    /// Creates a new ephemeral store with default configuration
    pub fn new() -> Self {
        Self::with_config(EphemeralStoreConfig::default(), Arc::new(SystemClock))
    }

    /// Creates a new ephemeral store with the given configuration and clock
    pub fn with_config(config: EphemeralStoreConfig, clock: Arc<dyn Clock>) -> Self {
        let mut builder = MokaCache::builder().max_capacity(config.max_capacity);

        if let Some(tti) = config.time_to_idle {
            builder = builder.time_to_idle(tti);
        }

        Self {
            cache: builder.build(),
            clock,
            group: config.group,
        }
    }

    /// Returns a view onto the same cache under another group
    pub fn with_group(&self, group: impl Into<String>) -> Self {
        Self {
            cache: self.cache.clone(),
            clock: Arc::clone(&self.clock),
            group: Some(group.into()),
        }
    }

    fn group_prefix(&self) -> String {
        match &self.group {
            Some(group) => format!("{}\u{0}", group),
            None => "\u{0}".to_string(),
        }
    }

    fn entry_key(&self, key: &str) -> String {
        format!("{}{}", self.group_prefix(), key)
    }

    fn is_expired(&self, entry: &Entry) -> bool {
        matches!(entry.expires_at, Some(expires_at) if expires_at <= self.clock.timestamp())
    }

    fn live_entry(&self, entry_key: &str) -> Option<Entry> {
        let entry = self.cache.get(entry_key)?;

        if self.is_expired(&entry) {
            self.cache.invalidate(entry_key);
            return None;
        }

        Some(entry)
    }
}

impl Default for EphemeralStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for EphemeralStore {
    fn get(&self, key: &str) -> Result<Option<CacheValue>, CacheError> {
        Ok(self.live_entry(&self.entry_key(key)).map(|entry| entry.value))
    }

    fn set(&self, key: &str, value: CacheValue, ttl: Option<i64>) -> Result<bool, CacheError> {
        let entry_key = self.entry_key(key);

        if matches!(ttl, Some(seconds) if seconds <= 0) {
            self.cache.invalidate(&entry_key);
            return Ok(true);
        }

        let expires_at = ttl.map(|seconds| self.clock.timestamp().saturating_add(seconds));
        self.cache.insert(entry_key, Entry { value, expires_at });
        Ok(true)
    }

    fn delete(&self, key: &str) -> Result<bool, CacheError> {
        let entry_key = self.entry_key(key);
        let existed = self.live_entry(&entry_key).is_some();
        self.cache.invalidate(&entry_key);
        Ok(existed)
    }

    fn clear(&self) -> Result<bool, CacheError> {
        let prefix = self.group_prefix();

        let keys: Vec<Arc<String>> = self
            .cache
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|(key, _)| key)
            .collect();

        for key in keys {
            self.cache.invalidate(key.as_str());
        }

        Ok(true)
    }

    fn has(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.live_entry(&self.entry_key(key)).is_some())
    }
}
