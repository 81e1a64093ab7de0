//! Redis store implementation

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use redis::{Client, Commands, Connection};

use crate::domain::cache::{CacheValue, Store};
use crate::domain::CacheError;

use super::coerce::coerce_to_string;

/// Configuration for the Redis store
#[derive(Debug, Clone)]
pub struct RedisStoreConfig {
    /// Redis connection URL (e.g., "redis://127.0.0.1:6379")
    pub url: String,
    /// Connection timeout
    pub connection_timeout: Duration,
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            connection_timeout: Duration::from_secs(5),
        }
    }
}

impl RedisStoreConfig {
    /// Creates a new configuration with the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Sets the connection timeout
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }
}

/// Redis-backed store
///
/// Redis keeps strings, so values are coerced the same way the options store
/// does. Positive ttls are passed on as `SET EX`. `clear` flushes the
/// selected database.
pub struct RedisStore {
    connection: Mutex<Connection>,
    config: RedisStoreConfig,
}

impl fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStore")
            .field("config", &self.config)
            .field("connection", &"<Connection>")
            .finish()
    }
}

impl RedisStore {
    /// Opens a connection to Redis
    pub fn new(config: RedisStoreConfig) -> Result<Self, CacheError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| CacheError::backend(format!("Failed to create Redis client: {}", e)))?;

        let connection = client
            .get_connection_with_timeout(config.connection_timeout)
            .map_err(|e| CacheError::backend(format!("Failed to connect to Redis: {}", e)))?;

        Ok(Self {
            connection: Mutex::new(connection),
            config,
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, CacheError> {
        self.connection
            .lock()
            .map_err(|_| CacheError::backend("Redis connection lock poisoned"))
    }
}

impl Store for RedisStore {
    fn get(&self, key: &str) -> Result<Option<CacheValue>, CacheError> {
        let result: Option<String> = self
            .conn()?
            .get(key)
            .map_err(|e| CacheError::backend(format!("Failed to get key '{}': {}", key, e)))?;

        Ok(result.map(CacheValue::String))
    }

    fn set(&self, key: &str, value: CacheValue, ttl: Option<i64>) -> Result<bool, CacheError> {
        let value = coerce_to_string(&value);
        let mut conn = self.conn()?;

        let result: redis::RedisResult<()> = match ttl {
            Some(seconds) if seconds <= 0 => conn.del(key),
            Some(seconds) => conn.set_ex(key, value, seconds.unsigned_abs()),
            None => conn.set(key, value),
        };

        result.map_err(|e| CacheError::backend(format!("Failed to set key '{}': {}", key, e)))?;
        Ok(true)
    }

    fn delete(&self, key: &str) -> Result<bool, CacheError> {
        let deleted: i64 = self
            .conn()?
            .del(key)
            .map_err(|e| CacheError::backend(format!("Failed to delete key '{}': {}", key, e)))?;

        Ok(deleted > 0)
    }

    fn clear(&self) -> Result<bool, CacheError> {
        let mut conn = self.conn()?;

        redis::cmd("FLUSHDB")
            .query::<()>(&mut *conn)
            .map_err(|e| CacheError::backend(format!("Failed to flush database: {}", e)))?;

        Ok(true)
    }

    fn has(&self, key: &str) -> Result<bool, CacheError> {
        self.conn()?
            .exists(key)
            .map_err(|e| CacheError::backend(format!("Failed to check key '{}': {}", key, e)))
    }

    fn get_multiple(
        &self,
        keys: &[String],
    ) -> Result<BTreeMap<String, Option<CacheValue>>, CacheError> {
        if keys.is_empty() {
            return Ok(BTreeMap::new());
        }

        let mut conn = self.conn()?;
        let values: Vec<Option<String>> = redis::cmd("MGET")
            .arg(keys)
            .query(&mut *conn)
            .map_err(|e| CacheError::backend(format!("Failed to get keys: {}", e)))?;

        Ok(keys
            .iter()
            .cloned()
            .zip(values.into_iter().map(|v| v.map(CacheValue::String)))
            .collect())
    }

    fn delete_multiple(&self, keys: &[String]) -> Result<bool, CacheError> {
        if keys.is_empty() {
            return Ok(true);
        }

        let deleted: usize = self
            .conn()?
            .del(keys)
            .map_err(|e| CacheError::backend(format!("Failed to delete keys: {}", e)))?;

        Ok(deleted == keys.len())
    }
}
