//! Cache factory for runtime backend selection

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use uuid::Uuid;

use crate::domain::cache::{Clock, Store};
use crate::domain::CacheError;

use super::compliant::ComplianceCache;
use super::in_memory::{EphemeralStore, EphemeralStoreConfig};
use super::metadata::MetadataRegistry;
use super::options::OptionsStore;
use super::prefixed::PrefixedStore;
use super::redis::{RedisStore, RedisStoreConfig};
use super::truncated::TruncatedStore;

/// A fully composed cache over a runtime-selected backend
pub type DynCache = ComplianceCache<Box<dyn Store>>;

/// Supported backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// Process-wide in-memory object cache
    #[default]
    Ephemeral,
    /// Durable settings store
    Options,
    /// Entity-attached metadata
    Metadata,
    /// Redis
    Redis,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Ephemeral => write!(f, "ephemeral"),
            BackendKind::Options => write!(f, "options"),
            BackendKind::Metadata => write!(f, "metadata"),
            BackendKind::Redis => write!(f, "redis"),
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ephemeral" | "in_memory" | "memory" | "object" => Ok(BackendKind::Ephemeral),
            "options" | "option" | "settings" => Ok(BackendKind::Options),
            "metadata" | "meta" => Ok(BackendKind::Metadata),
            "redis" => Ok(BackendKind::Redis),
            _ => Err(CacheError::configuration(format!(
                "Unknown cache backend: {}. Valid backends: ephemeral, options, metadata, redis",
                s
            ))),
        }
    }
}

/// Configuration for cache factory
#[derive(Debug, Clone, Default)]
pub struct CacheConfig {
    /// Backend to create
    pub backend: BackendKind,
    /// Prefix added to every key
    pub key_prefix: Option<String>,
    /// Maximum backend key length; must exceed 64
    pub max_key_length: Option<usize>,
    /// Group (ephemeral only)
    pub group: Option<String>,
    /// Maximum capacity (ephemeral only)
    pub max_capacity: Option<u64>,
    /// Idle eviction period (ephemeral only)
    pub time_to_idle: Option<Duration>,
    /// Persistence file (options only)
    pub options_path: Option<PathBuf>,
    /// Redis URL (required for Redis)
    pub redis_url: Option<String>,
    /// Entity kind (metadata only)
    pub entity_kind: Option<String>,
    /// Entity id (required for metadata)
    pub entity_id: Option<Uuid>,
}

impl CacheConfig {
    /// Creates a configuration for the given backend
    pub fn new(backend: BackendKind) -> Self {
        Self {
            backend,
            ..Default::default()
        }
    }

    /// Creates a configuration for the ephemeral store
    pub fn ephemeral() -> Self {
        Self::new(BackendKind::Ephemeral)
    }

    /// Creates a configuration for the options store
    pub fn options() -> Self {
        Self::new(BackendKind::Options)
    }

    /// Creates a configuration for an entity's metadata
    pub fn metadata(kind: impl Into<String>, entity_id: Uuid) -> Self {
        Self {
            entity_kind: Some(kind.into()),
            entity_id: Some(entity_id),
            ..Self::new(BackendKind::Metadata)
        }
    }

    /// Creates a configuration for Redis
    pub fn redis(url: impl Into<String>) -> Self {
        Self {
            redis_url: Some(url.into()),
            ..Self::new(BackendKind::Redis)
        }
    }

    /// Sets the key prefix
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Sets the maximum backend key length
    pub fn with_max_key_length(mut self, limit: usize) -> Self {
        self.max_key_length = Some(limit);
        self
    }

    /// Sets the group (ephemeral only)
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Sets the maximum capacity (ephemeral only)
    pub fn with_max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = Some(capacity);
        self
    }

    /// Sets the idle eviction period (ephemeral only)
    pub fn with_time_to_idle(mut self, tti: Duration) -> Self {
        self.time_to_idle = Some(tti);
        self
    }

    /// Sets the persistence file (options only)
    pub fn with_options_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.options_path = Some(path.into());
        self
    }
}

/// Factory for creating composed caches
#[derive(Debug, Default)]
pub struct CacheFactory {
    metadata: MetadataRegistry,
}

impl CacheFactory {
    /// Creates a new cache factory
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a factory whose metadata caches share `registry`
    pub fn with_metadata_registry(registry: MetadataRegistry) -> Self {
        Self { metadata: registry }
    }

    /// Builds the compliance decorator over the configured backend, with the
    /// prefix applied before truncation.
    pub fn create(
        &self,
        config: &CacheConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<DynCache, CacheError> {
        let mut store = self.create_backend(config, Arc::clone(&clock))?;

        if let Some(limit) = config.max_key_length {
            store = Box::new(TruncatedStore::new(store, limit)?);
        }

        if let Some(prefix) = &config.key_prefix {
            store = Box::new(PrefixedStore::new(store, prefix.clone()));
        }

        info!(
            backend = %config.backend,
            prefix = ?config.key_prefix,
            max_key_length = ?config.max_key_length,
            "Created compliant cache"
        );

        Ok(ComplianceCache::new(store, clock))
    }

    /// Creates the bare backend store
    pub fn create_backend(
        &self,
        config: &CacheConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Box<dyn Store>, CacheError> {
        match config.backend {
            BackendKind::Ephemeral => {
                let mut ephemeral_config = EphemeralStoreConfig::default();

                if let Some(capacity) = config.max_capacity {
                    ephemeral_config = ephemeral_config.with_max_capacity(capacity);
                }

                if let Some(tti) = config.time_to_idle {
                    ephemeral_config = ephemeral_config.with_time_to_idle(tti);
                }

                if let Some(group) = &config.group {
                    ephemeral_config = ephemeral_config.with_group(group.clone());
                }

                Ok(Box::new(EphemeralStore::with_config(ephemeral_config, clock)))
            }
            BackendKind::Options => match &config.options_path {
                Some(path) => Ok(Box::new(OptionsStore::open(path)?)),
                None => Ok(Box::new(OptionsStore::new())),
            },
            BackendKind::Metadata => {
                let entity_id = config.entity_id.ok_or_else(|| {
                    CacheError::configuration("Entity id is required for metadata cache")
                })?;
                let kind = config.entity_kind.clone().unwrap_or_else(|| "entity".to_string());

                Ok(Box::new(self.metadata.store_for(kind, entity_id)))
            }
            BackendKind::Redis => {
                let url = config.redis_url.clone().ok_or_else(|| {
                    CacheError::configuration("Redis URL is required for Redis cache backend")
                })?;

                Ok(Box::new(RedisStore::new(RedisStoreConfig::new(url))?))
            }
        }
    }
}
