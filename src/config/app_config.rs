use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use uuid::Uuid;

use crate::domain::CacheError;
use crate::infrastructure::cache::{BackendKind, CacheConfig};

/// Default persistence file of the options backend
pub const DEFAULT_OPTIONS_PATH: &str = ".compliant-cache.json";

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub cache: CacheSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::default(),
        }
    }
}

/// Cache section of the configuration file
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub backend: String,
    pub key_prefix: Option<String>,
    pub max_key_length: Option<usize>,
    pub group: Option<String>,
    pub max_capacity: Option<u64>,
    /// Idle eviction period in seconds (ephemeral only)
    pub time_to_idle_secs: Option<u64>,
    pub options_path: Option<PathBuf>,
    pub redis_url: Option<String>,
    pub entity_kind: Option<String>,
    pub entity_id: Option<Uuid>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            backend: BackendKind::Options.to_string(),
            key_prefix: None,
            max_key_length: None,
            group: None,
            max_capacity: None,
            time_to_idle_secs: None,
            options_path: Some(PathBuf::from(DEFAULT_OPTIONS_PATH)),
            redis_url: None,
            entity_kind: None,
            entity_id: None,
        }
    }
}

impl CacheSettings {
    /// Resolves the settings into a factory configuration
    pub fn to_cache_config(&self) -> Result<CacheConfig, CacheError> {
        Ok(CacheConfig {
            backend: self.backend.parse()?,
            key_prefix: self.key_prefix.clone().filter(|prefix| !prefix.is_empty()),
            max_key_length: self.max_key_length,
            group: self.group.clone(),
            max_capacity: self.max_capacity,
            time_to_idle: self.time_to_idle_secs.map(Duration::from_secs),
            options_path: self.options_path.clone(),
            redis_url: self.redis_url.clone(),
            entity_kind: self.entity_kind.clone(),
            entity_id: self.entity_id,
        })
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
