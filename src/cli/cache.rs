//! Cache commands

use std::sync::Arc;

use anyhow::Context;
use tracing::debug;

use crate::config::AppConfig;
use crate::domain::cache::{CacheValue, SystemClock, Ttl};
use crate::domain::CacheError;
use crate::infrastructure::cache::{CacheFactory, DynCache};
use crate::infrastructure::logging;

use super::Command;

/// Load configuration, build the cache and run one command
pub fn run(command: Command) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().unwrap_or_default();
    logging::init_logging(&config.logging);

    let cache_config = config
        .cache
        .to_cache_config()
        .context("Invalid cache configuration")?;
    let cache = CacheFactory::new()
        .create(&cache_config, Arc::new(SystemClock))
        .context("Failed to create cache")?;

    let output = execute(&command, &cache)?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

/// Runs `command` against `cache` and returns what should be printed
pub fn execute(command: &Command, cache: &DynCache) -> Result<serde_json::Value, CacheError> {
    debug!(?command, "Executing cache command");

    let result: serde_json::Value = match command {
        Command::Get { key, default } => {
            let default = default.as_deref().map(parse_value).unwrap_or(CacheValue::Null);
            cache.get_or(key, default)?.to_json()
        }
        Command::Set { key, value, ttl } => {
            let ttl = ttl.map(Ttl::Seconds);
            cache.set(key, parse_value(value), ttl)?.into()
        }
        Command::Delete { key } => cache.delete(key)?.into(),
        Command::Has { key } => cache.has(key)?.into(),
        Command::Clear => cache.clear()?.into(),
    };

    Ok(result)
}

fn parse_value(raw: &str) -> CacheValue {
    serde_json::from_str::<serde_json::Value>(raw)
        .map(CacheValue::from)
        .unwrap_or_else(|_| CacheValue::from(raw))
}
