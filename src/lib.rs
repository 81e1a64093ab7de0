//! Compliant Cache
//!
//! A strict cache facade over loosely typed key-value stores:
//! - Key validation with reserved characters and typed errors
//! - Original value types preserved through a tagged envelope
//! - Time-to-live enforced on read, even by stores without expiry
//! - Prefixing and length-limiting key decorators
//! - Ephemeral, options, metadata and Redis backends

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
pub use domain::{CacheError, CacheValue, Clock, Store, Ttl};
pub use infrastructure::cache::{BackendKind, CacheConfig, CacheFactory, ComplianceCache};
