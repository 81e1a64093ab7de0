//! Cache infrastructure - Backends, key decorators and the compliance layer

mod coerce;
mod compliant;
mod factory;
mod in_memory;
mod metadata;
mod options;
mod prefixed;
mod redis;
mod transform;
mod truncated;

pub use compliant::ComplianceCache;
pub use factory::{BackendKind, CacheConfig, CacheFactory, DynCache};
pub use in_memory::{EphemeralStore, EphemeralStoreConfig};
pub use metadata::{MetadataRegistry, MetadataStore};
pub use options::OptionsStore;
pub use prefixed::{Prefix, PrefixedStore};
pub use redis::{RedisStore, RedisStoreConfig};
pub use transform::{KeyTransform, TransformedStore};
pub use truncated::{Truncate, TruncatedStore, MIN_KEY_LENGTH};
