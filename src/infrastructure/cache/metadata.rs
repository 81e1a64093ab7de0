//! Entity-attached metadata store

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use uuid::Uuid;

use crate::domain::cache::{CacheValue, Store};
use crate::domain::CacheError;

use super::coerce::coerce_to_string;

type EntityKey = (String, Uuid);
type Metadata = HashMap<EntityKey, BTreeMap<String, String>>;

/// Shared metadata table for all entities
#[derive(Debug, Clone, Default)]
pub struct MetadataRegistry {
    entries: Arc<RwLock<Metadata>>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a store scoped to one entity
    pub fn store_for(&self, kind: impl Into<String>, entity_id: Uuid) -> MetadataStore {
        MetadataStore {
            registry: self.clone(),
            entity: (kind.into(), entity_id),
        }
    }

    /// Number of entities that currently carry metadata
    pub fn entity_count(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }
}

/// Metadata of a single entity, used as a cache backend.
///
/// Values are coerced to strings and ttl is ignored. `clear` removes only
/// this entity's metadata.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    registry: MetadataRegistry,
    entity: EntityKey,
}

impl MetadataStore {
    pub fn entity_kind(&self) -> &str {
        &self.entity.0
    }

    pub fn entity_id(&self) -> Uuid {
        self.entity.1
    }

    fn with_read<T>(
        &self,
        f: impl FnOnce(Option<&BTreeMap<String, String>>) -> T,
    ) -> Result<T, CacheError> {
        let entries = self
            .registry
            .entries
            .read()
            .map_err(|_| CacheError::backend("Metadata registry lock poisoned"))?;
        Ok(f(entries.get(&self.entity)))
    }

    fn with_write<T>(&self, f: impl FnOnce(&mut Metadata) -> T) -> Result<T, CacheError> {
        let mut entries = self
            .registry
            .entries
            .write()
            .map_err(|_| CacheError::backend("Metadata registry lock poisoned"))?;
        Ok(f(&mut entries))
    }
}

impl Store for MetadataStore {
    fn get(&self, key: &str) -> Result<Option<CacheValue>, CacheError> {
        self.with_read(|meta| {
            meta.and_then(|meta| meta.get(key))
                .cloned()
                .map(CacheValue::String)
        })
    }

    fn set(&self, key: &str, value: CacheValue, _ttl: Option<i64>) -> Result<bool, CacheError> {
        let value = coerce_to_string(&value);

        self.with_write(|entries| {
            entries
                .entry(self.entity.clone())
                .or_default()
                .insert(key.to_string(), value);
            true
        })
    }

    fn delete(&self, key: &str) -> Result<bool, CacheError> {
        self.with_write(|entries| {
            let Some(meta) = entries.get_mut(&self.entity) else {
                return false;
            };

            let removed = meta.remove(key).is_some();
            if meta.is_empty() {
                entries.remove(&self.entity);
            }
            removed
        })
    }

    fn clear(&self) -> Result<bool, CacheError> {
        self.with_write(|entries| {
            entries.remove(&self.entity);
            true
        })
    }

    fn has(&self, key: &str) -> Result<bool, CacheError> {
        self.with_read(|meta| meta.is_some_and(|meta| meta.contains_key(key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_are_scoped_to_entity() {
        let registry = MetadataRegistry::new();
        let post = registry.store_for("post", Uuid::new_v4());
        let user = registry.store_for("user", post.entity_id());

        post.set("views", CacheValue::Int(10), None).unwrap();

        assert_eq!(post.get("views").unwrap(), Some(CacheValue::from("10")));
        assert_eq!(user.get("views").unwrap(), None);
        assert_eq!(post.entity_kind(), "post");
    }

    #[test]
    fn test_clear_only_touches_own_entity() {
        let registry = MetadataRegistry::new();
        let first = registry.store_for("post", Uuid::new_v4());
        let second = registry.store_for("post", Uuid::new_v4());

        first.set("a", CacheValue::from("1"), None).unwrap();
        second.set("a", CacheValue::from("2"), None).unwrap();
        assert_eq!(registry.entity_count(), 2);

        first.clear().unwrap();

        assert!(!first.has("a").unwrap());
        assert!(second.has("a").unwrap());
        assert_eq!(registry.entity_count(), 1);
    }

    #[test]
    fn test_delete() {
        let registry = MetadataRegistry::new();
        let store = registry.store_for("post", Uuid::new_v4());

        store.set("a", CacheValue::Bool(true), None).unwrap();
        assert_eq!(store.get("a").unwrap(), Some(CacheValue::from("1")));

        assert!(store.delete("a").unwrap());
        assert!(!store.delete("a").unwrap());
        assert_eq!(registry.entity_count(), 0);
    }
}
