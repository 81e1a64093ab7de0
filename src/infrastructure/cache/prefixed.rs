//! Prefixing key decorator

use crate::domain::cache::Store;

use super::transform::{KeyTransform, TransformedStore};

/// Prepends a fixed string to every key
#[derive(Debug, Clone)]
pub struct Prefix(String);

impl KeyTransform for Prefix {
    fn transform(&self, key: &str) -> String {
        format!("{}{}", self.0, key)
    }
}

/// Store that namespaces every key with a fixed prefix
pub type PrefixedStore<S> = TransformedStore<S, Prefix>;

impl<S: Store> TransformedStore<S, Prefix> {
    pub fn new(inner: S, prefix: impl Into<String>) -> Self {
        Self::with_transform(inner, Prefix(prefix.into()))
    }
}
