//! Length-limiting key decorator

use crate::domain::cache::Store;
use crate::domain::CacheError;

use super::transform::{KeyTransform, TransformedStore};

/// Keys of at least this many characters must stay distinct
pub const MIN_KEY_LENGTH: usize = 64;

/// Cuts keys down to a maximum number of characters
#[derive(Debug, Clone, Copy)]
pub struct Truncate(usize);

impl Truncate {
    pub fn limit(&self) -> usize {
        self.0
    }
}

impl KeyTransform for Truncate {
    fn transform(&self, key: &str) -> String {
        match key.char_indices().nth(self.0) {
            Some((end, _)) => key[..end].to_string(),
            None => key.to_string(),
        }
    }
}

/// Store that truncates keys for backends with a key-length limit
pub type TruncatedStore<S> = TransformedStore<S, Truncate>;

impl<S: Store> TransformedStore<S, Truncate> {
    /// Fails when `limit` would break keys of [`MIN_KEY_LENGTH`] characters
    pub fn new(inner: S, limit: usize) -> Result<Self, CacheError> {
        if limit <= MIN_KEY_LENGTH {
            return Err(CacheError::configuration(format!(
                "Key length limit must be greater than {}, {} given",
                MIN_KEY_LENGTH, limit
            )));
        }

        Ok(Self::with_transform(inner, Truncate(limit)))
    }
}
