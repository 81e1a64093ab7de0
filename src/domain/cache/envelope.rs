//! Serialized form of every entry written by the compliance layer

use serde::{Deserialize, Serialize};

use crate::domain::CacheError;

use super::value::CacheValue;

/// Issuer tag identifying entries written by this crate
pub const ISSUER: &str = "compliant-cache/1";

/// Stored wrapper around a cached value.
///
/// `key` is the caller-visible key at write time, before any prefixing or
/// truncation, so an entry copied to another key is not honoured there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Envelope {
    pub issuer: String,
    pub key: String,
    pub expires_at: Option<i64>,
    pub value: CacheValue,
}

impl Envelope {
    pub fn new(key: impl Into<String>, value: CacheValue, expires_at: Option<i64>) -> Self {
        Self {
            issuer: ISSUER.to_string(),
            key: key.into(),
            expires_at,
            value,
        }
    }

    /// Serializes to the string form handed to backends
    pub fn encode(&self) -> Result<CacheValue, CacheError> {
        Ok(CacheValue::String(serde_json::to_string(self)?))
    }

    /// Recognizes a raw backend value as an envelope written for `key`.
    ///
    /// Returns `None` for anything else: non-string values, text that is not
    /// an envelope, a foreign issuer, or an envelope stored for another key.
    pub fn decode(raw: &CacheValue, key: &str) -> Option<Self> {
        let text = raw.as_str()?;
        let envelope: Self = serde_json::from_str(text).ok()?;

        if envelope.issuer != ISSUER || envelope.key != key {
            return None;
        }

        Some(envelope)
    }

    /// True when the entry has an expiry at or before `now`
    pub fn is_expired(&self, now: i64) -> bool {
        matches!(self.expires_at, Some(expires_at) if expires_at <= now)
    }
}
