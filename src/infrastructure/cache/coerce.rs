//! String coercion for backends that only hold text

use crate::domain::cache::CacheValue;

/// Flattens a value to the text a string-only backend keeps.
///
/// Lossy on purpose: `true` becomes `"1"`, `false` and `null` become `""`,
/// and structured values are written as plain JSON.
pub(crate) fn coerce_to_string(value: &CacheValue) -> String {
    match value {
        CacheValue::Null | CacheValue::Bool(false) => String::new(),
        CacheValue::Bool(true) => "1".to_string(),
        CacheValue::Int(i) => i.to_string(),
        CacheValue::Float(f) => f.to_string(),
        CacheValue::String(s) => s.clone(),
        other => other.to_json().to_string(),
    }
}
