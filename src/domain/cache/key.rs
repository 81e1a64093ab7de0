//! Cache key validation

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::CacheError;

use super::value::CacheValue;

/// Characters a cache key may not contain
pub const RESERVED_CHARACTERS: &str = "{}()/\\@:";

static RESERVED: Lazy<Regex> = Lazy::new(|| Regex::new(r"[{}()/\\@:]").unwrap());

/// Anything that can be passed where a cache key is expected.
///
/// Strings go straight to validation. Dynamic values are accepted so that
/// loosely typed input hits the same checks; a non-string value is rejected
/// with its type name.
pub trait KeyArg {
    /// Returns the key text, or the type name of a non-string argument
    fn key_str(&self) -> Result<&str, &str>;
}

impl KeyArg for str {
    fn key_str(&self) -> Result<&str, &str> {
        Ok(self)
    }
}

impl KeyArg for String {
    fn key_str(&self) -> Result<&str, &str> {
        Ok(self.as_str())
    }
}

impl KeyArg for CacheValue {
    fn key_str(&self) -> Result<&str, &str> {
        match self {
            CacheValue::String(s) => Ok(s),
            other => Err(other.type_name()),
        }
    }
}

impl<K: KeyArg + ?Sized> KeyArg for &K {
    fn key_str(&self) -> Result<&str, &str> {
        (**self).key_str()
    }
}

/// Validates a key and returns it as a string slice
pub fn validate_key<K: KeyArg + ?Sized>(key: &K) -> Result<&str, CacheError> {
    let key = key.key_str().map_err(|type_name| {
        CacheError::invalid_argument(format!(
            "Cache key must be string, \"{}\" given",
            type_name
        ))
    })?;

    if key.is_empty() {
        return Err(CacheError::invalid_argument(
            "Cache key length must be greater than zero",
        ));
    }

    if RESERVED.is_match(key) {
        return Err(CacheError::invalid_argument(format!(
            "Cache key \"{}\" contains reserved characters {}",
            key, RESERVED_CHARACTERS
        )));
    }

    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_valid_keys() {
        assert_eq!(validate_key("key").unwrap(), "key");
        assert_eq!(validate_key("a.b-c_d").unwrap(), "a.b-c_d");
        assert_eq!(validate_key(&"x".repeat(300)).unwrap().len(), 300);
        assert_eq!(validate_key(&CacheValue::from("dyn")).unwrap(), "dyn");
    }

    #[test]
    fn test_empty_key() {
        let err = validate_key("").unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(err.to_string().contains("greater than zero"));
    }

    #[test]
    fn test_reserved_characters() {
        let keys = [
            "{str", "rand}str", "rand(str", "rand)str", "rand/str", "rand\\str", "rand@str",
            "rand:str",
        ];

        for key in keys {
            let err = validate_key(key).unwrap_err();
            assert!(err.is_invalid_argument(), "key {:?} should be rejected", key);
            assert!(err.to_string().contains("reserved characters"));
        }
    }

    #[test]
    fn test_non_string_keys() {
        let record = CacheValue::Record {
            type_name: "Thing".to_string(),
            fields: BTreeMap::new(),
        };
        let cases = [
            (CacheValue::Bool(true), "bool"),
            (CacheValue::Bool(false), "bool"),
            (CacheValue::Null, "null"),
            (CacheValue::Float(2.5), "float"),
            (CacheValue::List(vec![]), "list"),
            (record, "Thing"),
        ];

        for (key, type_name) in cases {
            let err = validate_key(&key).unwrap_err();
            assert!(err.is_invalid_argument());
            assert!(
                err.to_string().contains(&format!("\"{}\" given", type_name)),
                "unexpected message: {}",
                err
            );
        }
    }
}
