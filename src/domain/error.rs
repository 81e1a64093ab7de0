use thiserror::Error;

/// Errors raised by the cache layer
///
/// `InvalidArgument` and `Type` are raised before any backend call and are
/// always the caller's bug. `Backend` carries failures from the wrapped store
/// and is passed through the decorators untouched.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Type error: {message}")]
    Type { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Backend error: {message}")]
    Backend { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl CacheError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::Type {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }

    pub fn is_type_error(&self) -> bool {
        matches!(self, Self::Type { .. })
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_argument_error() {
        let error = CacheError::invalid_argument("Cache key length must be greater than zero");
        assert_eq!(
            error.to_string(),
            "Invalid argument: Cache key length must be greater than zero"
        );
        assert!(error.is_invalid_argument());
        assert!(!error.is_type_error());
    }

    #[test]
    fn test_type_error() {
        let error = CacheError::type_error("Cache keys must be iterable, \"int\" given");
        assert_eq!(
            error.to_string(),
            "Type error: Cache keys must be iterable, \"int\" given"
        );
        assert!(error.is_type_error());
        assert!(!error.is_invalid_argument());
    }

    #[test]
    fn test_configuration_error() {
        let error = CacheError::configuration("limit too small");
        assert_eq!(error.to_string(), "Configuration error: limit too small");
        assert!(error.is_configuration());
    }
}
