//! Cache backend errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache backend unavailable: {0}")]
    Unavailable(String),

    #[error("Cache backend error: {0}")]
    Backend(String),

    #[error("Cache operation timed out after {0} ms")]
    Timeout(u64),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_error_backend() {
        let err = CacheError::Backend("database is locked".to_string());
        assert!(err.to_string().contains("database is locked"));
    }

    #[test]
    fn test_cache_error_timeout() {
        let err = CacheError::Timeout(500);
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn test_cache_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{broken").unwrap_err();
        let err = CacheError::from(json_err);
        assert!(err.to_string().contains("Serialization error"));
    }
}
