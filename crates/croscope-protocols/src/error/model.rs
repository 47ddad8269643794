//! Per-adapter model failures.
//!
//! A `ModelFailure` never aborts a run. Adapters return it inside a
//! [`VisionFinding`](crate::types::VisionFinding) and the engine records it
//! in the result next to the successful findings.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelFailure {
    #[error("Model timed out after {after_ms} ms")]
    Timeout { after_ms: u64 },

    #[error("Rate limited by backend")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Quota exceeded: {message}")]
    QuotaExceeded { message: String },

    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Malformed input: {message}")]
    MalformedInput { message: String },

    #[error("Invalid model response: {message}")]
    InvalidResponse { message: String },

    #[error("Skipped: {reason}")]
    Skipped { reason: String },

    #[error("Cancelled before completion")]
    Cancelled,
}

impl ModelFailure {
    /// Classify a non-success HTTP response from a model backend.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();
        match status {
            401 | 403 => Self::Authentication { message },
            429 if lower.contains("quota") => Self::QuotaExceeded { message },
            429 => Self::RateLimited {
                retry_after_secs: None,
            },
            400 | 413 | 415 | 422
                if lower.contains("image") || lower.contains("too large") =>
            {
                Self::MalformedInput { message }
            }
            _ => Self::Api { status, message },
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }

    /// Whether this failure means the adapter was never actually invoked.
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_auth() {
        let failure = ModelFailure::from_status(401, "invalid x-api-key");
        assert!(matches!(failure, ModelFailure::Authentication { .. }));
    }

    #[test]
    fn test_from_status_rate_limited() {
        let failure = ModelFailure::from_status(429, "Too many requests");
        assert_eq!(
            failure,
            ModelFailure::RateLimited {
                retry_after_secs: None
            }
        );
    }

    #[test]
    fn test_from_status_quota() {
        let failure = ModelFailure::from_status(429, "Resource has been exhausted (check quota).");
        assert!(matches!(failure, ModelFailure::QuotaExceeded { .. }));
    }

    #[test]
    fn test_from_status_malformed_image() {
        let failure = ModelFailure::from_status(400, "Could not process image");
        assert!(matches!(failure, ModelFailure::MalformedInput { .. }));
    }

    #[test]
    fn test_from_status_server_error() {
        let failure = ModelFailure::from_status(503, "overloaded");
        assert_eq!(
            failure,
            ModelFailure::Api {
                status: 503,
                message: "overloaded".to_string()
            }
        );
    }

    #[test]
    fn test_cancelled_serialization() {
        let json = serde_json::to_value(ModelFailure::Cancelled).unwrap();
        assert_eq!(json["type"], "cancelled");
        assert!(!ModelFailure::Cancelled.is_skip());
    }

    #[test]
    fn test_timeout_display() {
        let failure = ModelFailure::Timeout { after_ms: 30000 };
        assert!(failure.to_string().contains("30000"));
    }

    #[test]
    fn test_serialization_is_tagged() {
        let failure = ModelFailure::Timeout { after_ms: 50 };
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["type"], "timeout");
        assert_eq!(json["after_ms"], 50);

        let parsed: ModelFailure = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, failure);
    }

    #[test]
    fn test_is_skip() {
        assert!(ModelFailure::skipped("no screenshot").is_skip());
        assert!(!ModelFailure::network("reset").is_skip());
    }
}
