//! CDP client errors.

use croscope_protocols::CaptureError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CdpError {
    /// Chrome not found or not running with remote debugging.
    #[error("Chrome not available at {0}. Start Chrome with: chrome --remote-debugging-port=9222")]
    ChromeNotAvailable(String),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("CDP error: {message} (code: {code})")]
    Protocol { code: i64, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Timeout: {method} after {after_ms} ms")]
    Timeout { method: String, after_ms: u64 },

    #[error("Session closed")]
    SessionClosed,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for CdpError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        CdpError::WebSocket(e.to_string())
    }
}

impl From<CdpError> for CaptureError {
    fn from(e: CdpError) -> Self {
        match e {
            CdpError::ChromeNotAvailable(endpoint) => CaptureError::BrowserUnavailable(endpoint),
            CdpError::NavigationFailed(reason) => CaptureError::Navigation(reason),
            CdpError::Timeout { after_ms, .. } => CaptureError::Timeout(after_ms),
            other => CaptureError::Protocol(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_capture_error() {
        let err: CaptureError = CdpError::ChromeNotAvailable("http://127.0.0.1:9222".to_string()).into();
        assert!(matches!(err, CaptureError::BrowserUnavailable(_)));

        let err: CaptureError = CdpError::NavigationFailed("net::ERR_NAME_NOT_RESOLVED".to_string()).into();
        assert!(matches!(err, CaptureError::Navigation(ref r) if r.contains("ERR_NAME")));

        let err: CaptureError = CdpError::Timeout {
            method: "Page.navigate".to_string(),
            after_ms: 30000,
        }
        .into();
        assert!(matches!(err, CaptureError::Timeout(30000)));

        let err: CaptureError = CdpError::Protocol {
            code: -32000,
            message: "Target closed".to_string(),
        }
        .into();
        assert!(matches!(err, CaptureError::Protocol(ref m) if m.contains("Target closed")));

        let err: CaptureError = CdpError::SessionClosed.into();
        assert!(matches!(err, CaptureError::Protocol(_)));
    }
}
