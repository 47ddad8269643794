//! Screenshot capture errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Browser not available: {0}")]
    BrowserUnavailable(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Browser protocol error: {0}")]
    Protocol(String),

    #[error("Capture timed out after {0} ms")]
    Timeout(u64),

    #[error("Invalid image data: {0}")]
    InvalidImage(String),
}
