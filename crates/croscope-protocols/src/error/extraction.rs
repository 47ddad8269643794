//! HTML extraction errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Page unreachable: {0}")]
    Unreachable(String),

    #[error("Page returned HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Malformed page: {0}")]
    Malformed(String),

    #[error("Page body too large: {size} bytes (limit {limit})")]
    TooLarge { size: usize, limit: usize },

    #[error("Extraction timed out after {0} ms")]
    Timeout(u64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_error_http_status() {
        let err = ExtractionError::HttpStatus {
            status: 404,
            url: "https://example.com/missing".to_string(),
        };
        let display = err.to_string();
        assert!(display.contains("404"));
        assert!(display.contains("https://example.com/missing"));
    }

    #[test]
    fn test_extraction_error_too_large() {
        let err = ExtractionError::TooLarge {
            size: 20_000_000,
            limit: 10_000_000,
        };
        assert!(err.to_string().contains("20000000"));
        assert!(err.to_string().contains("10000000"));
    }

    #[test]
    fn test_extraction_error_debug() {
        let err = ExtractionError::Unreachable("connection refused".to_string());
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("Unreachable"));
    }
}
