//! Request-level errors and the failure descriptor returned for failed runs.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ExtractionError;
use crate::types::{Phase, RunId};

/// Rejections at request intake.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Unsupported URL scheme: {0} (expected http or https)")]
    UnsupportedScheme(String),

    #[error("URL has no host: {0}")]
    MissingHost(String),

    #[error("Unknown model in selection: {0}")]
    UnknownModel(String),
}

/// Errors that end a run in the `Failed` state.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] RequestError),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Request timed out after {after_ms} ms")]
    Timeout { after_ms: u64 },

    #[error("Run was cancelled")]
    Cancelled,

    #[error("Adapter {model} crashed: {message}")]
    AdapterDefect { model: String, message: String },
}

impl AnalysisError {
    /// Where this error sits in the failure taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Self::Extraction(ExtractionError::Timeout(_)) => ErrorKind::TimeoutFailure,
            Self::Extraction(_) => ErrorKind::ExtractionFailure,
            Self::Timeout { .. } => ErrorKind::TimeoutFailure,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::AdapterDefect { .. } => ErrorKind::Defect,
        }
    }
}

/// Failure taxonomy shared by errors, degradations and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Screenshot capture failed; recovered by DOM-only analysis.
    CaptureFailure,
    /// Scraping failed; fatal for the run.
    ExtractionFailure,
    /// One adapter failed; recorded in the result.
    ModelFailure,
    /// Cache read or write failed; recovered by direct computation.
    CacheFailure,
    /// A phase or the whole request exceeded its time budget.
    TimeoutFailure,
    /// The model configuration is empty or invalid; structural-only fallback.
    ConfigurationError,
    InvalidRequest,
    Cancelled,
    /// An adapter violated its contract (panicked).
    Defect,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::CaptureFailure => "CaptureFailure",
            Self::ExtractionFailure => "ExtractionFailure",
            Self::ModelFailure => "ModelFailure",
            Self::CacheFailure => "CacheFailure",
            Self::TimeoutFailure => "TimeoutFailure",
            Self::ConfigurationError => "ConfigurationError",
            Self::InvalidRequest => "InvalidRequest",
            Self::Cancelled => "Cancelled",
            Self::Defect => "Defect",
        };
        f.write_str(name)
    }
}

/// Descriptor for a run that ended in `Failed`: what went wrong and how far it got.
#[derive(Debug, Error)]
#[error("run {run_id} failed during {phase}: {error}")]
pub struct AnalysisFailure {
    pub run_id: RunId,
    pub phase: Phase,
    #[source]
    pub error: AnalysisError,
}

impl AnalysisFailure {
    pub fn new(run_id: RunId, phase: Phase, error: AnalysisError) -> Self {
        Self {
            run_id,
            phase,
            error,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_error_scheme() {
        let err = RequestError::UnsupportedScheme("ftp".to_string());
        assert!(err.to_string().contains("ftp"));
        assert!(err.to_string().contains("http or https"));
    }

    #[test]
    fn test_extraction_maps_to_extraction_failure() {
        let err = AnalysisError::from(ExtractionError::Unreachable("dns".to_string()));
        assert_eq!(err.kind(), ErrorKind::ExtractionFailure);
    }

    #[test]
    fn test_extraction_timeout_maps_to_timeout_failure() {
        let err = AnalysisError::from(ExtractionError::Timeout(30000));
        assert_eq!(err.kind(), ErrorKind::TimeoutFailure);
    }

    #[test]
    fn test_request_timeout_kind() {
        let err = AnalysisError::Timeout { after_ms: 120000 };
        assert_eq!(err.kind(), ErrorKind::TimeoutFailure);
        assert!(err.to_string().contains("120000"));
    }

    #[test]
    fn test_failure_descriptor_display() {
        let run_id = RunId::new();
        let failure = AnalysisFailure::new(
            run_id,
            Phase::Capturing,
            AnalysisError::Extraction(ExtractionError::HttpStatus {
                status: 500,
                url: "https://example.com/".to_string(),
            }),
        );
        let display = failure.to_string();
        assert!(display.contains(&run_id.to_string()));
        assert!(display.contains("Capturing"));
        assert!(display.contains("500"));
        assert_eq!(failure.kind(), ErrorKind::ExtractionFailure);
    }

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ErrorKind::ExtractionFailure.to_string(), "ExtractionFailure");
        assert_eq!(ErrorKind::TimeoutFailure.to_string(), "TimeoutFailure");
    }
}
