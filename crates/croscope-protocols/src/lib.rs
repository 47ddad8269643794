//! # croscope Protocols
//!
//! Core protocol definitions for the croscope analysis engine.
//! Contains interface definitions and the shared data model - no orchestration.
//!
//! ## Core Traits
//!
//! - [`VisionAdapter`] - Uniform contract around one AI vision backend
//! - [`ScreenshotService`] - Produces page screenshots
//! - [`ScrapingService`] - Produces structured DOM facts
//! - [`CacheStore`] - Storage backend for completed analyses

pub mod cache;
pub mod capture;
pub mod error;
pub mod types;
pub mod vision;

// Re-export core traits
pub use cache::{CacheKey, CacheStore, CachedEntry};
pub use capture::{ScrapingService, ScreenshotService};
pub use vision::{ModelVerdict, VisionAdapter, build_cro_prompt};
pub use error::{
    AnalysisError, AnalysisFailure, CacheError, CaptureError, ErrorKind, ExtractionError,
    ModelFailure, RegistryError, RequestError,
};
pub use types::*;
