//! # croscope Core
//!
//! Orchestration for one page analysis: cache lookup, parallel capture,
//! vision fan-out, structural scoring, merge and progress reporting.
//!
//! ## Components
//!
//! - [`AnalysisEngine`] - Runs requests through the phase state machine
//! - [`VisionManager`] - Fans out over enabled adapters with failure isolation
//! - [`ProgressHub`] - Per-run progress broadcast
//! - [`TieredCache`] - In-memory cache with an optional shared backing store
//! - [`structural`] - Non-AI CRO framework scored from DOM facts

pub mod cache;
pub mod engine;
pub mod progress;
pub mod registry;
pub mod structural;
pub mod summary;
pub mod vision_manager;

pub use cache::{MemoryCache, TieredCache};
pub use engine::{AnalysisEngine, AnalysisOutcome, EngineOptions, RunHandle};
pub use progress::{ProgressHub, ProgressStream};
pub use registry::{AdapterRegistry, BaseRegistry, Registerable};
pub use vision_manager::{VisionManager, VisionRun};

#[cfg(test)]
pub(crate) mod testing;
