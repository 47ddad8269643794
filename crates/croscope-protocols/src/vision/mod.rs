//! Vision adapter contract and the shared verdict format.

mod prompt;
mod verdict;

pub use prompt::*;
pub use verdict::*;

use async_trait::async_trait;

use crate::types::{CaptureArtifact, Screenshot, VisionFinding};

/// Uniform contract around one AI vision backend.
///
/// Adapters are stateless across calls and shared by concurrent runs.
/// Expected failures (timeout, quota, malformed input, bad response) are
/// returned inside the finding via [`VisionFinding::failed`]. Only a panic
/// escapes `analyze`, and the engine treats it as a defect.
#[async_trait]
pub trait VisionAdapter: Send + Sync {
    /// Stable identifier used in cache keys and result attribution.
    fn name(&self) -> &str;

    /// Pure; consults configuration captured at construction.
    fn is_enabled(&self) -> bool;

    /// Whether the adapter has anything to do without a screenshot.
    fn requires_screenshot(&self) -> bool {
        true
    }

    async fn analyze(
        &self,
        screenshot: Option<&Screenshot>,
        artifact: &CaptureArtifact,
    ) -> VisionFinding;
}
