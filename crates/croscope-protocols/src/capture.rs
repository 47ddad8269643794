//! Capture collaborators: screenshot and HTML extraction.

use async_trait::async_trait;
use url::Url;

use crate::error::{CaptureError, ExtractionError};
use crate::types::{DomFacts, Screenshot};

/// Renders a page and returns its screenshot.
#[async_trait]
pub trait ScreenshotService: Send + Sync {
    fn id(&self) -> &str;

    /// Capture `url`. Fails on navigation errors or when the page never settles.
    async fn capture(&self, url: &Url) -> Result<Screenshot, CaptureError>;
}

/// Fetches a page and extracts structured DOM facts.
#[async_trait]
pub trait ScrapingService: Send + Sync {
    fn id(&self) -> &str;

    /// Extract facts from `url`. Fails when the page is unreachable or malformed.
    async fn extract(&self, url: &Url) -> Result<DomFacts, ExtractionError>;
}
