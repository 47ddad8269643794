//! Capture artifacts: the screenshot and the DOM facts extracted for one run.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use super::request::RunId;

/// Encoded image format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    /// MIME type sent to vision backends.
    pub fn media_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    /// Sniff the format from the leading magic bytes.
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
            Some(Self::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else {
            None
        }
    }
}

/// Browser viewport used for a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub mobile: bool,
}

impl Viewport {
    pub fn desktop() -> Self {
        Self {
            width: 1920,
            height: 1080,
            mobile: false,
        }
    }

    pub fn mobile() -> Self {
        Self {
            width: 375,
            height: 667,
            mobile: true,
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::desktop()
    }
}

/// An encoded page screenshot.
#[derive(Clone)]
pub struct Screenshot {
    pub bytes: Bytes,
    pub format: ImageFormat,
    pub captured_at: DateTime<Utc>,
    pub viewport: Viewport,
}

impl Screenshot {
    pub fn new(bytes: impl Into<Bytes>, format: ImageFormat, viewport: Viewport) -> Self {
        Self {
            bytes: bytes.into(),
            format,
            captured_at: Utc::now(),
            viewport,
        }
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for Screenshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Screenshot")
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .field("format", &self.format)
            .field("captured_at", &self.captured_at)
            .field("viewport", &self.viewport)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub level: u8,
    pub text: String,
}

/// What kind of element carries a call to action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CtaKind {
    Button,
    Link,
    Submit,
}

/// A call-to-action element found in the DOM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallToAction {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    pub kind: CtaKind,
    /// Styled as a primary or prominent action.
    #[serde(default)]
    pub prominent: bool,
    /// Uses urgency or value wording ("now", "free", "save", ...).
    #[serde(default)]
    pub persuasive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormFacts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    pub method: String,
    pub field_count: usize,
    pub required_fields: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageFacts {
    pub src: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Looks like a product image (class, alt or src mentions the product).
    #[serde(default)]
    pub product: bool,
}

impl ImageFacts {
    /// Declared dimensions exceed what any viewport renders.
    pub fn is_oversized(&self) -> bool {
        self.width.is_some_and(|w| w > 2000) || self.height.is_some_and(|h| h > 2000)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustKind {
    Review,
    Rating,
    Security,
    Guarantee,
    Testimonial,
    Badge,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustSignal {
    pub kind: TrustKind,
    pub text: String,
}

/// Counters consumed by the structural framework.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructureMetrics {
    pub nav_links: usize,
    pub has_breadcrumbs: bool,
    pub path_depth: usize,
    pub font_families: usize,
    pub positioned_elements: usize,
    pub empty_containers: usize,
    pub has_description: bool,
    pub offers: usize,
    pub has_viewport_meta: bool,
    pub html_bytes: usize,
    pub script_count: usize,
    pub has_return_policy: bool,
    pub has_faq: bool,
    pub distinct_colors: usize,
}

/// Structured facts extracted from the page HTML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomFacts {
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub headings: Vec<Heading>,
    pub ctas: Vec<CallToAction>,
    pub forms: Vec<FormFacts>,
    pub images: Vec<ImageFacts>,
    pub trust_signals: Vec<TrustSignal>,
    pub metrics: StructureMetrics,
}

impl DomFacts {
    /// Nothing usable was extracted; structural analysis is skipped.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.headings.is_empty()
            && self.ctas.is_empty()
            && self.forms.is_empty()
            && self.images.is_empty()
            && self.metrics.html_bytes == 0
    }

    pub fn h1(&self) -> Option<&str> {
        self.headings
            .iter()
            .find(|h| h.level == 1)
            .map(|h| h.text.as_str())
    }
}

/// Everything captured for one run. Built once, read-only afterwards.
#[derive(Debug, Clone)]
pub struct CaptureArtifact {
    pub run_id: RunId,
    pub target: Url,
    pub screenshot: Option<Screenshot>,
    pub dom: DomFacts,
    pub captured_at: DateTime<Utc>,
}

impl CaptureArtifact {
    pub fn new(run_id: RunId, target: Url, screenshot: Option<Screenshot>, dom: DomFacts) -> Self {
        Self {
            run_id,
            target,
            screenshot,
            dom,
            captured_at: Utc::now(),
        }
    }
}

#[cfg(test)]
#[path = "artifact_tests.rs"]
mod tests;
