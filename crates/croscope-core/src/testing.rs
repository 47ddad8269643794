//! Hand-written collaborators for engine and manager tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use url::Url;

use croscope_protocols::{
    AnalysisResult, CallToAction, CaptureArtifact, CaptureError, CtaKind, DomFacts, ExtractionError, Heading,
    ImageFormat, ModelFailure, Observation, RunId, Screenshot, ScrapingService, ScreenshotService,
    StructuralReport, StructureMetrics, Viewport, VisionAdapter, VisionFinding,
};

#[derive(Clone)]
pub enum Behavior {
    Succeed,
    Fail(ModelFailure),
    Sleep(Duration),
    Panic,
    /// Never finishes; reports start and drop through the tracker.
    Hang(Arc<InFlight>),
}

/// Tracks a call that never completes on its own.
#[derive(Default)]
pub struct InFlight {
    started: Notify,
    dropped: AtomicUsize,
}

struct DropGuard<'a>(&'a AtomicUsize);

impl Drop for DropGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

impl InFlight {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Resolves once the call has started.
    pub async fn started(&self) {
        self.started.notified().await;
    }

    /// How many started calls have had their future dropped.
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::SeqCst)
    }

    /// Wait until the call's future is dropped, yielding to the runtime in
    /// between. Returns whether the drop was observed.
    pub async fn wait_dropped(&self) -> bool {
        for _ in 0..100 {
            if self.dropped() > 0 {
                return true;
            }
            tokio::task::yield_now().await;
        }
        self.dropped() > 0
    }

    async fn hang<T>(&self) -> T {
        let _guard = DropGuard(&self.dropped);
        self.started.notify_one();
        std::future::pending().await
    }
}

pub struct MockAdapter {
    pub name: &'static str,
    pub behavior: Behavior,
    pub enabled: bool,
    pub needs_screenshot: bool,
    pub calls: AtomicUsize,
}

impl MockAdapter {
    pub fn new(name: &'static str, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            name,
            behavior,
            enabled: true,
            needs_screenshot: true,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn disabled(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            behavior: Behavior::Succeed,
            enabled: false,
            needs_screenshot: true,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn dom_only(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            behavior: Behavior::Succeed,
            enabled: true,
            needs_screenshot: false,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VisionAdapter for MockAdapter {
    fn name(&self) -> &str {
        self.name
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn requires_screenshot(&self) -> bool {
        self.needs_screenshot
    }

    async fn analyze(&self, _: Option<&Screenshot>, _: &CaptureArtifact) -> VisionFinding {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Succeed => VisionFinding::success(self.name, 0.8).with_observations(vec![
                Observation::insight("display", format!("{} insight", self.name)),
                Observation::insight("display", format!("{} insight", self.name)),
            ]),
            Behavior::Fail(failure) => VisionFinding::failed(self.name, failure.clone()),
            Behavior::Sleep(duration) => {
                tokio::time::sleep(*duration).await;
                VisionFinding::success(self.name, 0.5)
            }
            Behavior::Panic => panic!("{} exploded", self.name),
            Behavior::Hang(tracker) => tracker.hang().await,
        }
    }
}

pub struct MockScreenshots {
    pub fail: bool,
    pub delay: Option<Duration>,
    pub hang: Option<Arc<InFlight>>,
    pub calls: AtomicUsize,
}

impl MockScreenshots {
    pub fn ok() -> Arc<Self> {
        Arc::new(Self {
            fail: false,
            delay: None,
            hang: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            delay: None,
            hang: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            fail: false,
            delay: Some(delay),
            hang: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn hanging(tracker: Arc<InFlight>) -> Arc<Self> {
        Arc::new(Self {
            fail: false,
            delay: None,
            hang: Some(tracker),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScreenshotService for MockScreenshots {
    fn id(&self) -> &str {
        "mock-screenshots"
    }

    async fn capture(&self, _url: &Url) -> Result<Screenshot, CaptureError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(tracker) = &self.hang {
            return tracker.hang().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(CaptureError::BrowserUnavailable("no browser".to_string()));
        }
        Ok(Screenshot::new(
            bytes::Bytes::from_static(&[0x89, b'P', b'N', b'G']),
            ImageFormat::Png,
            Viewport::desktop(),
        ))
    }
}

pub struct MockScraper {
    pub result: Result<DomFacts, ExtractionError>,
    pub calls: AtomicUsize,
}

impl MockScraper {
    pub fn ok() -> Arc<Self> {
        Arc::new(Self {
            result: Ok(sample_dom()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn returning(dom: DomFacts) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(dom),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            result: Err(ExtractionError::Unreachable("connection refused".to_string())),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScrapingService for MockScraper {
    fn id(&self) -> &str {
        "mock-scraper"
    }

    async fn extract(&self, _url: &Url) -> Result<DomFacts, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.result {
            Ok(dom) => Ok(dom.clone()),
            Err(ExtractionError::Unreachable(msg)) => Err(ExtractionError::Unreachable(msg.clone())),
            Err(_) => Err(ExtractionError::Malformed("mock".to_string())),
        }
    }
}

pub fn sample_dom() -> DomFacts {
    DomFacts {
        title: Some("Trail Running Shoes | Acme".to_string()),
        meta_description: Some("Lightweight trail shoes".to_string()),
        headings: vec![Heading {
            level: 1,
            text: "Trail Running Shoes".to_string(),
        }],
        ctas: vec![CallToAction {
            text: "Add to cart".to_string(),
            href: None,
            kind: CtaKind::Button,
            prominent: true,
            persuasive: false,
        }],
        metrics: StructureMetrics {
            nav_links: 8,
            html_bytes: 40_000,
            has_viewport_meta: true,
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn artifact(with_screenshot: bool) -> Arc<CaptureArtifact> {
    let screenshot = with_screenshot.then(|| {
        Screenshot::new(
            bytes::Bytes::from_static(&[0x89, b'P', b'N', b'G']),
            ImageFormat::Png,
            Viewport::desktop(),
        )
    });
    Arc::new(CaptureArtifact::new(
        RunId::new(),
        Url::parse("https://example.com/").unwrap(),
        screenshot,
        sample_dom(),
    ))
}

/// A cacheable result with structural findings only.
pub fn sample_result(target: &str) -> AnalysisResult {
    AnalysisResult {
        run_id: RunId::new(),
        target: Url::parse(target).unwrap(),
        client_label: None,
        models: Vec::new(),
        findings: Vec::new(),
        failures: Vec::new(),
        structural: Some(StructuralReport {
            overall_score: 80,
            categories: Vec::new(),
        }),
        elements: sample_dom(),
        summary: Default::default(),
        degradations: Vec::new(),
        screenshot: None,
        completed_at: chrono::Utc::now(),
    }
}
