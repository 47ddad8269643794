//! Analysis engine.
//!
//! Drives one request through `Queued -> CacheCheck -> Capturing -> Analyzing
//! -> Merging -> [Cached] -> Completed`, or into `Failed` from any
//! non-terminal phase. Each run is its own task with its own cancellation
//! token; the whole run sits under the request timeout.

mod pipeline;
mod run;

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info, info_span, warn};

use croscope_protocols::{
    AnalysisError, AnalysisFailure, AnalysisRequest, AnalysisResult, CacheError, CacheKey,
    CacheStore, Phase, RunId, ScrapingService, ScreenshotService,
};

use crate::progress::{ProgressHub, ProgressStream};
use crate::vision_manager::VisionManager;
use run::RunTracker;

/// Time budgets and result options for the engine.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Budget for the whole run.
    pub request_timeout: Duration,
    pub screenshot_timeout: Duration,
    pub scrape_timeout: Duration,
    /// Budget for one cache lookup or write.
    pub cache_timeout: Duration,
    pub cache_ttl: Duration,
    /// Embed the base64 screenshot in results.
    pub retain_screenshots: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(120),
            screenshot_timeout: Duration::from_secs(45),
            scrape_timeout: Duration::from_secs(30),
            cache_timeout: Duration::from_millis(500),
            cache_ttl: Duration::from_secs(24 * 60 * 60),
            retain_screenshots: false,
        }
    }
}

/// Successful end of a run.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub run_id: RunId,
    pub result: AnalysisResult,
    pub cache_hit: bool,
}

/// Handle to a submitted run.
pub struct RunHandle {
    run_id: RunId,
    events: Option<ProgressStream>,
    task: JoinHandle<Result<AnalysisOutcome, AnalysisFailure>>,
    cancel: CancellationToken,
}

impl RunHandle {
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Progress stream subscribed before the run started, so it sees every
    /// event from `Queued` on. Only the first call returns it.
    pub fn take_events(&mut self) -> Option<ProgressStream> {
        self.events.take()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the run's terminal outcome.
    pub async fn wait(self) -> Result<AnalysisOutcome, AnalysisFailure> {
        let run_id = self.run_id;
        match self.task.await {
            Ok(outcome) => outcome,
            Err(err) if err.is_cancelled() => Err(AnalysisFailure::new(
                run_id,
                Phase::Queued,
                AnalysisError::Cancelled,
            )),
            Err(err) => Err(AnalysisFailure::new(
                run_id,
                Phase::Queued,
                AnalysisError::AdapterDefect {
                    model: "engine".to_string(),
                    message: err.to_string(),
                },
            )),
        }
    }
}

pub(crate) struct EngineInner {
    pub(crate) vision: Arc<VisionManager>,
    pub(crate) screenshots: Arc<dyn ScreenshotService>,
    pub(crate) scraper: Arc<dyn ScrapingService>,
    pub(crate) cache: Arc<dyn CacheStore>,
    pub(crate) options: EngineOptions,
    progress: Arc<ProgressHub>,
    runs: DashMap<RunId, CancellationToken>,
}

/// Orchestrates analysis runs. Cheap to clone.
#[derive(Clone)]
pub struct AnalysisEngine {
    inner: Arc<EngineInner>,
}

impl AnalysisEngine {
    pub fn new(
        vision: Arc<VisionManager>,
        screenshots: Arc<dyn ScreenshotService>,
        scraper: Arc<dyn ScrapingService>,
        cache: Arc<dyn CacheStore>,
        options: EngineOptions,
    ) -> Self {
        info!(
            screenshots = screenshots.id(),
            scraper = scraper.id(),
            cache = cache.id(),
            models = ?vision.enabled_models(),
            "Analysis engine initialized"
        );
        Self {
            inner: Arc::new(EngineInner {
                vision,
                screenshots,
                scraper,
                cache,
                options,
                progress: Arc::new(ProgressHub::new()),
                runs: DashMap::new(),
            }),
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.inner.options
    }

    /// Enabled model identifiers, sorted.
    pub fn enabled_models(&self) -> Vec<String> {
        self.inner.vision.enabled_models()
    }

    /// Start a run in the background.
    ///
    /// The model override is resolved here, so an unknown model is rejected
    /// before any work starts.
    pub fn submit(&self, request: AnalysisRequest) -> Result<RunHandle, AnalysisFailure> {
        let run_id = RunId::new();
        let models = self
            .inner
            .vision
            .select(request.models())
            .map_err(|e| AnalysisFailure::new(run_id, Phase::Queued, e.into()))?;

        let cancel = CancellationToken::new();
        self.inner.runs.insert(run_id, cancel.clone());
        self.inner.progress.open(run_id);
        let events = self.inner.progress.subscribe(run_id);

        let inner = self.inner.clone();
        let token = cancel.clone();
        let span = info_span!("analysis_run", run_id = %run_id, target = %request.target());
        let task = tokio::spawn(
            async move {
                let outcome = execute(&inner, run_id, request, models, token).await;
                inner.runs.remove(&run_id);
                inner.progress.close(run_id);
                outcome
            }
            .instrument(span),
        );

        Ok(RunHandle {
            run_id,
            events,
            task,
            cancel,
        })
    }

    /// Submit and wait for the outcome.
    pub async fn analyze(
        &self,
        request: AnalysisRequest,
    ) -> Result<AnalysisOutcome, AnalysisFailure> {
        self.submit(request)?.wait().await
    }

    /// Attach to a live run's progress. `None` once it has ended.
    pub fn subscribe(&self, run_id: RunId) -> Option<ProgressStream> {
        self.inner.progress.subscribe(run_id)
    }

    /// Request cancellation. Returns `false` if the run is not active.
    pub fn cancel(&self, run_id: RunId) -> bool {
        match self.inner.runs.get(&run_id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Runs that have not yet reached a terminal phase.
    pub fn active_runs(&self) -> Vec<RunId> {
        let mut runs: Vec<RunId> = self.inner.runs.iter().map(|e| *e.key()).collect();
        runs.sort();
        runs
    }

    /// Drop the cached result for this request's target and model selection.
    ///
    /// Without an override the current enabled set is used, matching the key
    /// a fresh run would derive.
    pub async fn invalidate(&self, request: &AnalysisRequest) -> Result<(), CacheError> {
        let models = match request.models() {
            Some(models) => models.to_vec(),
            None => self.enabled_models(),
        };
        let key = CacheKey::derive(&request.normalized_target(), &models);
        info!(key = %key, "Invalidating cached result");
        self.inner.cache.invalidate(&key).await
    }
}

async fn execute(
    inner: &EngineInner,
    run_id: RunId,
    request: AnalysisRequest,
    models: Vec<String>,
    cancel: CancellationToken,
) -> Result<AnalysisOutcome, AnalysisFailure> {
    let mut run = RunTracker::new(run_id, inner.progress.clone());
    run.start();
    info!(models = ?models, "Run queued");

    let budget = inner.options.request_timeout;
    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AnalysisError::Cancelled),
        finished = tokio::time::timeout(
            budget,
            pipeline::drive(inner, &mut run, &request, &models),
        ) => match finished {
            Ok(outcome) => outcome,
            Err(_) => Err(AnalysisError::Timeout {
                after_ms: budget.as_millis() as u64,
            }),
        },
    };

    match outcome {
        Ok(outcome) => {
            info!(cache_hit = outcome.cache_hit, "Run completed");
            Ok(outcome)
        }
        Err(error) => {
            let failure = run.fail(error);
            warn!(phase = %failure.phase, kind = %failure.kind(), error = %failure.error, "Run failed");
            Err(failure)
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
