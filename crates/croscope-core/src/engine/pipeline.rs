//! Phase bodies for a single run.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use url::Url;

use croscope_protocols::{
    AnalysisError, AnalysisRequest, AnalysisResult, CacheKey, CaptureArtifact, Component,
    Degradation, DomFacts, ExtractionError, ModelFailureRecord, Phase, Screenshot, VisionFinding,
};

use super::run::RunTracker;
use super::{AnalysisOutcome, EngineInner};
use crate::{structural, summary};

pub(super) async fn drive(
    inner: &EngineInner,
    run: &mut RunTracker,
    request: &AnalysisRequest,
    models: &[String],
) -> Result<AnalysisOutcome, AnalysisError> {
    let mut degradations = Vec::new();

    run.advance(Phase::CacheCheck, None);
    let key = CacheKey::derive(&request.normalized_target(), models);
    if let Some(mut cached) = lookup(inner, &key, &mut degradations).await {
        // Cached results are re-stamped with the run that served them.
        info!(key = %key, "Cache hit");
        let run_id = run.run_id();
        cached.run_id = run_id;
        cached.client_label = request.client_label().map(str::to_string);
        run.advance(Phase::Completed, Some("cache hit".to_string()));
        return Ok(AnalysisOutcome {
            run_id,
            result: cached,
            cache_hit: true,
        });
    }

    run.advance(Phase::Capturing, None);
    let target = request.target();
    let (screenshot, dom) = capture(inner, target, &mut degradations).await;
    let dom = dom?;
    let artifact = Arc::new(CaptureArtifact::new(
        run.run_id(),
        target.clone(),
        screenshot,
        dom,
    ));

    run.advance(Phase::Analyzing, None);
    let findings = analyze(inner, models, artifact.clone(), &mut degradations).await?;

    run.advance(Phase::Merging, None);
    let result = merge(inner, run, request, models, &artifact, findings, degradations);

    if result.is_cacheable() {
        run.advance(Phase::Cached, None);
        store(inner, &key, &result).await;
    } else {
        debug!("Result has no findings, not caching");
    }

    run.advance(Phase::Completed, None);
    Ok(AnalysisOutcome {
        run_id: result.run_id,
        result,
        cache_hit: false,
    })
}

/// Cache read under its own budget. Errors and timeouts degrade to a miss.
async fn lookup(
    inner: &EngineInner,
    key: &CacheKey,
    degradations: &mut Vec<Degradation>,
) -> Option<AnalysisResult> {
    let budget = inner.options.cache_timeout;
    match tokio::time::timeout(budget, inner.cache.get(key)).await {
        Ok(Ok(hit)) => hit,
        Ok(Err(err)) => {
            warn!(key = %key, error = %err, "Cache lookup failed, computing directly");
            degradations.push(Degradation::new(
                Component::Cache,
                format!("cache lookup failed: {}", err),
            ));
            None
        }
        Err(_) => {
            warn!(key = %key, timeout_ms = budget.as_millis() as u64, "Cache lookup timed out");
            degradations.push(Degradation::new(
                Component::Cache,
                format!("cache lookup timed out after {} ms", budget.as_millis()),
            ));
            None
        }
    }
}

/// Screenshot and scrape in parallel; both settle before this returns.
///
/// A screenshot failure degrades the run. A scrape failure is returned.
async fn capture(
    inner: &EngineInner,
    target: &Url,
    degradations: &mut Vec<Degradation>,
) -> (Option<Screenshot>, Result<DomFacts, AnalysisError>) {
    let shot_budget = inner.options.screenshot_timeout;
    let scrape_budget = inner.options.scrape_timeout;

    let (shot, dom) = tokio::join!(
        tokio::time::timeout(shot_budget, inner.screenshots.capture(target)),
        tokio::time::timeout(scrape_budget, inner.scraper.extract(target)),
    );

    let screenshot = match shot {
        Ok(Ok(screenshot)) => {
            debug!(bytes = screenshot.len(), "Screenshot captured");
            Some(screenshot)
        }
        Ok(Err(err)) => {
            warn!(error = %err, "Screenshot failed, continuing with DOM only");
            degradations.push(Degradation::new(Component::Screenshot, err.to_string()));
            None
        }
        Err(_) => {
            warn!(timeout_ms = shot_budget.as_millis() as u64, "Screenshot timed out");
            degradations.push(Degradation::new(
                Component::Screenshot,
                format!("screenshot timed out after {} ms", shot_budget.as_millis()),
            ));
            None
        }
    };

    let dom = match dom {
        Ok(Ok(dom)) => Ok(dom),
        Ok(Err(err)) => Err(AnalysisError::Extraction(err)),
        Err(_) => Err(AnalysisError::Extraction(ExtractionError::Timeout(
            scrape_budget.as_millis() as u64,
        ))),
    };

    (screenshot, dom)
}

async fn analyze(
    inner: &EngineInner,
    models: &[String],
    artifact: Arc<CaptureArtifact>,
    degradations: &mut Vec<Degradation>,
) -> Result<Vec<VisionFinding>, AnalysisError> {
    if models.is_empty() {
        info!("No vision models enabled, structural analysis only");
        degradations.push(Degradation::new(
            Component::Vision,
            "no vision models enabled",
        ));
        return Ok(Vec::new());
    }

    let outcome = inner.vision.run_models(models, artifact).await?;
    for finding in outcome.failures() {
        if let Some(failure) = &finding.error {
            if failure.is_skip() {
                degradations.push(Degradation::for_model(&finding.model, failure.to_string()));
            }
        }
    }
    Ok(outcome.findings)
}

fn merge(
    inner: &EngineInner,
    run: &RunTracker,
    request: &AnalysisRequest,
    models: &[String],
    artifact: &CaptureArtifact,
    findings: Vec<VisionFinding>,
    mut degradations: Vec<Degradation>,
) -> AnalysisResult {
    let structural = structural::analyze(&artifact.dom);
    if structural.is_none() {
        degradations.push(Degradation::new(
            Component::Structural,
            "no page elements extracted",
        ));
    }

    let (findings, failed): (Vec<_>, Vec<_>) = findings.into_iter().partition(|f| f.is_success());
    let failures = failed
        .into_iter()
        .filter_map(|f| {
            f.error.map(|failure| ModelFailureRecord {
                model: f.model,
                failure,
            })
        })
        .collect();

    let summary = summary::summarize(structural.as_ref(), &findings);
    let screenshot = if inner.options.retain_screenshots {
        artifact.screenshot.as_ref().map(Screenshot::to_base64)
    } else {
        None
    };

    AnalysisResult {
        run_id: run.run_id(),
        target: artifact.target.clone(),
        client_label: request.client_label().map(str::to_string),
        models: models.to_vec(),
        findings,
        failures,
        structural,
        elements: artifact.dom.clone(),
        summary,
        degradations,
        screenshot,
        completed_at: Utc::now(),
    }
}

/// Cache write under its own budget. Failures are logged only.
///
/// Cache degradations describe this run's lookup, not the analysis, so the
/// stored copy leaves them out.
async fn store(inner: &EngineInner, key: &CacheKey, result: &AnalysisResult) {
    let budget = inner.options.cache_timeout;
    let ttl = inner.options.cache_ttl;

    let mut stored = result.clone();
    stored.degradations.retain(|d| d.component != Component::Cache);

    match tokio::time::timeout(budget, inner.cache.put(key, &stored, ttl)).await {
        Ok(Ok(())) => debug!(key = %key, ttl_secs = ttl.as_secs(), "Result cached"),
        Ok(Err(err)) => warn!(key = %key, error = %err, "Cache write failed"),
        Err(_) => warn!(key = %key, timeout_ms = budget.as_millis() as u64, "Cache write timed out"),
    }
}
