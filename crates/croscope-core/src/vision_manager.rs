//! Vision Manager: concurrent fan-out over the enabled adapters.
//!
//! Every adapter runs in its own task under its own timeout, so one slow or
//! failing backend never blocks the others. Output order is by model name,
//! independent of completion order.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::{JoinError, JoinSet};
use tracing::{Instrument, debug, info, warn};

use croscope_protocols::{
    AnalysisError, CaptureArtifact, ModelFailure, RequestError, VisionAdapter, VisionFinding,
};

use crate::registry::AdapterRegistry;

/// Holds the enabled adapters, resolved once at startup.
pub struct VisionManager {
    adapters: Vec<Arc<dyn VisionAdapter>>,
    adapter_timeout: Duration,
}

/// Findings of one fan-out, ordered by model name.
#[derive(Debug, Default)]
pub struct VisionRun {
    pub findings: Vec<VisionFinding>,
}

impl VisionRun {
    pub fn failures(&self) -> impl Iterator<Item = &VisionFinding> {
        self.findings.iter().filter(|f| !f.is_success())
    }
}

impl VisionManager {
    /// Build from the static enablement map. An adapter is used only when the
    /// map enables it and the adapter itself reports ready.
    pub fn new(
        registry: &AdapterRegistry,
        enabled: &BTreeMap<String, bool>,
        adapter_timeout: Duration,
    ) -> Self {
        let mut adapters = Vec::new();

        for (name, on) in enabled {
            if !on {
                continue;
            }
            match registry.get(name) {
                Some(adapter) if adapter.is_enabled() => adapters.push(adapter),
                Some(_) => warn!(model = %name, "Model enabled in config but adapter is not ready"),
                None => warn!(model = %name, "Model enabled in config but no adapter is registered"),
            }
        }

        adapters.sort_by(|a, b| a.name().cmp(b.name()));
        info!(
            models = ?adapters.iter().map(|a| a.name()).collect::<Vec<_>>(),
            "Vision manager initialized"
        );

        Self {
            adapters,
            adapter_timeout,
        }
    }

    /// Build directly from a list of adapters; disabled ones are dropped.
    pub fn from_adapters(adapters: Vec<Arc<dyn VisionAdapter>>, adapter_timeout: Duration) -> Self {
        let mut adapters: Vec<_> = adapters.into_iter().filter(|a| a.is_enabled()).collect();
        adapters.sort_by(|a, b| a.name().cmp(b.name()));
        Self {
            adapters,
            adapter_timeout,
        }
    }

    /// Enabled model identifiers, sorted.
    pub fn enabled_models(&self) -> Vec<String> {
        self.adapters.iter().map(|a| a.name().to_string()).collect()
    }

    pub fn adapter_timeout(&self) -> Duration {
        self.adapter_timeout
    }

    /// Resolve a request's model override against the enabled set.
    ///
    /// `None` selects every enabled model. Naming a model that is not enabled
    /// is a request error.
    pub fn select(&self, requested: Option<&[String]>) -> Result<Vec<String>, RequestError> {
        let enabled = self.enabled_models();
        let Some(requested) = requested else {
            return Ok(enabled);
        };

        let mut selected = Vec::with_capacity(requested.len());
        for model in requested {
            if !enabled.contains(model) {
                return Err(RequestError::UnknownModel(model.clone()));
            }
            selected.push(model.clone());
        }
        selected.sort();
        selected.dedup();
        Ok(selected)
    }

    /// Run every enabled adapter against the artifact.
    pub async fn run_all(&self, artifact: Arc<CaptureArtifact>) -> Result<VisionRun, AnalysisError> {
        let all = self.enabled_models();
        self.run_models(&all, artifact).await
    }

    /// Run the named subset of enabled adapters.
    ///
    /// Expected adapter failures come back inside the findings. A panic inside
    /// an adapter is a defect and fails the call.
    pub async fn run_models(
        &self,
        models: &[String],
        artifact: Arc<CaptureArtifact>,
    ) -> Result<VisionRun, AnalysisError> {
        let wanted: HashSet<&str> = models.iter().map(String::as_str).collect();
        let mut findings = Vec::new();
        let mut tasks = JoinSet::new();
        let mut names = HashMap::new();

        for adapter in self.adapters.iter().filter(|a| wanted.contains(a.name())) {
            let name = adapter.name().to_string();

            if artifact.screenshot.is_none() && adapter.requires_screenshot() {
                debug!(model = %name, "Skipping adapter, no screenshot");
                findings.push(VisionFinding::failed(
                    &name,
                    ModelFailure::skipped("no screenshot available"),
                ));
                continue;
            }

            let adapter = adapter.clone();
            let artifact = artifact.clone();
            let timeout = self.adapter_timeout;
            let span = tracing::info_span!("vision_adapter", model = %name);
            let task_name = name.clone();

            let handle = tasks.spawn(
                async move {
                    let started = Instant::now();
                    let outcome = tokio::time::timeout(
                        timeout,
                        adapter.analyze(artifact.screenshot.as_ref(), &artifact),
                    )
                    .await;
                    let elapsed_ms = started.elapsed().as_millis() as u64;

                    let mut finding = match outcome {
                        Ok(finding) => finding,
                        Err(_) => {
                            warn!(timeout_ms = timeout.as_millis() as u64, "Adapter timed out");
                            VisionFinding::failed(
                                &task_name,
                                ModelFailure::Timeout {
                                    after_ms: timeout.as_millis() as u64,
                                },
                            )
                        }
                    };
                    finding.model = task_name;
                    finding.with_elapsed_ms(elapsed_ms)
                }
                .instrument(span),
            );
            names.insert(handle.id(), name);
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(finding) => {
                    match &finding.error {
                        None => debug!(model = %finding.model, elapsed_ms = finding.elapsed_ms, "Adapter succeeded"),
                        Some(err) => warn!(model = %finding.model, error = %err, "Adapter failed"),
                    }
                    findings.push(finding);
                }
                Err(err) if err.is_panic() => {
                    let model = names
                        .get(&err.id())
                        .cloned()
                        .unwrap_or_else(|| "unknown".to_string());
                    warn!(model = %model, "Adapter panicked");
                    return Err(AnalysisError::AdapterDefect {
                        model,
                        message: panic_message(err.into_panic()),
                    });
                }
                Err(err) => {
                    let model = names
                        .get(&err.id())
                        .cloned()
                        .unwrap_or_else(|| "unknown".to_string());
                    findings.push(aborted_finding(model, &err));
                }
            }
        }

        Ok(VisionRun {
            findings: merge_findings(findings),
        })
    }
}

/// A task that ended without a result or a panic was cancelled.
fn aborted_finding(model: String, err: &JoinError) -> VisionFinding {
    warn!(model = %model, error = %err, "Adapter task cancelled");
    VisionFinding::failed(model, ModelFailure::Cancelled)
}

/// Order findings by model and drop repeated observations within each model's
/// output. Observations from different models are never merged.
pub fn merge_findings(mut findings: Vec<VisionFinding>) -> Vec<VisionFinding> {
    findings.sort_by(|a, b| a.model.cmp(&b.model));

    for finding in &mut findings {
        let mut seen = HashSet::new();
        finding
            .observations
            .retain(|obs| seen.insert(obs.signature()));
    }

    findings
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "adapter panicked".to_string()
    }
}

#[cfg(test)]
#[path = "vision_manager_tests.rs"]
mod tests;
