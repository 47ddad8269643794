//! `croscope analyze`: run one analysis and print the result.

use std::fmt::Write as _;

use futures::StreamExt;
use tracing::{info, warn};

use croscope_config::Config;
use croscope_core::AnalysisOutcome;
use croscope_protocols::{AnalysisRequest, ProgressEvent};

use crate::register;

const MAX_RECOMMENDATIONS: usize = 10;

pub(crate) struct AnalyzeOptions {
    pub label: Option<String>,
    pub models: Option<Vec<String>>,
    pub refresh: bool,
    pub json: bool,
}

pub(crate) async fn run(config: &Config, url: &str, options: AnalyzeOptions) -> anyhow::Result<()> {
    let engine = register::build_engine(config).await?;

    let mut request = AnalysisRequest::new(url)?;
    if let Some(label) = options.label {
        request = request.with_client_label(label);
    }
    if let Some(models) = options.models {
        request = request.with_models(models);
    }

    if options.refresh {
        if let Err(e) = engine.invalidate(&request).await {
            warn!(error = %e, "Failed to drop cached result");
        }
    }

    let mut handle = engine.submit(request)?;
    let run_id = handle.run_id();
    info!(run_id = %run_id, url, "Analysis submitted");

    let progress = handle.take_events().map(|mut events| {
        tokio::spawn(async move {
            while let Some(event) = events.next().await {
                eprintln!("{}", progress_line(&event));
            }
        })
    });

    let interrupt = {
        let engine = engine.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!(run_id = %run_id, "Interrupted, cancelling run");
                engine.cancel(run_id);
            }
        })
    };

    let outcome = handle.wait().await;
    interrupt.abort();
    if let Some(progress) = progress {
        let _ = progress.await;
    }
    let outcome = outcome?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&outcome.result)?);
    } else {
        print!("{}", render_summary(&outcome));
    }
    Ok(())
}

fn progress_line(event: &ProgressEvent) -> String {
    match &event.message {
        Some(message) => format!("[{:>3}%] {} - {}", event.percent, event.phase, message),
        None => format!("[{:>3}%] {}", event.percent, event.phase),
    }
}

fn score(value: Option<u8>) -> String {
    value.map_or_else(|| "n/a".to_string(), |s| format!("{}/100", s))
}

/// Human-readable summary of a finished run.
fn render_summary(outcome: &AnalysisOutcome) -> String {
    let result = &outcome.result;
    let summary = &result.summary;
    let mut out = String::new();

    let _ = writeln!(out, "Target:   {}", result.target);
    let _ = writeln!(
        out,
        "Run:      {}{}",
        outcome.run_id,
        if outcome.cache_hit { " (cached)" } else { "" }
    );
    if let Some(label) = &result.client_label {
        let _ = writeln!(out, "Label:    {}", label);
    }
    let _ = writeln!(out, "Overall:  {}", score(summary.overall_score));
    if !summary.sources.is_empty() {
        let _ = writeln!(out, "Sources:  {}", summary.sources.join(", "));
    }

    if !summary.category_scores.is_empty() {
        let _ = writeln!(out, "\nCategory scores");
        for (category, value) in &summary.category_scores {
            let _ = writeln!(out, "  {:<24} {:>3}", category, value);
        }
    }

    if !summary.recommendations.is_empty() {
        let _ = writeln!(out, "\nTop recommendations");
        for rec in summary.recommendations.iter().take(MAX_RECOMMENDATIONS) {
            let _ = writeln!(out, "  [{:?}] {}: {}", rec.priority, rec.category, rec.issue);
            match &rec.impact {
                Some(impact) => {
                    let _ = writeln!(out, "      -> {} ({})", rec.solution, impact);
                }
                None => {
                    let _ = writeln!(out, "      -> {}", rec.solution);
                }
            }
        }
        let hidden = summary.recommendations.len().saturating_sub(MAX_RECOMMENDATIONS);
        if hidden > 0 {
            let _ = writeln!(out, "  ... {} more (use --json for the full list)", hidden);
        }
    }

    if !result.failures.is_empty() {
        let _ = writeln!(out, "\nModel failures");
        for record in &result.failures {
            let _ = writeln!(out, "  {}: {}", record.model, record.failure);
        }
    }

    if !result.degradations.is_empty() {
        let _ = writeln!(out, "\nDegraded");
        for degradation in &result.degradations {
            match &degradation.model {
                Some(model) => {
                    let _ = writeln!(
                        out,
                        "  {:?} ({}): {}",
                        degradation.component, model, degradation.reason
                    );
                }
                None => {
                    let _ = writeln!(out, "  {:?}: {}", degradation.component, degradation.reason);
                }
            }
        }
    }

    out
}
