//! Merged analysis results.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use super::artifact::DomFacts;
use super::finding::{Recommendation, VisionFinding};
use super::request::RunId;
use crate::error::ModelFailure;

/// The five categories of the structural CRO framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameworkCategory {
    Navigation,
    Display,
    Information,
    Technical,
    Psychological,
}

impl FrameworkCategory {
    pub const ALL: [FrameworkCategory; 5] = [
        Self::Navigation,
        Self::Display,
        Self::Information,
        Self::Technical,
        Self::Psychological,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Navigation => "navigation",
            Self::Display => "display",
            Self::Information => "information",
            Self::Technical => "technical",
            Self::Psychological => "psychological",
        }
    }
}

impl fmt::Display for FrameworkCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryAssessment {
    pub category: FrameworkCategory,
    pub score: u8,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
}

/// Non-AI findings computed from DOM facts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralReport {
    pub overall_score: u8,
    pub categories: Vec<CategoryAssessment>,
}

impl StructuralReport {
    pub fn category(&self, category: FrameworkCategory) -> Option<&CategoryAssessment> {
        self.categories.iter().find(|c| c.category == category)
    }
}

/// Aggregate view across structural analysis and every successful model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_score: Option<u8>,
    #[serde(default)]
    pub category_scores: BTreeMap<String, u8>,
    /// Ordered by priority, then by source.
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
    /// Contributors to this summary (`structural` and model names).
    #[serde(default)]
    pub sources: Vec<String>,
}

/// Sub-analysis that a degraded run skipped or lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Screenshot,
    Vision,
    Structural,
    Cache,
}

/// Annotation on a complete result describing what was skipped and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Degradation {
    pub component: Component,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl Degradation {
    pub fn new(component: Component, reason: impl Into<String>) -> Self {
        Self {
            component,
            reason: reason.into(),
            model: None,
        }
    }

    pub fn for_model(model: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            component: Component::Vision,
            reason: reason.into(),
            model: Some(model.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelFailureRecord {
    pub model: String,
    pub failure: ModelFailure,
}

/// The merged outcome of one analysis. Cached as JSON; never mutated once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub run_id: RunId,
    pub target: Url,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_label: Option<String>,
    /// Model set the run was keyed on, sorted.
    pub models: Vec<String>,
    /// Successful findings only, ordered by model name.
    #[serde(default)]
    pub findings: Vec<VisionFinding>,
    #[serde(default)]
    pub failures: Vec<ModelFailureRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structural: Option<StructuralReport>,
    #[serde(default)]
    pub elements: DomFacts,
    #[serde(default)]
    pub summary: InsightSummary,
    #[serde(default)]
    pub degradations: Vec<Degradation>,
    /// Base64 screenshot, present only when screenshots are retained.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
    pub completed_at: DateTime<Utc>,
}

impl AnalysisResult {
    /// A result is cacheable when some analysis actually succeeded.
    pub fn is_cacheable(&self) -> bool {
        !self.findings.is_empty() || self.structural.is_some()
    }

    pub fn is_degraded(&self) -> bool {
        !self.degradations.is_empty() || !self.failures.is_empty()
    }

    pub fn failure_for(&self, model: &str) -> Option<&ModelFailure> {
        self.failures
            .iter()
            .find(|r| r.model == model)
            .map(|r| &r.failure)
    }

    pub fn finding_for(&self, model: &str) -> Option<&VisionFinding> {
        self.findings.iter().find(|f| f.model == model)
    }
}

#[cfg(test)]
#[path = "result_tests.rs"]
mod tests;
