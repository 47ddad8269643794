//! Per-model findings and the observations they carry.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ModelFailure;

/// Recommendation priority. Orders `High` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Lenient parse for model output ("HIGH", "critical", "minor", ...).
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" | "critical" | "urgent" => Self::High,
            "low" | "minor" => Self::Low,
            _ => Self::Medium,
        }
    }
}

/// An actionable recommendation attributed to its source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub category: String,
    pub priority: Priority,
    pub issue: String,
    pub solution: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,
    /// Model name, or `structural`.
    pub source: String,
}

/// Pixel rectangle in screenshot coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }
}

/// One structured observation produced by an adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Observation {
    /// A labeled region of the screenshot.
    Region {
        label: String,
        confidence: f32,
        bounds: BoundingBox,
    },
    /// A free-text insight within a category.
    Insight { category: String, text: String },
    Recommendation(Recommendation),
}

impl Observation {
    pub fn insight(category: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Insight {
            category: category.into(),
            text: text.into(),
        }
    }

    /// Identity used for deduplication within a single model's output.
    pub fn signature(&self) -> String {
        match self {
            Self::Region {
                label,
                confidence,
                bounds,
            } => format!(
                "region:{}:{:.3}:{:.1},{:.1},{:.1},{:.1}",
                label, confidence, bounds.x, bounds.y, bounds.width, bounds.height
            ),
            Self::Insight { category, text } => format!("insight:{}:{}", category, text),
            Self::Recommendation(rec) => {
                format!("recommendation:{}:{}:{}", rec.category, rec.issue, rec.solution)
            }
        }
    }
}

/// Output of one adapter invocation, successful or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisionFinding {
    pub model: String,
    /// Quality signal in `0.0..=1.0`.
    pub confidence: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_score: Option<u8>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub category_scores: BTreeMap<String, u8>,
    #[serde(default)]
    pub observations: Vec<Observation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ModelFailure>,
    pub elapsed_ms: u64,
}

impl VisionFinding {
    pub fn success(model: impl Into<String>, confidence: f32) -> Self {
        Self {
            model: model.into(),
            confidence: confidence.clamp(0.0, 1.0),
            overall_score: None,
            category_scores: BTreeMap::new(),
            observations: Vec::new(),
            error: None,
            elapsed_ms: 0,
        }
    }

    pub fn failed(model: impl Into<String>, error: ModelFailure) -> Self {
        Self {
            model: model.into(),
            confidence: 0.0,
            overall_score: None,
            category_scores: BTreeMap::new(),
            observations: Vec::new(),
            error: Some(error),
            elapsed_ms: 0,
        }
    }

    pub fn with_observations(mut self, observations: Vec<Observation>) -> Self {
        self.observations = observations;
        self
    }

    pub fn with_scores(mut self, overall: Option<u8>, categories: BTreeMap<String, u8>) -> Self {
        self.overall_score = overall.map(|s| s.min(100));
        self.category_scores = categories
            .into_iter()
            .map(|(k, v)| (k, v.min(100)))
            .collect();
        self
    }

    pub fn with_elapsed_ms(mut self, elapsed_ms: u64) -> Self {
        self.elapsed_ms = elapsed_ms;
        self
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn recommendations(&self) -> impl Iterator<Item = &Recommendation> {
        self.observations.iter().filter_map(|o| match o {
            Observation::Recommendation(rec) => Some(rec),
            _ => None,
        })
    }
}
