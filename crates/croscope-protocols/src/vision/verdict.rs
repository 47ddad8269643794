//! JSON verdict format shared by the LLM-backed adapters.
//!
//! Models are asked for a single JSON object but routinely wrap it in prose
//! or a fenced code block, so parsing locates the object first.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ModelFailure;
use crate::types::{Observation, Priority, Recommendation, VisionFinding};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerdictRecommendation {
    pub category: String,
    #[serde(deserialize_with = "lenient_text")]
    pub priority: String,
    pub issue: String,
    pub solution: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,
}

/// Verdict returned by an LLM vision backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelVerdict {
    #[serde(deserialize_with = "lenient_score")]
    pub overall_score: Option<u8>,
    #[serde(deserialize_with = "lenient_scores")]
    pub category_scores: BTreeMap<String, u8>,
    pub recommendations: Vec<VerdictRecommendation>,
    pub insights: Vec<String>,
    pub visual_issues: Vec<String>,
    pub mobile_issues: Vec<String>,
}

impl ModelVerdict {
    /// Parse a verdict out of free-form model output.
    pub fn parse(text: &str) -> Result<Self, ModelFailure> {
        let json = extract_json(text)
            .ok_or_else(|| ModelFailure::invalid_response("no JSON object in model output"))?;
        serde_json::from_str(json)
            .map_err(|e| ModelFailure::invalid_response(format!("verdict is not valid JSON: {}", e)))
    }

    pub fn is_empty(&self) -> bool {
        self.overall_score.is_none()
            && self.category_scores.is_empty()
            && self.recommendations.is_empty()
            && self.insights.is_empty()
            && self.visual_issues.is_empty()
            && self.mobile_issues.is_empty()
    }

    /// Convert into a successful finding attributed to `model`.
    pub fn into_finding(self, model: &str) -> VisionFinding {
        let confidence = match (self.overall_score.is_some(), self.recommendations.is_empty()) {
            (true, false) => 0.9,
            (true, true) | (false, false) => 0.7,
            (false, true) => 0.4,
        };

        let mut observations = Vec::new();
        for rec in self.recommendations {
            if rec.issue.trim().is_empty() {
                continue;
            }
            observations.push(Observation::Recommendation(Recommendation {
                category: if rec.category.is_empty() {
                    "general".to_string()
                } else {
                    rec.category
                },
                priority: Priority::parse_lenient(&rec.priority),
                issue: rec.issue,
                solution: rec.solution,
                impact: rec.impact.filter(|s| !s.is_empty()),
                source: model.to_string(),
            }));
        }
        let texts = [
            ("general", self.insights),
            ("visual", self.visual_issues),
            ("mobile", self.mobile_issues),
        ];
        for (category, items) in texts {
            observations.extend(
                items
                    .into_iter()
                    .filter(|t| !t.trim().is_empty())
                    .map(|t| Observation::insight(category, t)),
            );
        }

        VisionFinding::success(model, confidence)
            .with_scores(self.overall_score, self.category_scores)
            .with_observations(observations)
    }
}

/// Locate the JSON object in model output: a fenced block if present,
/// otherwise the span from the first `{` to the last `}`.
pub fn extract_json(text: &str) -> Option<&str> {
    if let Some(start) = text.find("```") {
        let after = &text[start + 3..];
        let body_start = after.find('\n').map(|i| i + 1).unwrap_or(0);
        let body = &after[body_start..];
        if let Some(end) = body.find("```") {
            let candidate = body[..end].trim();
            if candidate.starts_with('{') {
                return Some(candidate);
            }
        }
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn score_from_value(value: &serde_json::Value) -> Option<u8> {
    let n = match value {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => s.trim().trim_end_matches('%').parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then(|| n.round().clamp(0.0, 100.0) as u8)
}

fn lenient_score<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(score_from_value(&value))
}

/// Strings pass through, numbers become their text, anything else is empty.
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

fn lenient_scores<'de, D>(deserializer: D) -> Result<BTreeMap<String, u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let serde_json::Value::Object(map) = value else {
        return Ok(BTreeMap::new());
    };
    Ok(map
        .iter()
        .filter_map(|(k, v)| score_from_value(v).map(|s| (k.clone(), s)))
        .collect())
}

#[cfg(test)]
#[path = "verdict_tests.rs"]
mod tests;
