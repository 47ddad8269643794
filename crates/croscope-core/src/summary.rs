//! Aggregate insight summary across structural analysis and model verdicts.

use std::collections::{BTreeMap, HashSet};

use croscope_protocols::{InsightSummary, Recommendation, StructuralReport, VisionFinding};

use crate::structural;

/// Average scores per category and overall, and collect recommendations
/// ordered by priority then source. Only successful findings contribute.
pub fn summarize(structural: Option<&StructuralReport>, findings: &[VisionFinding]) -> InsightSummary {
    let mut overall: Vec<u8> = Vec::new();
    let mut categories: BTreeMap<String, Vec<u8>> = BTreeMap::new();
    let mut recommendations: Vec<Recommendation> = Vec::new();
    let mut sources = Vec::new();

    if let Some(report) = structural {
        sources.push(structural::SOURCE.to_string());
        overall.push(report.overall_score);
        for assessment in &report.categories {
            categories
                .entry(assessment.category.as_str().to_string())
                .or_default()
                .push(assessment.score);
            recommendations.extend(assessment.recommendations.iter().cloned());
        }
    }

    for finding in findings.iter().filter(|f| f.is_success()) {
        sources.push(finding.model.clone());
        if let Some(score) = finding.overall_score {
            overall.push(score);
        }
        for (category, score) in &finding.category_scores {
            categories.entry(category.clone()).or_default().push(*score);
        }
        recommendations.extend(finding.recommendations().cloned());
    }

    let mut seen = HashSet::new();
    recommendations.retain(|r| seen.insert((r.source.clone(), r.issue.clone())));
    recommendations.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.source.cmp(&b.source)));

    InsightSummary {
        overall_score: mean(&overall),
        category_scores: categories
            .into_iter()
            .filter_map(|(k, v)| mean(&v).map(|m| (k, m)))
            .collect(),
        recommendations,
        sources,
    }
}

fn mean(values: &[u8]) -> Option<u8> {
    if values.is_empty() {
        return None;
    }
    let total: u32 = values.iter().map(|v| u32::from(*v)).sum();
    Some((total as f64 / values.len() as f64).round() as u8)
}
