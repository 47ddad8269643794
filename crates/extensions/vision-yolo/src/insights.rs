//! Turn raw detections into a CRO finding.
//!
//! Scores start from fixed baselines and gain points for visible elements,
//! then detections are cross-checked against the calls to action and forms
//! found in the markup.

use std::collections::BTreeMap;

use croscope_protocols::{
    DomFacts, Observation, Priority, Recommendation, VisionFinding,
};

use crate::types::Detection;

const BUTTON: &[&str] = &["button", "ui_element"];
const FORM: &[&str] = &["form", "textbox"];
const IMAGE: &[&str] = &["image", "product"];
/// Minimum pixel area for a button to count as a comfortable touch target.
const TOUCH_TARGET_AREA: f32 = 5000.0;
const NO_DETECTION_CONFIDENCE: f32 = 0.3;

pub fn interpret(model: &str, detections: &[Detection], dom: &DomFacts, fold: f32) -> VisionFinding {
    let buttons = count(detections, BUTTON);
    let forms = count(detections, FORM);
    let images = count(detections, IMAGE);

    let scores = BTreeMap::from([
        ("product_page".to_string(), product_page_score(detections, dom)),
        ("cart_page".to_string(), cart_page_score(forms, buttons)),
        ("mobile".to_string(), mobile_score(detections)),
        ("trust_signals".to_string(), trust_score(detections, dom)),
    ]);
    let overall = (scores.values().map(|s| u32::from(*s)).sum::<u32>() / scores.len() as u32) as u8;

    let mut observations: Vec<Observation> = detections
        .iter()
        .map(|d| Observation::Region {
            label: d.class_name.clone(),
            confidence: d.confidence,
            bounds: d.bbox,
        })
        .collect();

    if buttons < 3 {
        observations.push(recommend(
            model,
            "cta_buttons",
            Priority::High,
            format!("Only {} buttons detected by computer vision", buttons),
            "Add more prominent call-to-action buttons",
            "Could increase conversions by 10-15%",
        ));
    }
    if forms == 0 {
        observations.push(recommend(
            model,
            "forms",
            Priority::Medium,
            "No forms detected in visual analysis".to_string(),
            "Ensure contact/signup forms are visually prominent",
            "Could improve lead generation by 5-10%",
        ));
    }
    if images < 5 {
        observations.push(recommend(
            model,
            "product_page",
            Priority::Medium,
            "Limited product images detected".to_string(),
            "Add more product images and visual content",
            "Could improve engagement by 8-12%",
        ));
    }

    if !detections.is_empty() {
        let above = detections.iter().filter(|d| d.center_y() < fold).count();
        if above < 2 {
            observations.push(Observation::insight("visual", "Most elements detected below the fold"));
        }
        if above == detections.len() {
            observations.push(Observation::insight(
                "visual",
                "No elements detected in lower page area",
            ));
        }
    }

    if dom.ctas.len() > buttons {
        observations.push(Observation::insight(
            "cta",
            format!(
                "{} calls to action in the markup but only {} visible buttons",
                dom.ctas.len(),
                buttons
            ),
        ));
    }
    if !dom.forms.is_empty() && forms == 0 {
        observations.push(Observation::insight(
            "forms",
            format!("{} form(s) in the markup were not detected visually", dom.forms.len()),
        ));
    }

    let confidence = if detections.is_empty() {
        NO_DETECTION_CONFIDENCE
    } else {
        detections.iter().map(|d| d.confidence).sum::<f32>() / detections.len() as f32
    };

    VisionFinding::success(model, confidence)
        .with_scores(Some(overall), scores)
        .with_observations(observations)
}

fn count(detections: &[Detection], classes: &[&str]) -> usize {
    detections.iter().filter(|d| d.is_any(classes)).count()
}

fn product_page_score(detections: &[Detection], dom: &DomFacts) -> u8 {
    let mut score = 60u8;
    let images = count(detections, IMAGE);
    if images >= 6 {
        score += 20;
    } else if images >= 3 {
        score += 10;
    }
    if count(detections, BUTTON) >= 2 {
        score += 15;
    }
    if dom.images.iter().any(|i| i.product) {
        score += 5;
    }
    score.min(100)
}

fn cart_page_score(forms: usize, buttons: usize) -> u8 {
    let mut score = 65u8;
    if forms > 0 {
        score += 15;
    }
    if buttons >= 3 {
        score += 15;
    }
    score.min(100)
}

fn mobile_score(detections: &[Detection]) -> u8 {
    let large_buttons = detections
        .iter()
        .any(|d| d.is_any(&["button"]) && d.bbox.area() > TOUCH_TARGET_AREA);
    if large_buttons { 90 } else { 70 }
}

fn trust_score(detections: &[Detection], dom: &DomFacts) -> u8 {
    let mut score = 60u8;
    if !dom.trust_signals.is_empty() {
        score += 25;
    }
    if count(detections, &["image"]) >= 3 {
        score += 15;
    }
    score.min(100)
}

fn recommend(
    model: &str,
    category: &str,
    priority: Priority,
    issue: String,
    solution: &str,
    impact: &str,
) -> Observation {
    Observation::Recommendation(Recommendation {
        category: category.to_string(),
        priority,
        issue,
        solution: solution.to_string(),
        impact: Some(impact.to_string()),
        source: model.to_string(),
    })
}
