use super::*;

const FULL: &str = r#"{
  "overall_score": 72,
  "category_scores": {"trust_signals": 80, "mobile": "65%", "cart_page": 130},
  "recommendations": [
    {
      "category": "trust_signals",
      "priority": "HIGH",
      "issue": "Security badges not visible above the fold",
      "solution": "Move payment badges to the header",
      "impact": "Could increase conversions by 8-12%"
    },
    {"category": "cta", "priority": "low", "issue": "", "solution": "ignored"}
  ],
  "visual_issues": ["Button colors blend with background"],
  "mobile_issues": ["Touch targets too small"]
}"#;

#[test]
fn test_extract_plain_object() {
    assert_eq!(extract_json(r#"{"a":1}"#), Some(r#"{"a":1}"#));
}

#[test]
fn test_extract_from_prose() {
    let text = "Here is my analysis:\n{\"overall_score\": 60}\nHope this helps.";
    assert_eq!(extract_json(text), Some("{\"overall_score\": 60}"));
}

#[test]
fn test_extract_from_fence() {
    let text = "Sure.\n```json\n{\"overall_score\": 60}\n```\nNote: {braces} later.";
    assert_eq!(extract_json(text), Some("{\"overall_score\": 60}"));
}

#[test]
fn test_extract_none() {
    assert!(extract_json("no json here").is_none());
    assert!(extract_json("} backwards {").is_none());
}

#[test]
fn test_parse_full_verdict() {
    let verdict = ModelVerdict::parse(FULL).unwrap();
    assert_eq!(verdict.overall_score, Some(72));
    assert_eq!(verdict.category_scores["trust_signals"], 80);
    assert_eq!(verdict.category_scores["mobile"], 65);
    assert_eq!(verdict.category_scores["cart_page"], 100);
    assert_eq!(verdict.recommendations.len(), 2);
}

#[test]
fn test_parse_float_score() {
    let verdict = ModelVerdict::parse(r#"{"overall_score": 71.6}"#).unwrap();
    assert_eq!(verdict.overall_score, Some(72));
}

#[test]
fn test_parse_odd_priorities() {
    let text = r#"{
      "overall_score": 55,
      "recommendations": [
        {"category": "cta", "priority": null, "issue": "CTA hidden", "solution": "Raise it"},
        {"category": "trust", "priority": 1, "issue": "No reviews", "solution": "Add reviews"},
        {"category": "forms", "issue": "Long form", "solution": "Trim fields"}
      ]
    }"#;
    let verdict = ModelVerdict::parse(text).unwrap();
    assert_eq!(verdict.recommendations[0].priority, "");
    assert_eq!(verdict.recommendations[1].priority, "1");

    let finding = verdict.into_finding("gemini");
    let recs: Vec<_> = finding.recommendations().collect();
    assert_eq!(recs.len(), 3);
    assert!(recs.iter().all(|r| r.priority == Priority::Medium));
}

#[test]
fn test_parse_rejects_garbage() {
    let err = ModelVerdict::parse("I cannot analyze this image.").unwrap_err();
    assert!(matches!(err, ModelFailure::InvalidResponse { .. }));

    let err = ModelVerdict::parse("{not json}").unwrap_err();
    assert!(matches!(err, ModelFailure::InvalidResponse { .. }));
}

#[test]
fn test_into_finding() {
    let finding = ModelVerdict::parse(FULL).unwrap().into_finding("claude");

    assert!(finding.is_success());
    assert_eq!(finding.model, "claude");
    assert_eq!(finding.overall_score, Some(72));
    assert!((finding.confidence - 0.9).abs() < f32::EPSILON);

    let recs: Vec<_> = finding.recommendations().collect();
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].priority, Priority::High);
    assert_eq!(recs[0].source, "claude");

    let insights = finding
        .observations
        .iter()
        .filter(|o| matches!(o, Observation::Insight { .. }))
        .count();
    assert_eq!(insights, 2);
}

#[test]
fn test_empty_verdict() {
    let verdict = ModelVerdict::parse("{}").unwrap();
    assert!(verdict.is_empty());
    let finding = verdict.into_finding("gemini");
    assert!(finding.observations.is_empty());
    assert!(finding.confidence < 0.5);
}
