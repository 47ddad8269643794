use super::*;

fn empty_result() -> AnalysisResult {
    AnalysisResult {
        run_id: RunId::new(),
        target: Url::parse("https://example.com/").unwrap(),
        client_label: None,
        models: vec!["claude".to_string(), "yolo".to_string()],
        findings: Vec::new(),
        failures: Vec::new(),
        structural: None,
        elements: DomFacts::default(),
        summary: InsightSummary::default(),
        degradations: Vec::new(),
        screenshot: None,
        completed_at: Utc::now(),
    }
}

#[test]
fn test_empty_result_not_cacheable() {
    let result = empty_result();
    assert!(!result.is_cacheable());
    assert!(!result.is_degraded());
}

#[test]
fn test_structural_only_is_cacheable() {
    let mut result = empty_result();
    result.structural = Some(StructuralReport {
        overall_score: 70,
        categories: Vec::new(),
    });
    assert!(result.is_cacheable());
}

#[test]
fn test_single_finding_is_cacheable() {
    let mut result = empty_result();
    result.findings.push(VisionFinding::success("claude", 0.8));
    result.failures.push(ModelFailureRecord {
        model: "yolo".to_string(),
        failure: ModelFailure::Timeout { after_ms: 30000 },
    });

    assert!(result.is_cacheable());
    assert!(result.is_degraded());
    assert!(result.finding_for("claude").is_some());
    assert!(matches!(
        result.failure_for("yolo"),
        Some(ModelFailure::Timeout { after_ms: 30000 })
    ));
}

#[test]
fn test_result_json_roundtrip() {
    let mut result = empty_result();
    result.client_label = Some("acme".to_string());
    result.degradations.push(Degradation::new(Component::Screenshot, "browser unavailable"));
    result.failures.push(ModelFailureRecord {
        model: "gemini".to_string(),
        failure: ModelFailure::from_status(429, "quota exhausted"),
    });

    let json = serde_json::to_string(&result).unwrap();
    assert!(json.contains("\"component\":\"screenshot\""));
    assert!(json.contains("\"type\":\"quota_exceeded\""));

    let back: AnalysisResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back, result);
}

#[test]
fn test_framework_category_names() {
    let names: Vec<&str> = FrameworkCategory::ALL.iter().map(|c| c.as_str()).collect();
    assert_eq!(
        names,
        vec!["navigation", "display", "information", "technical", "psychological"]
    );
    assert_eq!(
        serde_json::to_value(FrameworkCategory::Psychological).unwrap(),
        "psychological"
    );
}

#[test]
fn test_model_degradation() {
    let degradation = Degradation::for_model("claude", "no screenshot");
    assert_eq!(degradation.component, Component::Vision);
    assert_eq!(degradation.model.as_deref(), Some("claude"));
}
