use super::*;
use crate::ConfigLoader;

fn has_error(result: &ValidationResult, path: &str) -> bool {
    result.errors.iter().any(|e| e.path == path)
}

fn has_warning(result: &ValidationResult, path: &str) -> bool {
    result.warnings.iter().any(|w| w.path == path)
}

#[test]
fn test_default_config_is_valid() {
    let config = Config::default();
    let result = ConfigValidator::validate(&config);
    assert!(result.is_valid());
    // claude is enabled by default without credentials
    assert!(has_warning(&result, "vision.claude.api_key"));
}

#[test]
fn test_zero_timeouts_rejected() {
    let mut config = Config::default();
    config.engine.request_timeout_secs = 0;
    config.engine.cache_timeout_ms = 0;

    let result = ConfigValidator::validate(&config);
    assert!(!result.is_valid());
    assert!(has_error(&result, "engine.request_timeout_secs"));
    assert!(has_error(&result, "engine.cache_timeout_ms"));
}

#[test]
fn test_adapter_timeout_above_request_timeout() {
    let mut config = Config::default();
    config.engine.adapter_timeout_secs = 200;

    let result = ConfigValidator::validate(&config);
    assert!(result.is_valid());
    assert!(has_warning(&result, "engine.adapter_timeout_secs"));
}

#[test]
fn test_empty_model_set_warns() {
    let config = ConfigLoader::load_str("[vision.enabled]\n").unwrap();
    let result = ConfigValidator::validate(&config);
    assert!(result.is_valid());
    assert!(has_warning(&result, "vision.enabled"));
}

#[test]
fn test_unknown_model_rejected() {
    let config = ConfigLoader::load_str("[vision.enabled]\ngpt4v = true\n").unwrap();
    let result = ConfigValidator::validate(&config);
    assert!(has_error(&result, "vision.enabled.gpt4v"));
}

#[test]
fn test_missing_credentials_warn() {
    let content = r#"
        [vision.enabled]
        gemini = true
        yolo = true
    "#;
    let config = ConfigLoader::load_str(content).unwrap();
    let result = ConfigValidator::validate(&config);
    assert!(result.is_valid());
    assert!(has_warning(&result, "vision.gemini.api_key"));
    assert!(has_warning(&result, "vision.yolo.endpoint"));
    assert!(!has_warning(&result, "vision.claude.api_key"));
}

#[test]
fn test_empty_expanded_key_warns() {
    let content = r#"
        [vision.claude]
        api_key = "${CROSCOPE_TEST_UNSET_KEY:-}"
    "#;
    let config = ConfigLoader::load_str(content).unwrap();
    assert_eq!(config.vision.claude.api_key.as_deref(), Some(""));
    assert!(has_warning(&ConfigValidator::validate(&config), "vision.claude.api_key"));
}

#[test]
fn test_bad_urls_rejected() {
    let content = r#"
        [vision.claude]
        base_url = "api.anthropic.com"

        [vision.yolo]
        endpoint = "localhost:8000"

        [capture]
        cdp_endpoint = "127.0.0.1:9222"
    "#;
    let config = ConfigLoader::load_str(content).unwrap();
    let result = ConfigValidator::validate(&config);
    assert!(has_error(&result, "vision.claude.base_url"));
    assert!(has_error(&result, "vision.yolo.endpoint"));
    assert!(has_error(&result, "capture.cdp_endpoint"));
}

#[test]
fn test_ws_cdp_endpoint_accepted() {
    let mut config = Config::default();
    config.capture.cdp_endpoint = "ws://127.0.0.1:9222/devtools/browser/abc".to_string();
    let result = ConfigValidator::validate(&config);
    assert!(!has_error(&result, "capture.cdp_endpoint"));
}

#[test]
fn test_zero_viewport_rejected() {
    let mut config = Config::default();
    config.capture.viewport_width = 0;
    let result = ConfigValidator::validate(&config);
    assert!(has_error(&result, "capture.viewport"));
}

#[test]
fn test_confidence_range() {
    let mut config = Config::default();
    config.vision.yolo.confidence = 1.5;
    let result = ConfigValidator::validate(&config);
    assert!(has_error(&result, "vision.yolo.confidence"));
}

#[test]
fn test_settle_longer_than_screenshot_timeout() {
    let mut config = Config::default();
    config.capture.settle_ms = 60_000;
    let result = ConfigValidator::validate(&config);
    assert!(has_warning(&result, "capture.settle_ms"));
}

#[test]
fn test_cache_warnings() {
    let mut config = Config::default();
    config.cache.ttl_secs = 0;
    config.cache.max_entries = 0;
    let result = ConfigValidator::validate(&config);
    assert!(result.is_valid());
    assert!(has_warning(&result, "cache.ttl_secs"));
    assert!(has_warning(&result, "cache.max_entries"));
}
