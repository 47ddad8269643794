use super::*;

#[test]
fn test_engine_defaults() {
    let engine = EngineConfig::default();
    assert_eq!(engine.request_timeout(), Duration::from_secs(120));
    assert_eq!(engine.adapter_timeout(), Duration::from_secs(30));
    assert_eq!(engine.screenshot_timeout(), Duration::from_secs(45));
    assert_eq!(engine.scrape_timeout(), Duration::from_secs(30));
    assert_eq!(engine.cache_timeout(), Duration::from_millis(500));
    assert!(!engine.retain_screenshots);
}

#[test]
fn test_default_enabled_models() {
    let vision = VisionConfig::default();
    assert_eq!(vision.enabled_models(), vec!["claude"]);
    assert!(vision.is_enabled("claude"));
    assert!(!vision.is_enabled("yolo"));
    assert!(!vision.is_enabled("unknown"));
}

#[test]
fn test_enabled_table_replaces_defaults() {
    let config: Config = toml::from_str(
        r#"
        [vision.enabled]
        yolo = true
        "#,
    )
    .unwrap();
    assert_eq!(config.vision.enabled_models(), vec!["yolo"]);
    assert!(!config.vision.is_enabled("claude"));
}

#[test]
fn test_empty_enabled_table() {
    let config: Config = toml::from_str("[vision.enabled]\n").unwrap();
    assert!(config.vision.enabled_models().is_empty());
}

#[test]
fn test_capture_defaults() {
    let capture = CaptureConfig::default();
    assert_eq!(capture.viewport_width, 1920);
    assert_eq!(capture.viewport_height, 1080);
    assert!(capture.full_page);
    assert!(capture.user_agent.contains("Chrome"));
}

#[test]
fn test_cache_defaults() {
    let cache = CacheConfig::default();
    assert_eq!(cache.ttl(), Duration::from_secs(86400));
    assert_eq!(cache.max_entries, 100);
    assert!(cache.sqlite_path.is_none());
}

#[test]
fn test_backend_defaults() {
    let vision = VisionConfig::default();
    assert_eq!(vision.claude.base_url, "https://api.anthropic.com");
    assert_eq!(vision.claude.max_tokens, 2000);
    assert!(vision.gemini.base_url.contains("generativelanguage"));
    assert!((vision.yolo.confidence - 0.5).abs() < f32::EPSILON);
}

#[test]
fn test_logging_section() {
    let config: Config = toml::from_str(
        r#"
        [logging]
        level = "debug"
        json = true
        dir = "/var/log/croscope"
        "#,
    )
    .unwrap();
    assert_eq!(config.logging.level, "debug");
    assert!(config.logging.json);
    assert_eq!(config.logging.dir, Some(PathBuf::from("/var/log/croscope")));
}
