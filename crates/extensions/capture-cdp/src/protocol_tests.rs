use super::*;

#[test]
fn test_cdp_request_serialize() {
    let req = CdpRequest {
        id: 1,
        method: "Page.navigate".to_string(),
        params: Some(serde_json::json!({"url": "https://example.com"})),
    };
    let json = serde_json::to_string(&req).unwrap();
    assert!(json.contains("Page.navigate"));
    assert!(json.contains("example.com"));

    let bare = CdpRequest {
        id: 2,
        method: "Page.enable".to_string(),
        params: None,
    };
    assert_eq!(serde_json::to_string(&bare).unwrap(), r#"{"id":2,"method":"Page.enable"}"#);
}

#[test]
fn test_cdp_response_deserialize() {
    let resp: CdpResponse = serde_json::from_str(r#"{"id": 1, "result": {"frameId": "abc"}}"#).unwrap();
    assert_eq!(resp.id, Some(1));
    assert!(resp.result.is_some());

    let event: CdpResponse =
        serde_json::from_str(r#"{"method": "Page.loadEventFired", "params": {"timestamp": 1.5}}"#).unwrap();
    assert!(event.id.is_none());
    assert_eq!(event.method.as_deref(), Some("Page.loadEventFired"));

    let failed: CdpResponse =
        serde_json::from_str(r#"{"id": 3, "error": {"code": -32000, "message": "Cannot navigate"}}"#).unwrap();
    assert_eq!(failed.error.unwrap().code, -32000);
}

#[test]
fn test_page_info_deserialize() {
    let json = r#"{
        "id": "page123",
        "type": "page",
        "title": "",
        "url": "about:blank",
        "webSocketDebuggerUrl": "ws://localhost:9222/devtools/page/page123"
    }"#;
    let info: PageInfo = serde_json::from_str(json).unwrap();
    assert_eq!(info.id, "page123");
    assert_eq!(info.page_type, "page");
    assert_eq!(
        info.web_socket_debugger_url.as_deref(),
        Some("ws://localhost:9222/devtools/page/page123")
    );
}

#[test]
fn test_screenshot_params_serialize() {
    let params = CaptureScreenshotParams {
        format: "png",
        capture_beyond_viewport: true,
        from_surface: true,
    };
    let json = serde_json::to_value(&params).unwrap();
    assert_eq!(json["format"], "png");
    assert_eq!(json["captureBeyondViewport"], true);
    assert_eq!(json["fromSurface"], true);
}

#[test]
fn test_device_metrics_serialize() {
    let metrics = DeviceMetrics {
        width: 375,
        height: 667,
        device_scale_factor: 2.0,
        mobile: true,
    };
    let json = serde_json::to_value(&metrics).unwrap();
    assert_eq!(json["deviceScaleFactor"], 2.0);
    assert_eq!(json["mobile"], true);
}

#[test]
fn test_evaluated_value() {
    let result = serde_json::json!({"result": {"type": "string", "value": "complete"}});
    assert_eq!(evaluated_value(&result).and_then(|v| v.as_str()), Some("complete"));
    assert!(evaluated_value(&serde_json::json!({})).is_none());
}
