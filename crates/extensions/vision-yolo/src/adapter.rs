//! Client adapter for a self-hosted UI element detection service.

use async_trait::async_trait;
use tracing::debug;

use croscope_protocols::{CaptureArtifact, ModelFailure, Screenshot, VisionAdapter, VisionFinding};

use crate::insights::interpret;
use crate::types::{DetectRequest, DetectResponse};

pub const MODEL_ID: &str = "yolo";

const DEFAULT_CONFIDENCE: f32 = 0.5;

pub struct YoloVision {
    endpoint: Option<String>,
    confidence: f32,
    client: reqwest::Client,
}

impl YoloVision {
    /// Without an endpoint the adapter reports itself disabled.
    pub fn new(endpoint: Option<String>) -> Self {
        Self {
            endpoint: endpoint
                .filter(|e| !e.trim().is_empty())
                .map(|e| e.trim_end_matches('/').to_string()),
            confidence: DEFAULT_CONFIDENCE,
            client: reqwest::Client::new(),
        }
    }

    /// Detections below this confidence are discarded.
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    async fn detect(&self, endpoint: &str, screenshot: &Screenshot) -> Result<DetectResponse, ModelFailure> {
        let request = DetectRequest {
            image: screenshot.to_base64(),
            media_type: screenshot.format.media_type().to_string(),
            confidence: self.confidence,
        };

        let response = self
            .client
            .post(format!("{}/detect", endpoint))
            .json(&request)
            .send()
            .await
            .map_err(|e| ModelFailure::network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ModelFailure::network(e.to_string()))?;

        if !status.is_success() {
            return Err(ModelFailure::from_status(status.as_u16(), body));
        }

        serde_json::from_str(&body)
            .map_err(|e| ModelFailure::invalid_response(format!("unexpected detection body: {}", e)))
    }

    async fn run(
        &self,
        screenshot: Option<&Screenshot>,
        artifact: &CaptureArtifact,
    ) -> Result<VisionFinding, ModelFailure> {
        let endpoint = self
            .endpoint
            .as_deref()
            .ok_or_else(|| ModelFailure::skipped("no detection endpoint configured"))?;
        let screenshot = screenshot.ok_or_else(|| ModelFailure::skipped("no screenshot available"))?;

        let response = self.detect(endpoint, screenshot).await?;
        let detections: Vec<_> = response
            .detections
            .into_iter()
            .filter(|d| d.confidence >= self.confidence)
            .collect();
        debug!(count = detections.len(), "Detections above threshold");

        let fold = screenshot.viewport.height as f32;
        Ok(interpret(MODEL_ID, &detections, &artifact.dom, fold))
    }
}

#[async_trait]
impl VisionAdapter for YoloVision {
    fn name(&self) -> &str {
        MODEL_ID
    }

    fn is_enabled(&self) -> bool {
        self.endpoint.is_some()
    }

    async fn analyze(
        &self,
        screenshot: Option<&Screenshot>,
        artifact: &CaptureArtifact,
    ) -> VisionFinding {
        self.run(screenshot, artifact)
            .await
            .unwrap_or_else(|failure| VisionFinding::failed(MODEL_ID, failure))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use croscope_protocols::{DomFacts, ImageFormat, Observation, RunId, Viewport};
    use wiremock::{Mock, MockServer, ResponseTemplate, matchers};

    fn artifact() -> CaptureArtifact {
        CaptureArtifact::new(
            RunId::new(),
            url::Url::parse("https://shop.example.com/").unwrap(),
            Some(Screenshot::new(
                bytes::Bytes::from_static(&[0x89, b'P', b'N', b'G']),
                ImageFormat::Png,
                Viewport::desktop(),
            )),
            DomFacts::default(),
        )
    }

    #[test]
    fn test_enabled_only_with_endpoint() {
        assert!(!YoloVision::new(None).is_enabled());
        assert!(!YoloVision::new(Some(String::new())).is_enabled());
        assert!(YoloVision::new(Some("http://localhost:8000/".to_string())).is_enabled());
        assert!(YoloVision::new(None).requires_screenshot());
    }

    #[tokio::test]
    async fn test_detections_filtered_by_confidence() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/detect"))
            .and(matchers::body_partial_json(serde_json::json!({"media_type": "image/png"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "detections": [
                    {"class_name": "button", "confidence": 0.92, "bbox": {"x": 40.0, "y": 300.0, "width": 180.0, "height": 50.0}},
                    {"class_name": "image", "confidence": 0.55, "bbox": {"x": 0.0, "y": 120.0, "width": 600.0, "height": 600.0}},
                    {"class_name": "button", "confidence": 0.2, "bbox": {"x": 0.0, "y": 0.0, "width": 10.0, "height": 10.0}}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let adapter = YoloVision::new(Some(server.uri())).with_confidence(0.5);
        let artifact = artifact();
        let finding = adapter.analyze(artifact.screenshot.as_ref(), &artifact).await;

        assert!(finding.is_success(), "{:?}", finding.error);
        let regions = finding
            .observations
            .iter()
            .filter(|o| matches!(o, Observation::Region { .. }))
            .count();
        assert_eq!(regions, 2);
        assert_eq!(finding.category_scores["mobile"], 90);
    }

    #[tokio::test]
    async fn test_service_error() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("model loading"))
            .mount(&server)
            .await;

        let adapter = YoloVision::new(Some(server.uri()));
        let artifact = artifact();
        let finding = adapter.analyze(artifact.screenshot.as_ref(), &artifact).await;

        assert_eq!(
            finding.error,
            Some(ModelFailure::Api {
                status: 503,
                message: "model loading".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_without_screenshot_is_skipped() {
        let adapter = YoloVision::new(Some("http://127.0.0.1:9".to_string()));
        let finding = adapter.analyze(None, &artifact()).await;
        assert!(finding.error.unwrap().is_skip());
    }
}
