//! Claude vision adapter.

use async_trait::async_trait;
use tracing::debug;

use croscope_protocols::{
    CaptureArtifact, ModelFailure, ModelVerdict, Screenshot, VisionAdapter, VisionFinding,
    build_cro_prompt,
};

use crate::api::{ApiErrorEnvelope, ApiMessage, ApiRequest, ApiResponse, ContentBlock, ImageSource};

/// Identifier used in cache keys and result attribution.
pub const MODEL_ID: &str = "claude";

const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 2000;

/// Sends the screenshot and CRO prompt to the Anthropic Messages API.
pub struct ClaudeVision {
    api_key: Option<String>,
    model: String,
    base_url: String,
    max_tokens: u32,
    client: reqwest::Client,
}

impl ClaudeVision {
    /// Without a non-empty key the adapter reports itself disabled.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn build_request(&self, screenshot: &Screenshot, artifact: &CaptureArtifact) -> ApiRequest {
        ApiRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            messages: vec![ApiMessage {
                role: "user".to_string(),
                content: vec![
                    ContentBlock::Image {
                        source: ImageSource::base64(
                            screenshot.format.media_type(),
                            screenshot.to_base64(),
                        ),
                    },
                    ContentBlock::Text {
                        text: build_cro_prompt(artifact),
                    },
                ],
            }],
        }
    }

    async fn send(&self, api_key: &str, request: &ApiRequest) -> Result<ApiResponse, ModelFailure> {
        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| ModelFailure::network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ModelFailure::network(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(ModelFailure::from_status(status.as_u16(), message));
        }

        serde_json::from_str(&body)
            .map_err(|e| ModelFailure::invalid_response(format!("unexpected response body: {}", e)))
    }

    async fn run(
        &self,
        screenshot: Option<&Screenshot>,
        artifact: &CaptureArtifact,
    ) -> Result<VisionFinding, ModelFailure> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ModelFailure::skipped("no API key configured"))?;
        let screenshot = screenshot.ok_or_else(|| ModelFailure::skipped("no screenshot available"))?;
        if screenshot.is_empty() {
            return Err(ModelFailure::MalformedInput {
                message: "empty screenshot".to_string(),
            });
        }

        let request = self.build_request(screenshot, artifact);
        debug!(model = %self.model, image_bytes = screenshot.len(), "Sending Claude vision request");
        let response = self.send(api_key, &request).await?;

        let text = response.text();
        if text.trim().is_empty() {
            return Err(ModelFailure::invalid_response("empty completion"));
        }
        Ok(ModelVerdict::parse(&text)?.into_finding(MODEL_ID))
    }
}

#[async_trait]
impl VisionAdapter for ClaudeVision {
    fn name(&self) -> &str {
        MODEL_ID
    }

    fn is_enabled(&self) -> bool {
        self.api_key.is_some()
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
#[path = "adapter_tests.rs"]
mod tests;
