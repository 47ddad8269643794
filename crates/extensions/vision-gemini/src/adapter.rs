//! Gemini vision adapter.

use async_trait::async_trait;
use tracing::debug;

use croscope_protocols::{
    CaptureArtifact, ModelFailure, ModelVerdict, Screenshot, VisionAdapter, VisionFinding,
    build_cro_prompt,
};

use crate::types::{
    Content, GeminiError, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    InlineData, Part,
};

pub const MODEL_ID: &str = "gemini";

const DEFAULT_MODEL: &str = "gemini-1.5-pro";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MAX_TOKENS: u32 = 2000;

/// Sends the screenshot and CRO prompt to Gemini `generateContent`.
pub struct GeminiVision {
    api_key: Option<String>,
    model: String,
    base_url: String,
    max_tokens: u32,
    client: reqwest::Client,
}

impl GeminiVision {
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

    fn build_request(&self, screenshot: &Screenshot, artifact: &CaptureArtifact) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![
                    Part::Text {
                        text: build_cro_prompt(artifact),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: screenshot.format.media_type().to_string(),
                            data: screenshot.to_base64(),
                        },
                    },
                ],
            }],
            generation_config: Some(GenerationConfig {
                temperature: Some(0.2),
                max_output_tokens: Some(self.max_tokens),
            }),
        }
    }

    async fn generate_content(
        &self,
        api_key: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, ModelFailure> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, api_key
        );

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| ModelFailure::network(e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ModelFailure::network(e.without_url().to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<GeminiError>(&body)
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
        debug!(model = %self.model, image_bytes = screenshot.len(), "Sending Gemini vision request");
        let response = self.generate_content(api_key, &request).await?;

        if let Some(reason) = response
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            return Err(ModelFailure::invalid_response(format!("prompt blocked: {}", reason)));
        }

        let text = response
            .text()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ModelFailure::invalid_response("no candidate text"))?;
        Ok(ModelVerdict::parse(&text)?.into_finding(MODEL_ID))
    }
}

#[async_trait]
impl VisionAdapter for GeminiVision {
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
