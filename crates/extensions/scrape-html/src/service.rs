//! [`ScrapingService`] over plain HTTP.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use tracing::{debug, info};
use url::Url;

use croscope_protocols::{DomFacts, ExtractionError, ScrapingService};

use crate::extract::extract;

pub const SERVICE_ID: &str = "html";

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8";

pub struct HtmlScraper {
    client: reqwest::Client,
    user_agent: String,
    max_body_bytes: usize,
}

impl HtmlScraper {
    pub fn new(user_agent: impl Into<String>, max_body_bytes: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            user_agent: user_agent.into(),
            max_body_bytes,
        }
    }

    async fn fetch(&self, url: &Url) -> Result<String, ExtractionError> {
        let mut response = self
            .client
            .get(url.clone())
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, ACCEPT_HTML)
            .send()
            .await
            .map_err(|e| ExtractionError::Unreachable(format!("{}: {}", url, e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractionError::HttpStatus {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }

        if let Some(content_type) = response.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) {
            let content_type = content_type.to_ascii_lowercase();
            if !content_type.contains("html") && !content_type.contains("xml") {
                return Err(ExtractionError::Malformed(format!(
                    "unsupported content type: {}",
                    content_type
                )));
            }
        }

        let limit = self.max_body_bytes;
        if let Some(size) = response.content_length().map(|n| n as usize) {
            if size > limit {
                return Err(ExtractionError::TooLarge { size, limit });
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ExtractionError::Unreachable(format!("{}: {}", url, e.without_url())))?
        {
            body.extend_from_slice(&chunk);
            if body.len() > limit {
                return Err(ExtractionError::TooLarge { size: body.len(), limit });
            }
        }

        let html = String::from_utf8_lossy(&body).into_owned();
        if html.trim().is_empty() {
            return Err(ExtractionError::Malformed("empty document".to_string()));
        }
        Ok(html)
    }
}

#[async_trait]
impl ScrapingService for HtmlScraper {
    fn id(&self) -> &str {
        SERVICE_ID
    }

    async fn extract(&self, url: &Url) -> Result<DomFacts, ExtractionError> {
        let html = self.fetch(url).await?;
        debug!(bytes = html.len(), "Fetched {}", url);

        let page_url = url.clone();
        let facts = tokio::task::spawn_blocking(move || extract(&html, &page_url))
            .await
            .map_err(|e| ExtractionError::Malformed(format!("extraction task failed: {}", e)))?;

        info!(
            ctas = facts.ctas.len(),
            forms = facts.forms.len(),
            images = facts.images.len(),
            trust_signals = facts.trust_signals.len(),
            "Extracted DOM facts from {}",
            url
        );
        Ok(facts)
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
