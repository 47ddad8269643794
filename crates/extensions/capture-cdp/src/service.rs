//! [`ScreenshotService`] backed by a Chrome instance with remote debugging.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::json;
use tracing::{debug, info};
use url::Url;

use croscope_protocols::{CaptureError, ImageFormat, Screenshot, ScreenshotService, Viewport};

use crate::browser::BrowserEndpoint;
use crate::client::CdpConnection;
use crate::error::CdpError;
use crate::protocol::{CaptureScreenshotParams, DeviceMetrics, evaluated_value};

pub const SERVICE_ID: &str = "cdp";

const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_SETTLE: Duration = Duration::from_secs(3);
const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct CdpScreenshots {
    browser: BrowserEndpoint,
    viewport: Viewport,
    user_agent: Option<String>,
    settle: Duration,
    load_timeout: Duration,
    full_page: bool,
}

impl CdpScreenshots {
    /// `endpoint` is the browser's HTTP debugging address, e.g. `http://127.0.0.1:9222`.
    pub fn new(endpoint: &str) -> Self {
        Self {
            browser: BrowserEndpoint::new(endpoint),
            viewport: Viewport::desktop(),
            user_agent: None,
            settle: DEFAULT_SETTLE,
            load_timeout: DEFAULT_LOAD_TIMEOUT,
            full_page: true,
        }
    }

    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into()).filter(|ua: &String| !ua.is_empty());
        self
    }

    /// Extra wait after the document is complete, for late-rendering content.
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Bound on waiting for `document.readyState` and on each protocol call.
    pub fn with_load_timeout(mut self, load_timeout: Duration) -> Self {
        self.load_timeout = load_timeout;
        self
    }

    pub fn with_full_page(mut self, full_page: bool) -> Self {
        self.full_page = full_page;
        self
    }

    async fn prepare(&self, conn: &CdpConnection) -> Result<(), CdpError> {
        conn.call("Page.enable", None).await?;

        let metrics = DeviceMetrics {
            width: self.viewport.width,
            height: self.viewport.height,
            device_scale_factor: 1.0,
            mobile: self.viewport.mobile,
        };
        conn.call("Emulation.setDeviceMetricsOverride", Some(serde_json::to_value(&metrics)?))
            .await?;

        if let Some(user_agent) = &self.user_agent {
            conn.call("Emulation.setUserAgentOverride", Some(json!({"userAgent": user_agent})))
                .await?;
        }
        Ok(())
    }

    async fn navigate(&self, conn: &CdpConnection, url: &Url) -> Result<(), CdpError> {
        let result = conn.call("Page.navigate", Some(json!({"url": url.as_str()}))).await?;
        if let Some(error) = result.get("errorText").and_then(|e| e.as_str()) {
            return Err(CdpError::NavigationFailed(format!("{}: {}", url, error)));
        }
        self.wait_for_load(conn).await
    }

    async fn wait_for_load(&self, conn: &CdpConnection) -> Result<(), CdpError> {
        let start = Instant::now();
        loop {
            let result = conn
                .call(
                    "Runtime.evaluate",
                    Some(json!({"expression": "document.readyState", "returnByValue": true})),
                )
                .await?;
            if evaluated_value(&result).and_then(|v| v.as_str()) == Some("complete") {
                return Ok(());
            }
            if start.elapsed() > self.load_timeout {
                return Err(CdpError::Timeout {
                    method: "document.readyState".to_string(),
                    after_ms: self.load_timeout.as_millis() as u64,
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn screenshot(&self, conn: &CdpConnection) -> Result<Screenshot, CaptureError> {
        let params = CaptureScreenshotParams {
            format: "png",
            capture_beyond_viewport: self.full_page,
            from_surface: true,
        };
        let result = conn
            .call("Page.captureScreenshot", Some(serde_json::to_value(&params).map_err(CdpError::from)?))
            .await?;

        let data = result["data"]
            .as_str()
            .ok_or_else(|| CaptureError::InvalidImage("missing screenshot data".to_string()))?;
        decode_screenshot(data, self.viewport)
    }

    async fn run(&self, ws_url: &str, url: &Url) -> Result<Screenshot, CaptureError> {
        let conn = CdpConnection::connect(ws_url, self.load_timeout).await?;
        self.prepare(&conn).await?;
        self.navigate(&conn, url).await?;
        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }
        self.screenshot(&conn).await
    }
}

fn decode_screenshot(data: &str, viewport: Viewport) -> Result<Screenshot, CaptureError> {
    let bytes = STANDARD
        .decode(data)
        .map_err(|e| CaptureError::InvalidImage(format!("bad base64: {}", e)))?;
    if bytes.is_empty() {
        return Err(CaptureError::InvalidImage("empty screenshot".to_string()));
    }
    let format = ImageFormat::detect(&bytes)
        .ok_or_else(|| CaptureError::InvalidImage("unrecognized image format".to_string()))?;
    Ok(Screenshot::new(bytes, format, viewport))
}

#[async_trait]
impl ScreenshotService for CdpScreenshots {
    fn id(&self) -> &str {
        SERVICE_ID
    }

    async fn capture(&self, url: &Url) -> Result<Screenshot, CaptureError> {
        let started = Instant::now();
        debug!(endpoint = self.browser.endpoint(), "Opening tab for {}", url);

        let tab = self.browser.open_tab().await?;
        let outcome = self.run(&tab.ws_url, url).await;
        tab.close().await;

        let screenshot = outcome?;
        info!(
            bytes = screenshot.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Captured {}",
            url
        );
        Ok(screenshot)
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
