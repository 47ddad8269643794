//! Tab lifecycle through the browser's HTTP debugging endpoint.

use tracing::{debug, warn};

use crate::error::CdpError;
use crate::protocol::PageInfo;

#[derive(Clone)]
pub struct BrowserEndpoint {
    http_endpoint: String,
    client: reqwest::Client,
}

impl BrowserEndpoint {
    pub fn new(endpoint: &str) -> Self {
        Self {
            http_endpoint: endpoint.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.http_endpoint
    }

    /// Open a blank tab. The returned guard closes it when dropped.
    pub async fn open_tab(&self) -> Result<Tab, CdpError> {
        // Chrome requires PUT for /json/new
        let url = format!("{}/json/new?about:blank", self.http_endpoint);
        let unavailable = |e: reqwest::Error| CdpError::ChromeNotAvailable(format!("{}: {}", self.http_endpoint, e));

        let response = self.client.put(&url).send().await.map_err(unavailable)?;
        if !response.status().is_success() {
            return Err(CdpError::ChromeNotAvailable(format!(
                "{}: HTTP {}",
                self.http_endpoint,
                response.status()
            )));
        }
        let page: PageInfo = response.json().await.map_err(unavailable)?;

        let ws_url = page.web_socket_debugger_url.ok_or_else(|| {
            CdpError::InvalidResponse(format!("tab {} has no webSocketDebuggerUrl", page.id))
        })?;
        debug!("Opened tab {}", page.id);

        Ok(Tab {
            ws_url,
            target_id: Some(page.id),
            browser: self.clone(),
        })
    }

    async fn close_tab(&self, target_id: &str) -> Result<(), CdpError> {
        let url = format!("{}/json/close/{}", self.http_endpoint, target_id);
        self.client
            .get(&url)
            .send()
            .await
            .map_err(|e| CdpError::ChromeNotAvailable(format!("{}: {}", self.http_endpoint, e)))?;
        debug!("Closed tab {}", target_id);
        Ok(())
    }
}

/// An open tab. Closed explicitly with [`Tab::close`], or in the background on drop.
pub struct Tab {
    pub ws_url: String,
    target_id: Option<String>,
    browser: BrowserEndpoint,
}

impl Tab {
    pub async fn close(mut self) {
        if let Some(id) = self.target_id.take() {
            if let Err(e) = self.browser.close_tab(&id).await {
                warn!("Failed to close tab {}: {}", id, e);
            }
        }
    }
}

impl Drop for Tab {
    fn drop(&mut self) {
        let Some(id) = self.target_id.take() else {
            return;
        };
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("Tab {} leaked: no runtime to close it", id);
            return;
        };
        let browser = self.browser.clone();
        handle.spawn(async move {
            if let Err(e) = browser.close_tab(&id).await {
                warn!("Failed to close tab {}: {}", id, e);
            }
        });
    }
}
