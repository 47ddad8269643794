//! Analysis requests and run identity.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::error::RequestError;

/// Identifier shared by every event, artifact and result of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A validated request to analyze one page.
///
/// Fields are private: a request is validated once on construction and is
/// immutable after the engine accepts it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisRequest {
    target: Url,
    #[serde(skip_serializing_if = "Option::is_none")]
    client_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    models: Option<Vec<String>>,
}

impl AnalysisRequest {
    /// Parse and validate the target URL (absolute, http or https, with a host).
    pub fn new(target: &str) -> Result<Self, RequestError> {
        let url = Url::parse(target.trim()).map_err(|e| RequestError::InvalidUrl(e.to_string()))?;

        match url.scheme() {
            "http" | "https" => {}
            other => return Err(RequestError::UnsupportedScheme(other.to_string())),
        }

        if url.host_str().is_none_or(str::is_empty) {
            return Err(RequestError::MissingHost(target.to_string()));
        }

        Ok(Self {
            target: url,
            client_label: None,
            models: None,
        })
    }

    pub fn with_client_label(mut self, label: impl Into<String>) -> Self {
        self.client_label = Some(label.into());
        self
    }

    /// Restrict the run to a subset of the enabled models.
    pub fn with_models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut models: Vec<String> = models.into_iter().map(Into::into).collect();
        models.sort();
        models.dedup();
        self.models = Some(models);
        self
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    pub fn client_label(&self) -> Option<&str> {
        self.client_label.as_deref()
    }

    pub fn models(&self) -> Option<&[String]> {
        self.models.as_deref()
    }

    /// Canonical form of the target used for cache keys.
    pub fn normalized_target(&self) -> String {
        normalize_url(&self.target)
    }
}

/// Canonicalize a URL: no fragment, sorted query pairs, no trailing slash on
/// non-root paths. Host case and default ports are already normalized by the
/// URL parser.
pub fn normalize_url(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);

    let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    if pairs.is_empty() {
        url.set_query(None);
    } else {
        pairs.sort();
        url.query_pairs_mut().clear().extend_pairs(pairs);
    }

    let path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        url.set_path(path.trim_end_matches('/'));
    }

    url.to_string()
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
