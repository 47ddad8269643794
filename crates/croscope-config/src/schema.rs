//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Desktop Chrome user agent used for capture and scraping.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36";

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub vision: VisionConfig,

    #[serde(default)]
    pub capture: CaptureConfig,

    #[serde(default)]
    pub scrape: ScrapeConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Timeouts and run policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_adapter_timeout")]
    pub adapter_timeout_secs: u64,

    #[serde(default = "default_screenshot_timeout")]
    pub screenshot_timeout_secs: u64,

    #[serde(default = "default_scrape_timeout")]
    pub scrape_timeout_secs: u64,

    #[serde(default = "default_cache_timeout_ms")]
    pub cache_timeout_ms: u64,

    /// Keep the screenshot (base64) in the result.
    #[serde(default)]
    pub retain_screenshots: bool,
}

impl EngineConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn adapter_timeout(&self) -> Duration {
        Duration::from_secs(self.adapter_timeout_secs)
    }

    pub fn screenshot_timeout(&self) -> Duration {
        Duration::from_secs(self.screenshot_timeout_secs)
    }

    pub fn scrape_timeout(&self) -> Duration {
        Duration::from_secs(self.scrape_timeout_secs)
    }

    pub fn cache_timeout(&self) -> Duration {
        Duration::from_millis(self.cache_timeout_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
            adapter_timeout_secs: default_adapter_timeout(),
            screenshot_timeout_secs: default_screenshot_timeout(),
            scrape_timeout_secs: default_scrape_timeout(),
            cache_timeout_ms: default_cache_timeout_ms(),
            retain_screenshots: false,
        }
    }
}

fn default_request_timeout() -> u64 {
    120
}

fn default_adapter_timeout() -> u64 {
    30
}

fn default_screenshot_timeout() -> u64 {
    45
}

fn default_scrape_timeout() -> u64 {
    30
}

fn default_cache_timeout_ms() -> u64 {
    500
}

/// Vision backends: static enablement plus per-backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionConfig {
    /// Model identifier to enabled flag. Read once at startup.
    #[serde(default = "default_enabled")]
    pub enabled: BTreeMap<String, bool>,

    #[serde(default)]
    pub claude: ClaudeConfig,

    #[serde(default)]
    pub gemini: GeminiConfig,

    #[serde(default)]
    pub yolo: YoloConfig,
}

impl VisionConfig {
    pub fn is_enabled(&self, model: &str) -> bool {
        self.enabled.get(model).copied().unwrap_or(false)
    }

    /// Enabled model identifiers, sorted.
    pub fn enabled_models(&self) -> Vec<&str> {
        self.enabled
            .iter()
            .filter(|(_, on)| **on)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            claude: ClaudeConfig::default(),
            gemini: GeminiConfig::default(),
            yolo: YoloConfig::default(),
        }
    }
}

fn default_enabled() -> BTreeMap<String, bool> {
    BTreeMap::from([
        ("claude".to_string(), true),
        ("gemini".to_string(), false),
        ("yolo".to_string(), false),
    ])
}

/// Anthropic Messages API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaudeConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_claude_model")]
    pub model: String,

    #[serde(default = "default_claude_base_url")]
    pub base_url: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for ClaudeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_claude_model(),
            base_url: default_claude_base_url(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_claude_model() -> String {
    "claude-3-5-sonnet-20241022".to_string()
}

fn default_claude_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_max_tokens() -> u32 {
    2000
}

/// Gemini `generateContent` settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_gemini_model")]
    pub model: String,

    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_gemini_model(),
            base_url: default_gemini_base_url(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_gemini_model() -> String {
    "gemini-1.5-pro".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

/// Self-hosted UI element detection service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YoloConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Minimum detection confidence kept in findings.
    #[serde(default = "default_confidence")]
    pub confidence: f32,
}

impl Default for YoloConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            confidence: default_confidence(),
        }
    }
}

fn default_confidence() -> f32 {
    0.5
}

/// Browser capture over the Chrome DevTools Protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    #[serde(default = "default_cdp_endpoint")]
    pub cdp_endpoint: String,

    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,

    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,

    #[serde(default)]
    pub mobile: bool,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Extra wait after load for late-rendering content.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    #[serde(default = "default_true")]
    pub full_page: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            cdp_endpoint: default_cdp_endpoint(),
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            mobile: false,
            user_agent: default_user_agent(),
            settle_ms: default_settle_ms(),
            full_page: true,
        }
    }
}

fn default_cdp_endpoint() -> String {
    "http://127.0.0.1:9222".to_string()
}

fn default_viewport_width() -> u32 {
    1920
}

fn default_viewport_height() -> u32 {
    1080
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_settle_ms() -> u64 {
    3000
}

fn default_true() -> bool {
    true
}

/// HTTP fetch for the scraping service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_max_body_bytes() -> usize {
    5 * 1024 * 1024
}

/// Result cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Capacity of the in-memory tier.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Shared SQLite store; memory-only when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sqlite_path: Option<PathBuf>,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            max_entries: default_max_entries(),
            sqlite_path: None,
        }
    }
}

fn default_ttl_secs() -> u64 {
    86400
}

fn default_max_entries() -> usize {
    100
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,

    /// JSON lines on the console instead of text.
    #[serde(default)]
    pub json: bool,

    /// Directory for daily-rotated log files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
            dir: None,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
