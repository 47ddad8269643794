//! Configuration validation.

use crate::schema::Config;

/// Models this build knows how to construct.
pub const KNOWN_MODELS: [&str; 3] = ["claude", "gemini", "yolo"];

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_engine(config, &mut result);
        Self::validate_vision(config, &mut result);
        Self::validate_capture(config, &mut result);
        Self::validate_cache(config, &mut result);

        result
    }

    fn validate_engine(config: &Config, result: &mut ValidationResult) {
        let engine = &config.engine;
        let timeouts = [
            ("engine.request_timeout_secs", engine.request_timeout_secs),
            ("engine.adapter_timeout_secs", engine.adapter_timeout_secs),
            ("engine.screenshot_timeout_secs", engine.screenshot_timeout_secs),
            ("engine.scrape_timeout_secs", engine.scrape_timeout_secs),
            ("engine.cache_timeout_ms", engine.cache_timeout_ms),
        ];
        for (path, value) in timeouts {
            if value == 0 {
                result.add_error(ValidationError::new(path, "timeout must be greater than 0"));
            }
        }

        if engine.adapter_timeout_secs >= engine.request_timeout_secs {
            result.add_warning(ValidationWarning::new(
                "engine.adapter_timeout_secs",
                "adapter timeout is not below the request timeout; a slow adapter fails the whole run",
            ));
        }
    }

    fn validate_vision(config: &Config, result: &mut ValidationResult) {
        let vision = &config.vision;

        if vision.enabled_models().is_empty() {
            result.add_warning(ValidationWarning::new(
                "vision.enabled",
                "no vision models enabled, results will be structural-only",
            ));
        }

        for model in vision.enabled_models() {
            if !KNOWN_MODELS.contains(&model) {
                result.add_error(ValidationError::new(
                    format!("vision.enabled.{}", model),
                    format!("unknown model '{}', valid values: {:?}", model, KNOWN_MODELS),
                ));
            }
        }

        if vision.is_enabled("claude") && is_blank(&vision.claude.api_key) {
            result.add_warning(ValidationWarning::new(
                "vision.claude.api_key",
                "claude is enabled but has no API key, it will be disabled",
            ));
        }
        if vision.is_enabled("gemini") && is_blank(&vision.gemini.api_key) {
            result.add_warning(ValidationWarning::new(
                "vision.gemini.api_key",
                "gemini is enabled but has no API key, it will be disabled",
            ));
        }
        if vision.is_enabled("yolo") && is_blank(&vision.yolo.endpoint) {
            result.add_warning(ValidationWarning::new(
                "vision.yolo.endpoint",
                "yolo is enabled but has no endpoint, it will be disabled",
            ));
        }

        let urls = [
            ("vision.claude.base_url", Some(&vision.claude.base_url)),
            ("vision.gemini.base_url", Some(&vision.gemini.base_url)),
            ("vision.yolo.endpoint", vision.yolo.endpoint.as_ref()),
        ];
        for (path, url) in urls {
            if let Some(url) = url {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    result.add_error(ValidationError::new(
                        path,
                        "must start with http:// or https://",
                    ));
                }
            }
        }

        if !(0.0..=1.0).contains(&vision.yolo.confidence) {
            result.add_error(ValidationError::new(
                "vision.yolo.confidence",
                "confidence must be between 0.0 and 1.0",
            ));
        }
    }

    fn validate_capture(config: &Config, result: &mut ValidationResult) {
        let capture = &config.capture;

        if capture.viewport_width == 0 || capture.viewport_height == 0 {
            result.add_error(ValidationError::new(
                "capture.viewport",
                "viewport width and height must be greater than 0",
            ));
        }

        let endpoint = &capture.cdp_endpoint;
        if !["http://", "https://", "ws://", "wss://"]
            .iter()
            .any(|scheme| endpoint.starts_with(scheme))
        {
            result.add_error(ValidationError::new(
                "capture.cdp_endpoint",
                "must be an http(s) or ws(s) URL",
            ));
        }

        if capture.settle_ms >= config.engine.screenshot_timeout_secs.saturating_mul(1000) {
            result.add_warning(ValidationWarning::new(
                "capture.settle_ms",
                "settle delay exceeds the screenshot timeout, every capture will time out",
            ));
        }
    }

    fn validate_cache(config: &Config, result: &mut ValidationResult) {
        if config.cache.ttl_secs == 0 {
            result.add_warning(ValidationWarning::new(
                "cache.ttl_secs",
                "TTL is 0, cached entries expire immediately",
            ));
        }

        if config.cache.max_entries == 0 {
            result.add_warning(ValidationWarning::new(
                "cache.max_entries",
                "in-memory cache capacity is 0, only the shared store is used",
            ));
        }
    }
}

/// Unset, or set to an empty string by `${VAR:-}` expansion.
fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|v| v.trim().is_empty())
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
