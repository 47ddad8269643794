//! Configuration loader.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::error::ConfigError;
use crate::schema::Config;

static ENV_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}").expect("valid env var pattern")
});

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load configuration from a string.
    pub fn load_str(content: &str) -> Result<Config, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let config: Config = toml::from_str(&expanded)?;
        Ok(config)
    }

    /// Expand `${VAR}` and `${VAR:-default}`. Comment lines are left untouched.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let mut out = String::with_capacity(content.len());

        for line in content.split_inclusive('\n') {
            if line.trim_start().starts_with('#') {
                out.push_str(line);
                continue;
            }

            let mut missing = None;
            let expanded = ENV_VAR.replace_all(line, |cap: &Captures<'_>| {
                match (std::env::var(&cap[1]), cap.get(2)) {
                    (Ok(value), _) if !value.is_empty() => value,
                    (_, Some(default)) => default.as_str().to_string(),
                    (Ok(value), None) => value,
                    (Err(_), None) => {
                        missing.get_or_insert_with(|| cap[1].to_string());
                        String::new()
                    }
                }
            });
            if let Some(name) = missing {
                return Err(ConfigError::EnvVarNotSet(name));
            }
            out.push_str(&expanded);
        }

        Ok(out)
    }

    /// Expand shell-style paths (e.g., `~/.cache/croscope`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_empty_config() {
        let config = ConfigLoader::load_str("").unwrap();
        assert_eq!(config.engine.request_timeout_secs, 120);
        assert_eq!(config.cache.ttl_secs, 86400);
    }

    #[test]
    fn test_load_engine_section() {
        let content = r#"
            [engine]
            request_timeout_secs = 60
            adapter_timeout_secs = 10
            retain_screenshots = true
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.engine.request_timeout_secs, 60);
        assert_eq!(config.engine.adapter_timeout_secs, 10);
        assert_eq!(config.engine.screenshot_timeout_secs, 45);
        assert!(config.engine.retain_screenshots);
    }

    #[test]
    fn test_load_vision_section() {
        let content = r#"
            [vision.enabled]
            claude = true
            yolo = true
            gemini = false

            [vision.claude]
            api_key = "sk-test"

            [vision.yolo]
            endpoint = "http://localhost:8000"
            confidence = 0.4
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.vision.enabled_models(), vec!["claude", "yolo"]);
        assert_eq!(config.vision.claude.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.vision.yolo.endpoint.as_deref(), Some("http://localhost:8000"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[cache]").unwrap();
        writeln!(file, "max_entries = 5").unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.cache.max_entries, 5);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ConfigLoader::load(Path::new("/nonexistent/path/croscope.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_invalid_toml() {
        let result = ConfigLoader::load_str("invalid = [unclosed");
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: test-only variable name, not read by any other test
        unsafe {
            std::env::set_var("CROSCOPE_TEST_CONFIG_VAR", "test_value");
        }
        let content = "value = \"${CROSCOPE_TEST_CONFIG_VAR}\"";
        let expanded = ConfigLoader::expand_env_vars(content).unwrap();
        assert_eq!(expanded, "value = \"test_value\"");
        unsafe {
            std::env::remove_var("CROSCOPE_TEST_CONFIG_VAR");
        }
    }

    #[test]
    fn test_expand_env_vars_default() {
        let content = "endpoint = \"${CROSCOPE_UNSET_VAR_12345:-http://localhost:9222}\"";
        let expanded = ConfigLoader::expand_env_vars(content).unwrap();
        assert_eq!(expanded, "endpoint = \"http://localhost:9222\"");
    }

    #[test]
    fn test_expand_env_vars_not_set() {
        let content = "value = \"${CROSCOPE_UNSET_VAR_12345}\"";
        let result = ConfigLoader::expand_env_vars(content);
        assert!(matches!(result, Err(ConfigError::EnvVarNotSet(ref v)) if v == "CROSCOPE_UNSET_VAR_12345"));
    }

    #[test]
    fn test_expand_skips_comments() {
        let content = "# api_key = \"${CROSCOPE_UNSET_VAR_12345}\"\nvalue = 1\n";
        let expanded = ConfigLoader::expand_env_vars(content).unwrap();
        assert_eq!(expanded, content);
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let expanded = ConfigLoader::expand_path("~/test");
        assert!(!expanded.starts_with('~'));
        assert!(expanded.ends_with("/test"));
    }
}
