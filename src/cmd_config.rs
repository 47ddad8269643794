//! `croscope models` and `croscope config` commands.

use std::path::Path;

use anyhow::bail;

use croscope_config::{Config, ConfigValidator, ValidationResult};

use crate::register;

pub(crate) fn models(config: &Config) -> anyhow::Result<()> {
    let registry = register::build_registry(config)?;

    println!("{:<10} {:<10} {}", "MODEL", "CONFIG", "STATUS");
    for name in registry.list_ids() {
        let enabled = config.vision.is_enabled(&name);
        let ready = registry.get(&name).is_some_and(|adapter| adapter.is_enabled());
        println!("{:<10} {:<10} {}", name, on_off(enabled), status(enabled, ready));
    }
    Ok(())
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "enabled" } else { "disabled" }
}

fn status(enabled: bool, ready: bool) -> &'static str {
    match (enabled, ready) {
        (true, true) => "active",
        (true, false) => "not ready (missing credentials or endpoint)",
        (false, true) => "ready, not enabled",
        (false, false) => "-",
    }
}

pub(crate) fn check(config: &Config, path: &Path) -> anyhow::Result<()> {
    let result = ConfigValidator::validate(config);
    print!("{}", render_report(&result, path));

    if !result.is_valid() {
        bail!("configuration has {} error(s)", result.errors.len());
    }
    Ok(())
}

fn render_report(result: &ValidationResult, path: &Path) -> String {
    let mut out = format!("Checking {}\n", path.display());
    for error in &result.errors {
        out.push_str(&format!("  error   {}: {}\n", error.path, error.message));
    }
    for warning in &result.warnings {
        out.push_str(&format!("  warning {}: {}\n", warning.path, warning.message));
    }
    if result.is_valid() {
        out.push_str(&format!("OK ({} warning(s))\n", result.warnings.len()));
    }
    out
}

/// Print the effective configuration with credentials masked.
pub(crate) fn show(config: &Config) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&redacted(config))?);
    Ok(())
}

fn redacted(config: &Config) -> Config {
    let mut config = config.clone();
    let mask = |key: &mut Option<String>| {
        if key.is_some() {
            *key = Some("***".to_string());
        }
    };
    mask(&mut config.vision.claude.api_key);
    mask(&mut config.vision.gemini.api_key);
    config
}
