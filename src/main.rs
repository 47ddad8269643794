//! croscope - Conversion-rate-optimization page analyzer
//!
//! Main entry point for the croscope CLI.

mod cli;
mod cmd_analyze;
mod cmd_config;
mod register;

use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::{debug, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use croscope_config::{Config, ConfigError, ConfigLoader, LoggingConfig};

use cli::{Cli, Commands, ConfigAction};

const LOCAL_CONFIG: &str = "config/croscope.toml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (config_path, explicit) = match cli.config {
        Some(path) => (path, true),
        None => (default_config_path(), false),
    };
    let (config, loaded) = load_config(&config_path, explicit)?;

    init_tracing(&config.logging)?;
    if loaded {
        debug!(path = %config_path.display(), "Loaded configuration");
    } else {
        warn!(path = %config_path.display(), "No configuration file found, using defaults");
    }

    match cli.command {
        Commands::Analyze {
            url,
            label,
            models,
            refresh,
            json,
        } => {
            let options = cmd_analyze::AnalyzeOptions {
                label,
                models,
                refresh,
                json,
            };
            cmd_analyze::run(&config, &url, options).await
        }
        Commands::Models => cmd_config::models(&config),
        Commands::Config { action } => match action {
            ConfigAction::Check => cmd_config::check(&config, &config_path),
            ConfigAction::Show => cmd_config::show(&config),
        },
    }
}

/// `./config/croscope.toml` when present, otherwise `<user config dir>/croscope/config.toml`.
fn default_config_path() -> PathBuf {
    let local = PathBuf::from(LOCAL_CONFIG);
    if local.exists() {
        return local;
    }
    dirs::config_dir()
        .map(|dir| dir.join("croscope").join("config.toml"))
        .unwrap_or(local)
}

/// A missing file is only an error when the path was given explicitly.
fn load_config(path: &Path, explicit: bool) -> anyhow::Result<(Config, bool)> {
    match ConfigLoader::load(path) {
        Ok(config) => Ok((config, true)),
        Err(ConfigError::NotFound(_)) if !explicit => Ok((Config::default(), false)),
        Err(e) => Err(e.into()),
    }
}

fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    // Console output goes to stderr so `analyze --json` keeps stdout clean
    let console_text = (!logging.json).then(|| {
        fmt::layer()
            .with_target(true)
            .with_ansi(true)
            .with_writer(std::io::stderr)
    });
    let console_json = logging
        .json
        .then(|| fmt::layer().json().with_writer(std::io::stderr));

    let file = match &logging.dir {
        Some(dir) => {
            let dir = PathBuf::from(ConfigLoader::expand_path(&dir.to_string_lossy()));
            std::fs::create_dir_all(&dir)?;

            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("croscope")
                .filename_suffix("log")
                .max_log_files(30)
                .build(&dir)?;
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);

            // Keeps the background writer alive for the life of the process
            static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
                std::sync::OnceLock::new();
            let _ = GUARD.set(guard);

            Some(fmt::layer().with_writer(non_blocking).with_ansi(false))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_text)
        .with(console_json)
        .with(file)
        .init();

    Ok(())
}
