//! Component construction from configuration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use croscope_cache_sqlite::SqliteCache;
use croscope_capture_cdp::CdpScreenshots;
use croscope_config::{CacheConfig, Config, ConfigLoader};
use croscope_core::{AdapterRegistry, AnalysisEngine, EngineOptions, TieredCache, VisionManager};
use croscope_protocols::{CacheStore, Viewport, VisionAdapter};
use croscope_scrape_html::HtmlScraper;
use croscope_vision_claude::ClaudeVision;
use croscope_vision_gemini::GeminiVision;
use croscope_vision_yolo::YoloVision;

/// Register every known adapter, configured or not; readiness is decided by each adapter.
pub(crate) fn build_registry(config: &Config) -> anyhow::Result<AdapterRegistry> {
    let vision = &config.vision;
    let registry = AdapterRegistry::new();

    let claude = ClaudeVision::new(vision.claude.api_key.clone())
        .with_model(vision.claude.model.clone())
        .with_base_url(vision.claude.base_url.clone())
        .with_max_tokens(vision.claude.max_tokens);
    registry.register(Arc::new(claude) as Arc<dyn VisionAdapter>)?;

    let gemini = GeminiVision::new(vision.gemini.api_key.clone())
        .with_model(vision.gemini.model.clone())
        .with_base_url(vision.gemini.base_url.clone())
        .with_max_tokens(vision.gemini.max_tokens);
    registry.register(Arc::new(gemini) as Arc<dyn VisionAdapter>)?;

    let yolo = YoloVision::new(vision.yolo.endpoint.clone()).with_confidence(vision.yolo.confidence);
    registry.register(Arc::new(yolo) as Arc<dyn VisionAdapter>)?;

    Ok(registry)
}

pub(crate) fn engine_options(config: &Config) -> EngineOptions {
    let engine = &config.engine;
    EngineOptions {
        request_timeout: engine.request_timeout(),
        screenshot_timeout: engine.screenshot_timeout(),
        scrape_timeout: engine.scrape_timeout(),
        cache_timeout: engine.cache_timeout(),
        cache_ttl: config.cache.ttl(),
        retain_screenshots: engine.retain_screenshots,
    }
}

fn screenshot_service(config: &Config) -> CdpScreenshots {
    let capture = &config.capture;
    CdpScreenshots::new(&capture.cdp_endpoint)
        .with_viewport(Viewport {
            width: capture.viewport_width,
            height: capture.viewport_height,
            mobile: capture.mobile,
        })
        .with_user_agent(capture.user_agent.clone())
        .with_settle(Duration::from_millis(capture.settle_ms))
        .with_full_page(capture.full_page)
}

/// Memory tier always; SQLite behind it when a path is configured and opens.
async fn cache_store(cache: &CacheConfig) -> TieredCache {
    let tiered = TieredCache::new(cache.max_entries, cache.ttl());

    let Some(path) = &cache.sqlite_path else {
        return tiered;
    };
    let path = PathBuf::from(ConfigLoader::expand_path(&path.to_string_lossy()));
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            warn!(path = %path.display(), error = %e, "Cannot create cache directory, using memory cache only");
            return tiered;
        }
    }

    match SqliteCache::open(&path).await {
        Ok(store) => tiered.with_shared(Arc::new(store)),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Cannot open SQLite cache, using memory cache only");
            tiered
        }
    }
}

pub(crate) async fn build_engine(config: &Config) -> anyhow::Result<AnalysisEngine> {
    let registry = build_registry(config)?;
    let vision = VisionManager::new(
        &registry,
        &config.vision.enabled,
        config.engine.adapter_timeout(),
    );

    let screenshots = Arc::new(screenshot_service(config));
    let scraper = Arc::new(HtmlScraper::new(
        config.scrape.user_agent.clone(),
        config.scrape.max_body_bytes,
    ));
    let cache: Arc<dyn CacheStore> = Arc::new(cache_store(&config.cache).await);

    info!(
        cdp = %config.capture.cdp_endpoint,
        sqlite = config.cache.sqlite_path.is_some(),
        "Components constructed"
    );

    Ok(AnalysisEngine::new(
        Arc::new(vision),
        screenshots,
        scraper,
        cache,
        engine_options(config),
    ))
}
