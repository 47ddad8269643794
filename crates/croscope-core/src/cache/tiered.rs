//! Two-tier cache: process memory in front of an optional shared store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use croscope_protocols::{AnalysisResult, CacheError, CacheKey, CacheStore, CachedEntry};

use super::MemoryCache;

/// Memory first, then the shared store.
///
/// Shared-store errors are returned after the memory tier has been served,
/// so a caller that treats them as a miss falls back to memory-only caching.
pub struct TieredCache {
    memory: MemoryCache,
    shared: Option<Arc<dyn CacheStore>>,
    /// Upper bound on the TTL of entries promoted from the shared store.
    promote_ttl: Duration,
}

impl TieredCache {
    pub fn new(max_entries: usize, promote_ttl: Duration) -> Self {
        Self {
            memory: MemoryCache::new(max_entries),
            shared: None,
            promote_ttl,
        }
    }

    pub fn with_shared(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.shared = Some(store);
        self
    }

    pub fn has_shared(&self) -> bool {
        self.shared.is_some()
    }

    pub fn memory(&self) -> &MemoryCache {
        &self.memory
    }
}

#[async_trait]
impl CacheStore for TieredCache {
    fn id(&self) -> &str {
        "tiered"
    }

    async fn get(&self, key: &CacheKey) -> Result<Option<AnalysisResult>, CacheError> {
        Ok(self.get_entry(key).await?.map(|entry| entry.result))
    }

    async fn get_entry(&self, key: &CacheKey) -> Result<Option<CachedEntry>, CacheError> {
        if let Some(entry) = self.memory.get_entry(key).await? {
            debug!(key = %key, "Memory cache hit");
            return Ok(Some(entry));
        }

        let Some(shared) = &self.shared else {
            return Ok(None);
        };

        match shared.get_entry(key).await {
            Ok(Some(entry)) => {
                // The promoted copy expires no later than the shared entry.
                let ttl = entry
                    .remaining
                    .map_or(self.promote_ttl, |remaining| remaining.min(self.promote_ttl));
                debug!(key = %key, store = shared.id(), ttl_ms = ttl.as_millis() as u64, "Shared cache hit");
                self.memory.put(key, &entry.result, ttl).await?;
                Ok(Some(CachedEntry {
                    result: entry.result,
                    remaining: Some(ttl),
                }))
            }
            Ok(None) => Ok(None),
            Err(err) => {
                warn!(key = %key, store = shared.id(), error = %err, "Shared cache lookup failed");
                Err(err)
            }
        }
    }

    async fn put(
        &self,
        key: &CacheKey,
        result: &AnalysisResult,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        self.memory.put(key, result, ttl).await?;

        if let Some(shared) = &self.shared {
            if let Err(err) = shared.put(key, result, ttl).await {
                warn!(key = %key, store = shared.id(), error = %err, "Shared cache write failed");
                return Err(err);
            }
        }
        Ok(())
    }

    async fn invalidate(&self, key: &CacheKey) -> Result<(), CacheError> {
        self.memory.invalidate(key).await?;
        if let Some(shared) = &self.shared {
            shared.invalidate(key).await?;
        }
        Ok(())
    }
}
