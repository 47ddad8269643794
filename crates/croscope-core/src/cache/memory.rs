//! Bounded in-memory cache with per-entry TTL.

use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;
use tracing::debug;

use croscope_protocols::{AnalysisResult, CacheError, CacheKey, CacheStore, CachedEntry};

struct Entry {
    result: AnalysisResult,
    inserted_at: Instant,
    expires_at: Instant,
}

/// Process-local cache. When full, expired entries are purged first, then
/// the oldest entry is evicted.
pub struct MemoryCache {
    entries: DashMap<CacheKey, Entry>,
    max_entries: usize,
}

impl MemoryCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn purge_expired(&self, now: Instant) {
        self.entries.retain(|_, entry| entry.expires_at > now);
    }

    /// Remove `key` only if the stored entry is expired as of `now`; an
    /// entry written after the expiry was observed stays.
    fn drop_if_expired(&self, key: &CacheKey, now: Instant) {
        self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
    }

    fn evict_oldest(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.inserted_at)
            .map(|entry| entry.key().clone());
        if let Some(key) = oldest {
            debug!(key = %key, "Evicting oldest cache entry");
            self.entries.remove(&key);
        }
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    fn id(&self) -> &str {
        "memory"
    }

    async fn get(&self, key: &CacheKey) -> Result<Option<AnalysisResult>, CacheError> {
        Ok(self.get_entry(key).await?.map(|entry| entry.result))
    }

    async fn get_entry(&self, key: &CacheKey) -> Result<Option<CachedEntry>, CacheError> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > now {
                return Ok(Some(CachedEntry {
                    result: entry.result.clone(),
                    remaining: Some(entry.expires_at - now),
                }));
            }
        }
        self.drop_if_expired(key, now);
        Ok(None)
    }

    async fn put(
        &self,
        key: &CacheKey,
        result: &AnalysisResult,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        if self.max_entries == 0 {
            return Ok(());
        }

        let now = Instant::now();
        if !self.entries.contains_key(key) && self.entries.len() >= self.max_entries {
            self.purge_expired(now);
            while self.entries.len() >= self.max_entries {
                self.evict_oldest();
            }
        }

        self.entries.insert(
            key.clone(),
            Entry {
                result: result.clone(),
                inserted_at: now,
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn invalidate(&self, key: &CacheKey) -> Result<(), CacheError> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
