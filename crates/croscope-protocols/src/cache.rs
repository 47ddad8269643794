//! Cache keys and the storage backend trait.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::CacheError;
use crate::types::AnalysisResult;

/// Prefix of every persisted cache key.
pub const KEY_PREFIX: &str = "cro:analysis:";

/// Content address of a completed analysis.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key from a normalized URL and a model set.
    ///
    /// The model set is sorted and deduplicated here, so callers may pass it
    /// in any order.
    pub fn derive<S: AsRef<str>>(normalized_url: &str, models: &[S]) -> Self {
        let mut models: Vec<&str> = models.iter().map(AsRef::as_ref).collect();
        models.sort_unstable();
        models.dedup();

        let mut hasher = Sha256::new();
        hasher.update(normalized_url.as_bytes());
        hasher.update(b"\n");
        hasher.update(models.join(",").as_bytes());

        Self(format!("{}{}", KEY_PREFIX, hex::encode(hasher.finalize())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A cache hit with the time it has left to live.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedEntry {
    pub result: AnalysisResult,
    /// `None` when the backend does not track expiry.
    pub remaining: Option<Duration>,
}

/// Storage backend for completed analyses.
///
/// Entries are written whole and never updated in place; `put` on an existing
/// key replaces the entry. Expired entries must read as absent.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Backend identifier used in logs.
    fn id(&self) -> &str;

    async fn get(&self, key: &CacheKey) -> Result<Option<AnalysisResult>, CacheError>;

    /// Like [`get`](Self::get), also reporting how long the entry stays valid.
    ///
    /// Tiers that copy entries from this store use `remaining` so the copy
    /// never outlives the original.
    async fn get_entry(&self, key: &CacheKey) -> Result<Option<CachedEntry>, CacheError> {
        Ok(self.get(key).await?.map(|result| CachedEntry {
            result,
            remaining: None,
        }))
    }

    async fn put(
        &self,
        key: &CacheKey,
        result: &AnalysisResult,
        ttl: Duration,
    ) -> Result<(), CacheError>;

    async fn invalidate(&self, key: &CacheKey) -> Result<(), CacheError>;
}
