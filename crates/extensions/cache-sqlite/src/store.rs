//! [`CacheStore`] implementation over SQLite.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{OptionalExtension, params};
use tokio_rusqlite::Connection;
use tracing::{debug, info};

use croscope_protocols::{AnalysisResult, CacheError, CacheKey, CacheStore, CachedEntry};

use crate::schema::init_schema;

pub struct SqliteCache {
    conn: Connection,
}

impl SqliteCache {
    /// In-memory database, private to this process.
    pub async fn in_memory() -> Result<Self, CacheError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| CacheError::Unavailable(e.to_string()))?;
        Self::init(conn).await
    }

    /// File-backed database, created if missing.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(path.clone())
            .await
            .map_err(|e| CacheError::Unavailable(format!("{}: {}", path.display(), e)))?;
        let cache = Self::init(conn).await?;

        let purged = cache.purge_expired().await?;
        info!(path = %path.display(), purged, "Opened SQLite cache");
        Ok(cache)
    }

    async fn init(conn: Connection) -> Result<Self, CacheError> {
        conn.call(|conn| Ok(init_schema(conn)?))
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Delete every expired row. Returns how many were removed.
    pub async fn purge_expired(&self) -> Result<usize, CacheError> {
        let now = Utc::now().timestamp_millis();
        self.conn
            .call(move |conn| Ok(conn.execute("DELETE FROM analyses WHERE expires_at <= ?1", [now])?))
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))
    }
}

#[async_trait]
impl CacheStore for SqliteCache {
    fn id(&self) -> &str {
        "sqlite"
    }

    async fn get(&self, key: &CacheKey) -> Result<Option<AnalysisResult>, CacheError> {
        Ok(self.get_entry(key).await?.map(|entry| entry.result))
    }

    async fn get_entry(&self, key: &CacheKey) -> Result<Option<CachedEntry>, CacheError> {
        let key = key.to_string();
        let now = Utc::now().timestamp_millis();

        let row: Option<(String, i64)> = self
            .conn
            .call({
                let key = key.clone();
                move |conn| {
                    let row = conn
                        .query_row(
                            "SELECT value, expires_at FROM analyses WHERE key = ?1",
                            [&key],
                            |row| Ok((row.get(0)?, row.get(1)?)),
                        )
                        .optional()?;
                    Ok(row)
                }
            })
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))?;

        match row {
            Some((value, expires_at)) if expires_at > now => {
                let remaining = u64::try_from(expires_at - now).unwrap_or(0);
                Ok(Some(CachedEntry {
                    result: serde_json::from_str(&value)?,
                    remaining: Some(Duration::from_millis(remaining)),
                }))
            }
            Some(_) => {
                debug!(key = %key, "Dropping expired cache row");
                self.conn
                    .call(move |conn| {
                        conn.execute("DELETE FROM analyses WHERE key = ?1 AND expires_at <= ?2", params![key, now])?;
                        Ok(())
                    })
                    .await
                    .map_err(|e| CacheError::Backend(e.to_string()))?;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn put(
        &self,
        key: &CacheKey,
        result: &AnalysisResult,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let key = key.to_string();
        let value = serde_json::to_string(result)?;
        let now = Utc::now();
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let expires_at = now.timestamp_millis().saturating_add(ttl_ms);
        let created_at = now.to_rfc3339();

        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT OR REPLACE INTO analyses (key, value, expires_at, created_at)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![key, value, expires_at, created_at],
                )?;
                Ok(())
            })
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))
    }

    async fn invalidate(&self, key: &CacheKey) -> Result<(), CacheError> {
        let key = key.to_string();
        self.conn
            .call(move |conn| {
                conn.execute("DELETE FROM analyses WHERE key = ?1", [&key])?;
                Ok(())
            })
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
