use super::*;
use croscope_protocols::{DomFacts, RunId, VisionFinding};

fn sample(target: &str) -> AnalysisResult {
    AnalysisResult {
        run_id: RunId::new(),
        target: url::Url::parse(target).unwrap(),
        client_label: Some("nightly".to_string()),
        models: vec!["claude".to_string()],
        findings: vec![VisionFinding::success("claude", 0.8)],
        failures: Vec::new(),
        structural: None,
        elements: DomFacts {
            title: Some("Shop".to_string()),
            ..Default::default()
        },
        summary: Default::default(),
        degradations: Vec::new(),
        screenshot: None,
        completed_at: Utc::now(),
    }
}

fn key(url: &str) -> CacheKey {
    CacheKey::derive(url, &["claude"])
}

#[tokio::test]
async fn test_backend_id() {
    let cache = SqliteCache::in_memory().await.unwrap();
    assert_eq!(cache.id(), "sqlite");
}

#[tokio::test]
async fn test_put_then_get() {
    let cache = SqliteCache::in_memory().await.unwrap();
    let k = key("https://example.com/");
    let result = sample("https://example.com/");

    assert!(cache.get(&k).await.unwrap().is_none());
    cache.put(&k, &result, Duration::from_secs(60)).await.unwrap();
    assert_eq!(cache.get(&k).await.unwrap(), Some(result));
}

#[tokio::test]
async fn test_put_replaces_entry() {
    let cache = SqliteCache::in_memory().await.unwrap();
    let k = key("https://example.com/");
    let first = sample("https://example.com/");
    let second = sample("https://example.com/");

    cache.put(&k, &first, Duration::from_secs(60)).await.unwrap();
    cache.put(&k, &second, Duration::from_secs(60)).await.unwrap();

    let stored = cache.get(&k).await.unwrap().unwrap();
    assert_eq!(stored.run_id, second.run_id);
}

#[tokio::test]
async fn test_entry_reports_remaining_ttl() {
    let cache = SqliteCache::in_memory().await.unwrap();
    let k = key("https://example.com/");
    cache
        .put(&k, &sample("https://example.com/"), Duration::from_secs(60))
        .await
        .unwrap();

    let remaining = cache.get_entry(&k).await.unwrap().unwrap().remaining.unwrap();
    assert!(remaining <= Duration::from_secs(60));
    assert!(remaining > Duration::from_secs(50));
}

#[tokio::test]
async fn test_expired_entry_reads_as_absent() {
    let cache = SqliteCache::in_memory().await.unwrap();
    let k = key("https://example.com/");
    cache
        .put(&k, &sample("https://example.com/"), Duration::ZERO)
        .await
        .unwrap();

    assert!(cache.get(&k).await.unwrap().is_none());
    // The expired row was removed on read.
    assert_eq!(cache.purge_expired().await.unwrap(), 0);
}

#[tokio::test]
async fn test_purge_expired() {
    let cache = SqliteCache::in_memory().await.unwrap();
    cache
        .put(&key("https://a.example/"), &sample("https://a.example/"), Duration::ZERO)
        .await
        .unwrap();
    cache
        .put(&key("https://b.example/"), &sample("https://b.example/"), Duration::ZERO)
        .await
        .unwrap();
    cache
        .put(&key("https://c.example/"), &sample("https://c.example/"), Duration::from_secs(3600))
        .await
        .unwrap();

    assert_eq!(cache.purge_expired().await.unwrap(), 2);
    assert!(cache.get(&key("https://c.example/")).await.unwrap().is_some());
}

#[tokio::test]
async fn test_invalidate() {
    let cache = SqliteCache::in_memory().await.unwrap();
    let k = key("https://example.com/");
    cache
        .put(&k, &sample("https://example.com/"), Duration::from_secs(60))
        .await
        .unwrap();

    cache.invalidate(&k).await.unwrap();
    assert!(cache.get(&k).await.unwrap().is_none());

    // Invalidating a missing key is not an error.
    cache.invalidate(&k).await.unwrap();
}

#[tokio::test]
async fn test_corrupt_row_is_serialization_error() {
    let cache = SqliteCache::in_memory().await.unwrap();
    let k = key("https://example.com/");
    let raw_key = k.to_string();
    cache
        .conn
        .call(move |conn| {
            conn.execute(
                "INSERT INTO analyses (key, value, expires_at, created_at) VALUES (?1, '{not json', ?2, 'now')",
                params![raw_key, i64::MAX],
            )?;
            Ok(())
        })
        .await
        .unwrap();

    let err = cache.get(&k).await.unwrap_err();
    assert!(matches!(err, CacheError::Serialization(_)));
}

#[tokio::test]
async fn test_file_backed_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.db");
    let k = key("https://example.com/");
    let result = sample("https://example.com/");

    {
        let cache = SqliteCache::open(&path).await.unwrap();
        cache.put(&k, &result, Duration::from_secs(3600)).await.unwrap();
    }

    let reopened = SqliteCache::open(&path).await.unwrap();
    assert_eq!(reopened.get(&k).await.unwrap(), Some(result));
}
