//! In-process cache backend using `moka`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;

use super::{CacheBackend, CacheError};

#[derive(Clone)]
struct Entry {
    value: Arc<str>,
    ttl: Duration,
}

/// Expires each entry after the TTL it was written with.
struct PerEntryTtl;

impl Expiry<String, Entry> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Entry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Bounded in-memory backend with per-entry expiry.
///
/// Local to the process: two engine instances each hold their own copy, so
/// an eviction in one is not seen by the other until the TTL runs out.
#[derive(Clone)]
pub struct MokaCacheBackend {
    cache: Cache<String, Entry>,
}

impl MokaCacheBackend {
    /// Create a backend holding at most `max_capacity` entries.
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryTtl)
            .build();
        Self { cache }
    }

    /// Approximate number of live entries.
    pub async fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }
}

impl std::fmt::Debug for MokaCacheBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaCacheBackend")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

#[async_trait]
impl CacheBackend for MokaCacheBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.cache.get(key).await.map(|e| e.value.to_string()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        self.cache
            .insert(
                key.to_string(),
                Entry {
                    value: Arc::from(value),
                    ttl,
                },
            )
            .await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.cache.invalidate(key).await;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_delete() {
        let backend = MokaCacheBackend::new(10);
        backend
            .set("k", "v", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(backend.get("k").await.unwrap().as_deref(), Some("v"));

        backend.delete("k").await.unwrap();
        assert!(backend.get("k").await.unwrap().is_none());
        backend.delete("k").await.unwrap();
    }

    #[tokio::test]
    async fn test_entries_expire_after_their_own_ttl() {
        let backend = MokaCacheBackend::new(10);
        backend
            .set("short", "a", Duration::from_millis(50))
            .await
            .unwrap();
        backend
            .set("long", "b", Duration::from_secs(60))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(backend.get("short").await.unwrap().is_none());
        assert_eq!(backend.get("long").await.unwrap().as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn test_overwrite_replaces_value() {
        let backend = MokaCacheBackend::new(10);
        backend.set("k", "1", Duration::from_secs(60)).await.unwrap();
        backend.set("k", "2", Duration::from_secs(60)).await.unwrap();
        assert_eq!(backend.get("k").await.unwrap().as_deref(), Some("2"));
        assert_eq!(backend.entry_count().await, 1);
    }
}
