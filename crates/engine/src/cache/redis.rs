//! Redis cache backend.
//!
//! Shares cost summaries between engine instances. Uses plain `GET`,
//! `SET .. EX` and `DEL` through a multiplexed [`ConnectionManager`] that
//! reconnects on its own.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use super::{CacheBackend, CacheError};

/// Backend over a shared Redis instance.
#[derive(Clone)]
pub struct RedisCacheBackend {
    conn: ConnectionManager,
}

impl RedisCacheBackend {
    /// Wrap an existing connection manager.
    #[must_use]
    pub const fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    /// Open a connection manager for `url` and wrap it.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Unavailable` if the URL is invalid or the server
    /// cannot be reached.
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)
            .map_err(|e| CacheError::Unavailable(format!("invalid redis url: {e}")))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheError::Unavailable(format!("redis connect failed: {e}")))?;
        Ok(Self::new(conn))
    }
}

impl std::fmt::Debug for RedisCacheBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCacheBackend").finish_non_exhaustive()
    }
}

fn unavailable(op: &str, err: &redis::RedisError) -> CacheError {
    CacheError::Unavailable(format!("redis {op} failed: {err}"))
}

#[async_trait]
impl CacheBackend for RedisCacheBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        conn.get::<_, Option<String>>(key)
            .await
            .map_err(|e| unavailable("get", &e))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        // SET EX rejects a zero expiry
        let secs = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, value, secs)
            .await
            .map_err(|e| unavailable("set", &e))
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key)
            .await
            .map_err(|e| unavailable("delete", &e))
    }
}
