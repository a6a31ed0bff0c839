//! Recipe cost memoization.
//!
//! [`RecipeCostCache`] is a passive layer: it stores and returns
//! [`RecipeCostSummary`] values but never computes them. The costing service
//! computes on a miss and puts the result back.
//!
//! Entries live under `pricing:{tenant_id}:{recipe_id}` as JSON, with decimals
//! serialized as strings so values survive the round trip without drift.
//!
//! # Backends
//!
//! - [`MokaCacheBackend`] - in-process, per-entry TTL (default)
//! - [`RedisCacheBackend`] - shared across processes
//!
//! A backend failure is reported as [`CacheError`] and is never fatal: callers
//! log it and fall back to recomputing.

mod moka;
mod redis;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use thiserror::Error;
use tracing::debug;

use recipe_cost_core::{RecipeId, TenantId};

use crate::models::RecipeCostSummary;

pub use self::moka::MokaCacheBackend;
pub use self::redis::RedisCacheBackend;

/// Default lifetime of a cached cost summary.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(600);

/// Errors reported by cache backends.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The backend could not be reached or rejected the command.
    #[error("cache unavailable: {0}")]
    Unavailable(String),

    /// A stored value could not be encoded or decoded.
    #[error("cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// String key-value store with per-entry expiry.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Fetch a value, `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store a value that expires after `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Delete a value. Deleting an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

/// Build the cache key for a tenant's recipe.
///
/// ```
/// use recipe_cost_core::{RecipeId, TenantId};
/// use recipe_cost_engine::cache::cache_key;
///
/// assert_eq!(cache_key(TenantId::new(3), RecipeId::new(41)), "pricing:3:41");
/// ```
#[must_use]
pub fn cache_key(tenant_id: TenantId, recipe_id: RecipeId) -> String {
    format!("pricing:{tenant_id}:{recipe_id}")
}

/// Typed memoization of recipe cost summaries over a [`CacheBackend`].
#[derive(Clone)]
pub struct RecipeCostCache {
    backend: Arc<dyn CacheBackend>,
    ttl: Duration,
}

impl RecipeCostCache {
    /// Create a cache over `backend` whose entries live for `ttl`.
    #[must_use]
    pub fn new(backend: Arc<dyn CacheBackend>, ttl: Duration) -> Self {
        Self { backend, ttl }
    }

    /// Lifetime applied by [`put`](Self::put).
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a cached summary. `Ok(None)` is a miss.
    ///
    /// Hits and misses are counted under `recipe_cost_cache_requests_total`,
    /// tagged `result=hit|miss`. An undecodable entry counts as a miss.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Unavailable` if the backend fails.
    pub async fn get(
        &self,
        tenant_id: TenantId,
        recipe_id: RecipeId,
    ) -> Result<Option<RecipeCostSummary>, CacheError> {
        let key = cache_key(tenant_id, recipe_id);
        let raw = self.backend.get(&key).await.inspect_err(|_| {
            counter!("recipe_cost_cache_errors_total", "op" => "get").increment(1);
        })?;

        let summary = match raw {
            Some(raw) => match serde_json::from_str::<RecipeCostSummary>(&raw) {
                Ok(summary) => Some(summary),
                Err(e) => {
                    debug!(key = %key, error = %e, "Discarding undecodable cache entry");
                    None
                }
            },
            None => None,
        };

        let result = if summary.is_some() { "hit" } else { "miss" };
        counter!("recipe_cost_cache_requests_total", "result" => result).increment(1);
        debug!(key = %key, result, "Recipe cost cache lookup");

        Ok(summary)
    }

    /// Store a summary under its tenant and recipe with the configured TTL.
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if encoding or the backend write fails.
    pub async fn put(&self, summary: &RecipeCostSummary) -> Result<(), CacheError> {
        self.put_with_ttl(summary, self.ttl).await
    }

    /// Store a summary with an explicit TTL.
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if encoding or the backend write fails.
    pub async fn put_with_ttl(
        &self,
        summary: &RecipeCostSummary,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let key = cache_key(summary.tenant_id, summary.recipe_id);
        let value = serde_json::to_string(summary)?;
        self.backend.set(&key, &value, ttl).await.inspect_err(|_| {
            counter!("recipe_cost_cache_errors_total", "op" => "set").increment(1);
        })
    }

    /// Drop a cached summary. Evicting an absent key is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Unavailable` if the backend fails.
    pub async fn evict(&self, tenant_id: TenantId, recipe_id: RecipeId) -> Result<(), CacheError> {
        let key = cache_key(tenant_id, recipe_id);
        self.backend.delete(&key).await.inspect_err(|_| {
            counter!("recipe_cost_cache_errors_total", "op" => "delete").increment(1);
        })?;
        counter!("recipe_cost_cache_evictions_total").increment(1);
        debug!(key = %key, "Evicted recipe cost");
        Ok(())
    }
}

impl std::fmt::Debug for RecipeCostCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecipeCostCache")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
