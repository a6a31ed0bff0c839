//! Cache eviction on catalog writes.
//!
//! The caller persists the change first, then notifies the coordinator, which
//! works out which recipe keys depend on the changed record and evicts them.
//!
//! | change      | keys evicted                                       |
//! |-------------|----------------------------------------------------|
//! | recipe      | that recipe                                        |
//! | ingredient  | every recipe using it (reverse lookup, de-duped)   |
//! | product     | its current recipe and its previous one, if moved  |
//!
//! Every eviction first bumps an in-process epoch for the key. The read path
//! compares epochs before and after computing so that a summary built from
//! pre-write data is not stored after the write's eviction. Epochs left idle
//! for longer than the cache TTL are dropped; any entry they guarded has
//! expired by then.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;
use tracing::{info, instrument, warn};

use recipe_cost_core::{IngredientId, ProductId, RecipeId, TenantId};

use crate::cache::{DEFAULT_CACHE_TTL, RecipeCostCache};
use crate::db::CatalogRepository;
use crate::error::PricingResult;

/// Per-key eviction counters.
pub struct InvalidationEpochs {
    epochs: Cache<(TenantId, RecipeId), u64>,
}

impl InvalidationEpochs {
    /// Create an epoch table that keeps idle keys for the default cache TTL.
    #[must_use]
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_CACHE_TTL)
    }

    /// Create an epoch table that forgets keys idle for `retention`.
    ///
    /// `retention` should be at least the cost cache TTL.
    #[must_use]
    pub fn with_retention(retention: Duration) -> Self {
        Self {
            epochs: Cache::builder().time_to_idle(retention).build(),
        }
    }

    /// Current epoch of a key. Keys never evicted, or forgotten, are at 0.
    #[must_use]
    pub fn current(&self, tenant_id: TenantId, recipe_id: RecipeId) -> u64 {
        self.epochs.get(&(tenant_id, recipe_id)).unwrap_or(0)
    }

    /// Advance a key's epoch, returning the new value.
    pub fn bump(&self, tenant_id: TenantId, recipe_id: RecipeId) -> u64 {
        self.epochs
            .entry((tenant_id, recipe_id))
            .and_upsert_with(|entry| entry.map_or(0, |e| *e.value()) + 1)
            .into_value()
    }

    /// Number of keys currently tracked.
    #[must_use]
    pub fn tracked_keys(&self) -> u64 {
        self.epochs.run_pending_tasks();
        self.epochs.entry_count()
    }
}

impl Default for InvalidationEpochs {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for InvalidationEpochs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvalidationEpochs")
            .field("tracked", &self.epochs.entry_count())
            .finish()
    }
}

/// Maps catalog changes to cache evictions.
pub struct InvalidationCoordinator {
    catalog: Arc<dyn CatalogRepository>,
    cache: RecipeCostCache,
    epochs: Arc<InvalidationEpochs>,
}

impl InvalidationCoordinator {
    /// Create a coordinator.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        cache: RecipeCostCache,
        epochs: Arc<InvalidationEpochs>,
    ) -> Self {
        Self {
            catalog,
            cache,
            epochs,
        }
    }

    /// A recipe's items, yield or production time changed.
    ///
    /// Returns the number of keys evicted (always 1).
    #[instrument(skip_all, fields(tenant_id = %tenant_id, recipe_id = %recipe_id))]
    pub async fn on_recipe_changed(&self, tenant_id: TenantId, recipe_id: RecipeId) -> usize {
        self.evict_all(tenant_id, [recipe_id]).await
    }

    /// An ingredient's cost or unit changed, or it was deleted.
    ///
    /// Returns the number of recipe keys evicted.
    ///
    /// # Errors
    ///
    /// Returns `PricingError::Repository` if the reverse lookup fails; nothing
    /// is evicted in that case.
    #[instrument(skip_all, fields(tenant_id = %tenant_id, ingredient_id = %ingredient_id))]
    pub async fn on_ingredient_changed(
        &self,
        tenant_id: TenantId,
        ingredient_id: IngredientId,
    ) -> PricingResult<usize> {
        self.on_ingredients_changed(tenant_id, &[ingredient_id]).await
    }

    /// Several ingredients changed at once (bulk update or delete).
    ///
    /// Recipes shared between the ingredients are evicted once.
    ///
    /// # Errors
    ///
    /// Returns `PricingError::Repository` if any reverse lookup fails; nothing
    /// is evicted in that case.
    #[instrument(skip_all, fields(tenant_id = %tenant_id, ingredients = ingredient_ids.len()))]
    pub async fn on_ingredients_changed(
        &self,
        tenant_id: TenantId,
        ingredient_ids: &[IngredientId],
    ) -> PricingResult<usize> {
        let mut recipe_ids = BTreeSet::new();
        for ingredient_id in ingredient_ids.iter().collect::<BTreeSet<_>>() {
            let ids = self
                .catalog
                .list_recipe_ids_by_ingredient(tenant_id, *ingredient_id)
                .await?;
            recipe_ids.extend(ids);
        }

        Ok(self.evict_all(tenant_id, recipe_ids).await)
    }

    /// A product was created, updated, relinked or deleted.
    ///
    /// `previous_recipe_id` is the recipe the product pointed at before the
    /// write, if the caller knows it. A product that no longer exists only
    /// evicts that previous recipe.
    ///
    /// # Errors
    ///
    /// Returns `PricingError::Repository` if the product lookup fails.
    #[instrument(skip_all, fields(tenant_id = %tenant_id, product_id = %product_id))]
    pub async fn on_product_changed(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        previous_recipe_id: Option<RecipeId>,
    ) -> PricingResult<usize> {
        let mut recipe_ids = BTreeSet::new();
        if let Some(product) = self.catalog.get_product(tenant_id, product_id).await? {
            recipe_ids.insert(product.recipe_id);
        }
        recipe_ids.extend(previous_recipe_id);

        Ok(self.evict_all(tenant_id, recipe_ids).await)
    }

    async fn evict_all(
        &self,
        tenant_id: TenantId,
        recipe_ids: impl IntoIterator<Item = RecipeId>,
    ) -> usize {
        let mut evicted = 0;
        for recipe_id in recipe_ids {
            self.epochs.bump(tenant_id, recipe_id);
            if let Err(e) = self.cache.evict(tenant_id, recipe_id).await {
                warn!(recipe_id = %recipe_id, error = %e, "Failed to evict recipe cost");
            }
            evicted += 1;
        }
        info!(evicted, "Invalidated recipe costs");
        evicted
    }
}
