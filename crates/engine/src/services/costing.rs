//! Coordinating service for costing reads, suggestions and invalidation.
//!
//! # Read path
//!
//! 1. Look up `pricing:{tenant}:{recipe}` in the cost cache
//! 2. On a miss, record the key's invalidation epoch and compute from the catalog
//! 3. Store the result, unless the key was invalidated while computing
//!
//! A cache that cannot be reached is logged and treated as a miss. Reads run
//! under an optional deadline; when it expires the read fails and nothing is
//! written to the cache.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use tracing::{debug, info, instrument, warn};

use recipe_cost_core::{IngredientId, ProductId, RecipeId, TenantId};

use crate::cache::{
    CacheBackend, CacheError, MokaCacheBackend, RecipeCostCache, RedisCacheBackend,
};
use crate::config::{CacheBackendConfig, EngineConfig};
use crate::db::{CatalogRepository, SettingsRepository};
use crate::error::{PricingError, PricingResult};
use crate::models::{
    PricingParameters, PricingSettings, PricingSuggestion, PricingSuggestionInput, Product,
    ProductPricingSummary, RecipeCostSummary, TaxTreatment,
};

use super::cost_aggregator::{BatchRates, CostAggregator};
use super::invalidation::{InvalidationCoordinator, InvalidationEpochs};
use super::pricing_formula::PricingFormulaEngine;
use super::product_summary::derive_product_summary;

/// Entry point of the costing engine.
///
/// Cheap to share behind an `Arc`; every collaborator is injected.
pub struct CostingService {
    catalog: Arc<dyn CatalogRepository>,
    settings: Arc<dyn SettingsRepository>,
    cache: RecipeCostCache,
    epochs: Arc<InvalidationEpochs>,
    aggregator: CostAggregator,
    formula: PricingFormulaEngine,
    invalidation: InvalidationCoordinator,
    fallback_settings: PricingSettings,
    read_timeout: Option<Duration>,
}

impl CostingService {
    /// Create a service over the given catalog, settings store and cache.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        settings: Arc<dyn SettingsRepository>,
        cache: RecipeCostCache,
    ) -> Self {
        let epochs = Arc::new(InvalidationEpochs::with_retention(cache.ttl()));
        Self {
            aggregator: CostAggregator::new(catalog.clone()),
            invalidation: InvalidationCoordinator::new(
                catalog.clone(),
                cache.clone(),
                epochs.clone(),
            ),
            formula: PricingFormulaEngine::new(),
            catalog,
            settings,
            cache,
            epochs,
            fallback_settings: PricingSettings::default(),
            read_timeout: None,
        }
    }

    /// Build a service from configuration, connecting the configured cache.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Unavailable` if the Redis backend cannot connect.
    pub async fn from_config(
        config: &EngineConfig,
        catalog: Arc<dyn CatalogRepository>,
        settings: Arc<dyn SettingsRepository>,
    ) -> Result<Self, CacheError> {
        let backend: Arc<dyn CacheBackend> = match &config.cache.backend {
            CacheBackendConfig::Memory { max_capacity } => {
                Arc::new(MokaCacheBackend::new(*max_capacity))
            }
            CacheBackendConfig::Redis { url } => {
                Arc::new(RedisCacheBackend::connect(url.expose_secret()).await?)
            }
        };
        info!(backend = ?config.cache.backend, ttl_secs = config.cache.ttl.as_secs(), "Cost cache ready");

        let cache = RecipeCostCache::new(backend, config.cache.ttl);
        let mut service = Self::new(catalog, settings, cache)
            .with_fallback_settings(config.fallback_settings.clone());
        if let Some(timeout) = config.read_timeout {
            service = service.with_read_timeout(timeout);
        }
        Ok(service)
    }

    /// Settings used for tenants with none stored.
    #[must_use]
    pub fn with_fallback_settings(mut self, settings: PricingSettings) -> Self {
        self.fallback_settings = settings;
        self
    }

    /// Deadline applied to reads that don't carry their own.
    #[must_use]
    pub const fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Cost summary of one batch of a recipe, served from the cache when fresh.
    ///
    /// # Errors
    ///
    /// - `PricingError::NotFound` if the recipe or one of its ingredients is
    ///   missing for the tenant
    /// - `PricingError::Validation` if a recipe item is invalid
    /// - `PricingError::Repository` if the catalog fails
    /// - `PricingError::DeadlineExceeded` if the configured read timeout expires
    pub async fn compute_recipe_cost(
        &self,
        tenant_id: TenantId,
        recipe_id: RecipeId,
    ) -> PricingResult<RecipeCostSummary> {
        within(self.read_timeout, self.load_cost(tenant_id, recipe_id, None)).await
    }

    /// [`compute_recipe_cost`](Self::compute_recipe_cost) with an explicit deadline.
    ///
    /// # Errors
    ///
    /// As `compute_recipe_cost`.
    pub async fn compute_recipe_cost_within(
        &self,
        tenant_id: TenantId,
        recipe_id: RecipeId,
        deadline: Duration,
    ) -> PricingResult<RecipeCostSummary> {
        within(Some(deadline), self.load_cost(tenant_id, recipe_id, None)).await
    }

    /// Suggest a selling price for a recipe or product.
    ///
    /// Parameters left empty on the input default to the product's saved
    /// values, then to the tenant's pricing settings.
    ///
    /// # Errors
    ///
    /// - `PricingError::Validation` if neither recipe nor product is given,
    ///   if they disagree, or if a parameter is out of range
    /// - `PricingError::NotFound` if the product, recipe or an ingredient is missing
    /// - `PricingError::Repository` if the catalog fails
    /// - `PricingError::DeadlineExceeded` if the configured read timeout expires
    pub async fn suggest(&self, input: &PricingSuggestionInput) -> PricingResult<PricingSuggestion> {
        within(self.read_timeout, self.build_suggestion(input)).await
    }

    /// [`suggest`](Self::suggest) with an explicit deadline.
    ///
    /// # Errors
    ///
    /// As `suggest`.
    pub async fn suggest_within(
        &self,
        input: &PricingSuggestionInput,
        deadline: Duration,
    ) -> PricingResult<PricingSuggestion> {
        within(Some(deadline), self.build_suggestion(input)).await
    }

    /// Display figures for a product's saved prices. Reads nothing.
    ///
    /// # Errors
    ///
    /// Returns `PricingError::Validation` if a derived figure overflows.
    #[allow(clippy::unused_self)]
    pub fn derive_product_summary(&self, product: &Product) -> PricingResult<ProductPricingSummary> {
        derive_product_summary(product)
    }

    /// Load a product and derive its display figures.
    ///
    /// # Errors
    ///
    /// Returns `PricingError::NotFound` if the product does not exist for the
    /// tenant, `PricingError::Validation` if a derived figure overflows, or
    /// `PricingError::Repository` if the catalog fails.
    pub async fn product_summary(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
    ) -> PricingResult<ProductPricingSummary> {
        let product = self.load_product(tenant_id, product_id).await?;
        derive_product_summary(&product)
    }

    // =========================================================================
    // Invalidation hooks
    // =========================================================================

    /// Call after a recipe's items, yield or production time changed.
    pub async fn invalidate_recipe(&self, tenant_id: TenantId, recipe_id: RecipeId) -> usize {
        self.invalidation.on_recipe_changed(tenant_id, recipe_id).await
    }

    /// Call after an ingredient's cost or unit changed, or it was deleted.
    ///
    /// # Errors
    ///
    /// Returns `PricingError::Repository` if the reverse lookup fails.
    pub async fn invalidate_by_ingredient(
        &self,
        tenant_id: TenantId,
        ingredient_id: IngredientId,
    ) -> PricingResult<usize> {
        self.invalidation
            .on_ingredient_changed(tenant_id, ingredient_id)
            .await
    }

    /// Call after a bulk ingredient update or delete.
    ///
    /// # Errors
    ///
    /// Returns `PricingError::Repository` if a reverse lookup fails.
    pub async fn invalidate_by_ingredients(
        &self,
        tenant_id: TenantId,
        ingredient_ids: &[IngredientId],
    ) -> PricingResult<usize> {
        self.invalidation
            .on_ingredients_changed(tenant_id, ingredient_ids)
            .await
    }

    /// Call after a product was saved, relinked or deleted.
    ///
    /// # Errors
    ///
    /// Returns `PricingError::Repository` if the product lookup fails.
    pub async fn invalidate_by_product(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        previous_recipe_id: Option<RecipeId>,
    ) -> PricingResult<usize> {
        self.invalidation
            .on_product_changed(tenant_id, product_id, previous_recipe_id)
            .await
    }

    // =========================================================================
    // Internals
    // =========================================================================

    #[instrument(skip_all, fields(tenant_id = %tenant_id, recipe_id = %recipe_id))]
    async fn load_cost(
        &self,
        tenant_id: TenantId,
        recipe_id: RecipeId,
        settings: Option<&PricingSettings>,
    ) -> PricingResult<RecipeCostSummary> {
        match self.cache.get(tenant_id, recipe_id).await {
            Ok(Some(summary)) => {
                debug!("Cache hit");
                return Ok(summary);
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Cost cache unavailable, recomputing"),
        }

        let epoch = self.epochs.current(tenant_id, recipe_id);
        let rates = match settings {
            Some(settings) => BatchRates::from(settings),
            None => BatchRates::from(&self.resolve_settings(tenant_id).await?),
        };
        let summary = self.aggregator.compute(tenant_id, recipe_id, rates).await?;

        if self.epochs.current(tenant_id, recipe_id) != epoch {
            debug!("Recipe invalidated while computing, not caching");
            return Ok(summary);
        }
        if let Err(e) = self.cache.put(&summary).await {
            warn!(error = %e, "Failed to cache recipe cost");
            return Ok(summary);
        }
        // An eviction that landed between the check and the write
        if self.epochs.current(tenant_id, recipe_id) != epoch
            && let Err(e) = self.cache.evict(tenant_id, recipe_id).await
        {
            warn!(error = %e, "Failed to drop stale recipe cost");
        }

        Ok(summary)
    }

    #[instrument(skip_all, fields(tenant_id = %input.tenant_id))]
    async fn build_suggestion(
        &self,
        input: &PricingSuggestionInput,
    ) -> PricingResult<PricingSuggestion> {
        let tenant_id = input.tenant_id;

        let product = match input.product_id {
            Some(product_id) => Some(self.load_product(tenant_id, product_id).await?),
            None => None,
        };
        let recipe_id = match (&product, input.recipe_id) {
            (Some(product), Some(recipe_id)) if product.recipe_id != recipe_id => {
                return Err(PricingError::validation(format!(
                    "product {} is made from recipe {}, not {recipe_id}",
                    product.id, product.recipe_id
                )));
            }
            (Some(product), _) => product.recipe_id,
            (None, Some(recipe_id)) => recipe_id,
            (None, None) => return Err(PricingError::validation("missing recipe or product")),
        };

        let settings = self.resolve_settings(tenant_id).await?;
        let summary = self.load_cost(tenant_id, recipe_id, Some(&settings)).await?;
        let params = resolve_parameters(input, product.as_ref(), &settings, &summary);

        let suggestion = self
            .formula
            .suggest(&params, recipe_id, input.product_id)?;
        info!(
            recipe_id = %recipe_id,
            suggested_price = %suggestion.suggested_price,
            flags = ?suggestion.flags,
            "Computed pricing suggestion"
        );
        Ok(suggestion)
    }

    async fn load_product(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
    ) -> PricingResult<Product> {
        self.catalog
            .get_product(tenant_id, product_id)
            .await?
            .ok_or_else(|| PricingError::not_found("product", product_id))
    }

    async fn resolve_settings(&self, tenant_id: TenantId) -> PricingResult<PricingSettings> {
        Ok(self
            .settings
            .get_pricing_settings(tenant_id)
            .await?
            .unwrap_or_else(|| self.fallback_settings.clone()))
    }
}

impl std::fmt::Debug for CostingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CostingService")
            .field("cache", &self.cache)
            .field("read_timeout", &self.read_timeout)
            .finish_non_exhaustive()
    }
}

/// Merge request overrides, product snapshot and tenant settings.
///
/// Each parameter takes the first value found in request, product, settings.
fn resolve_parameters(
    input: &PricingSuggestionInput,
    product: Option<&Product>,
    settings: &PricingSettings,
    summary: &RecipeCostSummary,
) -> PricingParameters {
    let margin_percent = input
        .margin_percent
        .or_else(|| product.map(|p| p.margin_percent))
        .unwrap_or(settings.default_margin_percent);
    let packaging_cost = input
        .packaging_cost
        .or_else(|| product.map(|p| p.packaging_cost))
        .unwrap_or(settings.default_packaging_cost);

    let product_tax = product.and_then(|p| p.tax_rate);
    let tax = if input.wants_tax() {
        input
            .tax_rate
            .or(product_tax)
            .or(settings.default_tax_rate)
            .map_or(TaxTreatment::Missing, TaxTreatment::Included)
    } else {
        product_tax.map_or(TaxTreatment::Excluded, TaxTreatment::Included)
    };

    let current_price = input.current_price.or_else(|| {
        product
            .map(|p| p.suggested_price)
            .filter(|price| *price > Decimal::ZERO)
    });

    PricingParameters {
        recipe_cost_per_unit: summary.cost_per_unit,
        packaging_cost,
        margin_percent,
        fixed_monthly_costs: input
            .fixed_monthly_costs
            .unwrap_or(settings.fixed_monthly_costs),
        variable_cost_percent: input
            .variable_cost_percent
            .unwrap_or(settings.variable_cost_percent),
        sales_volume_monthly: input.sales_volume_monthly.or(settings.default_sales_volume),
        tax,
        current_price,
    }
}

async fn within<T, F>(deadline: Option<Duration>, fut: F) -> PricingResult<T>
where
    F: Future<Output = PricingResult<T>>,
{
    match deadline {
        Some(deadline) => tokio::time::timeout(deadline, fut).await.unwrap_or_else(|_| {
            warn!(deadline_ms = deadline.as_millis(), "Read deadline exceeded");
            Err(PricingError::DeadlineExceeded(deadline.as_millis()))
        }),
        None => fut.await,
    }
}
