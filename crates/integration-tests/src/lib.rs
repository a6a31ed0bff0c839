//! Integration test harness for the recipe costing engine.
//!
//! Builds a small bakery catalog and a [`CostingService`] over it, plus
//! instrumented fakes for the cache and catalog so tests can count backend
//! calls, simulate an unreachable cache, slow the catalog down, or hold a read
//! at a fixed point while a write lands.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p recipe-cost-integration-tests
//! ```
//!
//! Nothing here needs a database or Redis.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::Notify;

use recipe_cost_core::{IngredientId, MeasurementUnit, ProductId, RecipeId, RecipeItemId, TenantId};
use recipe_cost_engine::CostingService;
use recipe_cost_engine::cache::{CacheBackend, CacheError, MokaCacheBackend, RecipeCostCache};
use recipe_cost_engine::db::{CatalogRepository, InMemoryCatalog, RepositoryError};
use recipe_cost_engine::models::{Ingredient, PricingSettings, Product, Recipe, RecipeItem};

/// Tenant owning the bakery catalog.
pub const TENANT: TenantId = TenantId::new(1);

/// A second tenant with a recipe sharing IDs with the bakery.
pub const OTHER_TENANT: TenantId = TenantId::new(2);

/// Brownies: 4 kg chocolate at 5.00/kg, 10% waste, 70 min, yield 14.
pub const BROWNIES: RecipeId = RecipeId::new(10);

/// Chocolate used by the brownies and two other recipes.
pub const CHOCOLATE: IngredientId = IngredientId::new(100);

/// Product sold from the brownies recipe.
pub const BROWNIE: ProductId = ProductId::new(7);

/// Labor 0.65/min, packaging 0.40, margin 30%, variable 5%, no fixed costs.
#[must_use]
pub fn bakery_settings() -> PricingSettings {
    PricingSettings {
        labor_cost_per_minute: Decimal::new(65, 2),
        default_packaging_cost: Decimal::new(40, 2),
        default_margin_percent: Decimal::new(30, 0),
        fixed_monthly_costs: Decimal::ZERO,
        variable_cost_percent: Decimal::new(5, 0),
        default_sales_volume: None,
        default_tax_rate: None,
    }
}

/// Build an ingredient for the bakery tenant.
#[must_use]
pub fn ingredient(id: i32, name: &str, unit_cost: Decimal, unit: MeasurementUnit) -> Ingredient {
    Ingredient {
        id: IngredientId::new(id),
        tenant_id: TENANT,
        name: name.to_string(),
        unit_cost,
        unit,
        updated_at: Utc::now(),
    }
}

/// Build a recipe for the bakery tenant from `(ingredient, quantity, unit)` lines.
#[must_use]
pub fn recipe(
    id: i32,
    yield_quantity: Decimal,
    production_time: Decimal,
    lines: &[(i32, Decimal, MeasurementUnit)],
) -> Recipe {
    let items = lines
        .iter()
        .zip(1..)
        .map(|(&(ingredient_id, quantity, unit), n)| RecipeItem {
            id: RecipeItemId::new(id * 100 + n),
            ingredient_id: IngredientId::new(ingredient_id),
            quantity,
            unit,
            waste_factor: Decimal::ZERO,
        })
        .collect();
    Recipe {
        id: RecipeId::new(id),
        tenant_id: TENANT,
        name: format!("Recipe {id}"),
        items,
        yield_quantity,
        production_time,
        updated_at: Utc::now(),
    }
}

/// The brownie product, linked to [`BROWNIES`].
#[must_use]
pub fn brownie_product() -> Product {
    Product {
        id: BROWNIE,
        tenant_id: TENANT,
        recipe_id: BROWNIES,
        name: "Brownie".to_string(),
        base_price: Decimal::new(551, 2),
        suggested_price: Decimal::new(700, 2),
        margin_percent: Decimal::new(30, 0),
        packaging_cost: Decimal::new(40, 2),
        tax_rate: None,
        updated_at: Utc::now(),
    }
}

/// Catalog with the brownies recipe and friends.
///
/// - Ingredients 100 (chocolate), 101 (flour), 102 (eggs), 103 (butter)
/// - Recipe 10 brownies, the worked costing example
/// - Recipes 11..=14 sharing ingredients so that 100, 101 and 102 together
///   appear in five distinct recipes
/// - Product 7 on recipe 10
/// - Tenant 2 owns its own recipe 10 that must never leak into tenant 1
pub async fn bakery_catalog() -> Arc<InMemoryCatalog> {
    let catalog = Arc::new(InMemoryCatalog::new());
    catalog.set_pricing_settings(TENANT, bakery_settings()).await;

    catalog
        .upsert_ingredient(ingredient(100, "Chocolate", Decimal::new(500, 2), MeasurementUnit::Kg))
        .await;
    catalog
        .upsert_ingredient(ingredient(101, "Flour", Decimal::new(200, 2), MeasurementUnit::Kg))
        .await;
    catalog
        .upsert_ingredient(ingredient(102, "Eggs", Decimal::new(30, 2), MeasurementUnit::Un))
        .await;
    catalog
        .upsert_ingredient(ingredient(103, "Butter", Decimal::new(900, 2), MeasurementUnit::Kg))
        .await;

    let mut brownies = recipe(10, Decimal::new(14, 0), Decimal::new(70, 0), &[(
        100,
        Decimal::new(4, 0),
        MeasurementUnit::Kg,
    )]);
    if let Some(item) = brownies.items.first_mut() {
        item.waste_factor = Decimal::new(1, 1);
    }
    catalog.upsert_recipe(brownies).await;

    let kg = MeasurementUnit::Kg;
    let un = MeasurementUnit::Un;
    catalog
        .upsert_recipe(recipe(11, Decimal::new(12, 0), Decimal::new(45, 0), &[
            (100, Decimal::new(3, 1), kg),
            (101, Decimal::new(25, 2), kg),
        ]))
        .await;
    catalog
        .upsert_recipe(recipe(12, Decimal::new(15, 0), Decimal::new(30, 0), &[
            (101, Decimal::new(25, 2), kg),
            (102, Decimal::new(3, 0), un),
        ]))
        .await;
    catalog
        .upsert_recipe(recipe(13, Decimal::new(20, 0), Decimal::ZERO, &[
            (102, Decimal::new(12, 0), un),
            (103, Decimal::new(5, 1), kg),
        ]))
        .await;
    catalog
        .upsert_recipe(recipe(14, Decimal::new(8, 0), Decimal::new(20, 0), &[
            (100, Decimal::new(1, 0), kg),
            (102, Decimal::new(2, 0), un),
        ]))
        .await;

    catalog.upsert_product(brownie_product()).await;

    let mut foreign = recipe(10, Decimal::ONE, Decimal::ZERO, &[(
        200,
        Decimal::ONE,
        MeasurementUnit::Kg,
    )]);
    foreign.tenant_id = OTHER_TENANT;
    foreign.name = "Someone else's loaf".to_string();
    catalog.upsert_recipe(foreign).await;
    catalog
        .upsert_ingredient(Ingredient {
            tenant_id: OTHER_TENANT,
            ..ingredient(200, "Rye", Decimal::new(99, 0), MeasurementUnit::Kg)
        })
        .await;

    catalog
}

/// Service over `catalog` with the given cache backend and a one-minute TTL.
pub fn service_with(
    catalog: Arc<dyn CatalogRepository>,
    settings: Arc<InMemoryCatalog>,
    backend: Arc<dyn CacheBackend>,
) -> CostingService {
    let cache = RecipeCostCache::new(backend, Duration::from_secs(60));
    CostingService::new(catalog, settings, cache)
}

/// Bakery catalog plus a service reading it through a [`CountingBackend`].
pub async fn bakery_service() -> (Arc<InMemoryCatalog>, Arc<CountingBackend>, CostingService) {
    let catalog = bakery_catalog().await;
    let backend = Arc::new(CountingBackend::new());
    let service = service_with(catalog.clone(), catalog.clone(), backend.clone());
    (catalog, backend, service)
}

// =============================================================================
// Gate
// =============================================================================

/// One-shot checkpoint. The first caller of [`Gate::pass`] parks until the
/// test calls [`Gate::open`]; later callers go straight through.
#[derive(Debug)]
pub struct Gate {
    armed: AtomicBool,
    entered: Notify,
    release: Notify,
}

impl Gate {
    /// Create an armed gate.
    #[must_use]
    pub fn new() -> Self {
        Self {
            armed: AtomicBool::new(true),
            entered: Notify::new(),
            release: Notify::new(),
        }
    }

    /// Park here on first use until the gate is opened.
    pub async fn pass(&self) {
        if self.armed.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
    }

    /// Wait until a caller is parked at the gate.
    pub async fn reached(&self) {
        self.entered.notified().await;
    }

    /// Let the parked caller continue.
    pub fn open(&self) {
        self.release.notify_one();
    }
}

impl Default for Gate {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Cache fakes
// =============================================================================

/// Moka-backed cache that counts every call it receives.
#[derive(Debug)]
pub struct CountingBackend {
    inner: MokaCacheBackend,
    gets: AtomicUsize,
    sets: AtomicUsize,
    deletes: AtomicUsize,
}

impl CountingBackend {
    /// Create an empty counting cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: MokaCacheBackend::new(1_000),
            gets: AtomicUsize::new(0),
            sets: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
        }
    }

    /// Number of `get` calls so far.
    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    /// Number of `set` calls so far.
    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    /// Number of `delete` calls so far.
    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

impl Default for CountingBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheBackend for CountingBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(key).await
    }
}

/// Counting cache whose first write parks at a [`Gate`] before landing.
#[derive(Debug)]
pub struct GatedBackend {
    inner: Arc<CountingBackend>,
    gate: Arc<Gate>,
}

impl GatedBackend {
    /// Wrap `inner`, holding its first `set` at `gate`.
    #[must_use]
    pub const fn new(inner: Arc<CountingBackend>, gate: Arc<Gate>) -> Self {
        Self { inner, gate }
    }
}

#[async_trait]
impl CacheBackend for GatedBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        self.gate.pass().await;
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.inner.delete(key).await
    }
}

/// Cache whose every call fails, as if the server were down.
#[derive(Debug, Default)]
pub struct UnreachableBackend;

#[async_trait]
impl CacheBackend for UnreachableBackend {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(CacheError::Unavailable("connection refused".to_string()))
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("connection refused".to_string()))
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("connection refused".to_string()))
    }
}

// =============================================================================
// Catalog fakes
// =============================================================================

/// Catalog that sleeps before every recipe read.
#[derive(Debug)]
pub struct SlowCatalog {
    inner: Arc<InMemoryCatalog>,
    delay: Duration,
}

impl SlowCatalog {
    /// Wrap `inner`, delaying recipe reads by `delay`.
    #[must_use]
    pub const fn new(inner: Arc<InMemoryCatalog>, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl CatalogRepository for SlowCatalog {
    async fn get_recipe(
        &self,
        tenant_id: TenantId,
        recipe_id: RecipeId,
    ) -> Result<Option<Recipe>, RepositoryError> {
        tokio::time::sleep(self.delay).await;
        self.inner.get_recipe(tenant_id, recipe_id).await
    }

    async fn get_ingredient(
        &self,
        tenant_id: TenantId,
        ingredient_id: IngredientId,
    ) -> Result<Option<Ingredient>, RepositoryError> {
        self.inner.get_ingredient(tenant_id, ingredient_id).await
    }

    async fn list_recipe_ids_by_ingredient(
        &self,
        tenant_id: TenantId,
        ingredient_id: IngredientId,
    ) -> Result<Vec<RecipeId>, RepositoryError> {
        self.inner
            .list_recipe_ids_by_ingredient(tenant_id, ingredient_id)
            .await
    }

    async fn get_product(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
    ) -> Result<Option<Product>, RepositoryError> {
        self.inner.get_product(tenant_id, product_id).await
    }
}

/// Catalog whose first ingredient read parks at a [`Gate`] after reading.
///
/// The parked reader holds the ingredient as it was before any write the test
/// makes while it waits.
#[derive(Debug)]
pub struct GatedCatalog {
    inner: Arc<InMemoryCatalog>,
    gate: Arc<Gate>,
}

impl GatedCatalog {
    /// Wrap `inner`, holding its first `get_ingredient` at `gate`.
    #[must_use]
    pub const fn new(inner: Arc<InMemoryCatalog>, gate: Arc<Gate>) -> Self {
        Self { inner, gate }
    }
}

#[async_trait]
impl CatalogRepository for GatedCatalog {
    async fn get_recipe(
        &self,
        tenant_id: TenantId,
        recipe_id: RecipeId,
    ) -> Result<Option<Recipe>, RepositoryError> {
        self.inner.get_recipe(tenant_id, recipe_id).await
    }

    async fn get_ingredient(
        &self,
        tenant_id: TenantId,
        ingredient_id: IngredientId,
    ) -> Result<Option<Ingredient>, RepositoryError> {
        let ingredient = self.inner.get_ingredient(tenant_id, ingredient_id).await;
        self.gate.pass().await;
        ingredient
    }

    async fn list_recipe_ids_by_ingredient(
        &self,
        tenant_id: TenantId,
        ingredient_id: IngredientId,
    ) -> Result<Vec<RecipeId>, RepositoryError> {
        self.inner
            .list_recipe_ids_by_ingredient(tenant_id, ingredient_id)
            .await
    }

    async fn get_product(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
    ) -> Result<Option<Product>, RepositoryError> {
        self.inner.get_product(tenant_id, product_id).await
    }
}
