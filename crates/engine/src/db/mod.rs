//! Read interfaces to the catalog store.
//!
//! The costing engine never owns the catalog. Ingredients, recipes, products
//! and tenant settings are persisted by the surrounding service; the engine
//! reads them through the traits below.
//!
//! # Implementations
//!
//! - [`InMemoryCatalog`] - `HashMap`-backed store for fixtures, the CLI and tests
//! - [`PgCatalogRepository`] - `PostgreSQL` store over the `pricing` schema
//!
//! Every lookup is tenant-scoped: a record belonging to another tenant is
//! reported as absent, exactly like a missing one.

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use recipe_cost_core::{IngredientId, ProductId, RecipeId, TenantId};

use crate::models::{Ingredient, PricingSettings, Product, Recipe};

pub use memory::{CatalogFixture, InMemoryCatalog};
pub use postgres::PgCatalogRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the store is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// The store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Tenant-scoped reads of ingredients, recipes and products.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Fetch a recipe with all of its items.
    async fn get_recipe(
        &self,
        tenant_id: TenantId,
        recipe_id: RecipeId,
    ) -> Result<Option<Recipe>, RepositoryError>;

    /// Fetch an ingredient.
    async fn get_ingredient(
        &self,
        tenant_id: TenantId,
        ingredient_id: IngredientId,
    ) -> Result<Option<Ingredient>, RepositoryError>;

    /// IDs of every recipe with at least one item referencing the ingredient.
    async fn list_recipe_ids_by_ingredient(
        &self,
        tenant_id: TenantId,
        ingredient_id: IngredientId,
    ) -> Result<Vec<RecipeId>, RepositoryError>;

    /// Fetch a product.
    async fn get_product(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
    ) -> Result<Option<Product>, RepositoryError>;
}

/// Tenant-level pricing configuration.
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Fetch the tenant's stored pricing settings, if any were saved.
    async fn get_pricing_settings(
        &self,
        tenant_id: TenantId,
    ) -> Result<Option<PricingSettings>, RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
