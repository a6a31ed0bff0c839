//! `PostgreSQL` catalog store.
//!
//! Reads the `pricing` schema maintained by the CRUD service:
//!
//! - `pricing.ingredients` - `id, tenant_id, name, unit_cost, unit, updated_at`
//! - `pricing.recipes` - `id, tenant_id, name, yield_quantity, production_time, updated_at`
//! - `pricing.recipe_items` - `id, recipe_id, ingredient_id, quantity, unit, waste_factor, position`
//! - `pricing.products` - `id, tenant_id, recipe_id, name, base_price, suggested_price,
//!   margin_percent, packaging_cost, tax_rate, updated_at`
//! - `pricing.settings` - one row per tenant with the pricing defaults
//!
//! Queries are built at runtime (`query_as`) so the crate compiles without a
//! live database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use recipe_cost_core::{
    IngredientId, MeasurementUnit, ProductId, RecipeId, RecipeItemId, TenantId,
};

use super::{CatalogRepository, RepositoryError, SettingsRepository};
use crate::models::{Ingredient, PricingSettings, Product, Recipe, RecipeItem};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct IngredientRow {
    id: IngredientId,
    tenant_id: TenantId,
    name: String,
    unit_cost: Decimal,
    unit: MeasurementUnit,
    updated_at: DateTime<Utc>,
}

impl From<IngredientRow> for Ingredient {
    fn from(row: IngredientRow) -> Self {
        Self {
            id: row.id,
            tenant_id: row.tenant_id,
            name: row.name,
            unit_cost: row.unit_cost,
            unit: row.unit,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RecipeRow {
    id: RecipeId,
    tenant_id: TenantId,
    name: String,
    yield_quantity: Decimal,
    production_time: Decimal,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct RecipeItemRow {
    id: RecipeItemId,
    ingredient_id: IngredientId,
    quantity: Decimal,
    unit: MeasurementUnit,
    waste_factor: Option<Decimal>,
}

impl From<RecipeItemRow> for RecipeItem {
    fn from(row: RecipeItemRow) -> Self {
        Self {
            id: row.id,
            ingredient_id: row.ingredient_id,
            quantity: row.quantity,
            unit: row.unit,
            waste_factor: row.waste_factor.unwrap_or_default(),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    tenant_id: TenantId,
    recipe_id: RecipeId,
    name: String,
    base_price: Decimal,
    suggested_price: Decimal,
    margin_percent: Decimal,
    packaging_cost: Option<Decimal>,
    tax_rate: Option<Decimal>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            tenant_id: row.tenant_id,
            recipe_id: row.recipe_id,
            name: row.name,
            base_price: row.base_price,
            suggested_price: row.suggested_price,
            margin_percent: row.margin_percent,
            packaging_cost: row.packaging_cost.unwrap_or_default(),
            tax_rate: row.tax_rate,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SettingsRow {
    labor_cost_per_minute: Decimal,
    default_packaging_cost: Decimal,
    default_margin_percent: Decimal,
    fixed_monthly_costs: Decimal,
    variable_cost_percent: Decimal,
    default_sales_volume: Option<Decimal>,
    default_tax_rate: Option<Decimal>,
}

impl From<SettingsRow> for PricingSettings {
    fn from(row: SettingsRow) -> Self {
        Self {
            labor_cost_per_minute: row.labor_cost_per_minute,
            default_packaging_cost: row.default_packaging_cost,
            default_margin_percent: row.default_margin_percent,
            fixed_monthly_costs: row.fixed_monthly_costs,
            variable_cost_percent: row.variable_cost_percent,
            default_sales_volume: row.default_sales_volume,
            default_tax_rate: row.default_tax_rate,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Catalog repository backed by `PostgreSQL`.
#[derive(Debug, Clone)]
pub struct PgCatalogRepository {
    pool: PgPool,
}

impl PgCatalogRepository {
    /// Create a new repository over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogRepository for PgCatalogRepository {
    async fn get_recipe(
        &self,
        tenant_id: TenantId,
        recipe_id: RecipeId,
    ) -> Result<Option<Recipe>, RepositoryError> {
        let row = sqlx::query_as::<_, RecipeRow>(
            r"
            SELECT id, tenant_id, name, yield_quantity, production_time, updated_at
            FROM pricing.recipes
            WHERE tenant_id = $1 AND id = $2
            ",
        )
        .bind(tenant_id)
        .bind(recipe_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, RecipeItemRow>(
            r"
            SELECT id, ingredient_id, quantity, unit, waste_factor
            FROM pricing.recipe_items
            WHERE recipe_id = $1
            ORDER BY position, id
            ",
        )
        .bind(row.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(Recipe {
            id: row.id,
            tenant_id: row.tenant_id,
            name: row.name,
            items: items.into_iter().map(Into::into).collect(),
            yield_quantity: row.yield_quantity,
            production_time: row.production_time,
            updated_at: row.updated_at,
        }))
    }

    async fn get_ingredient(
        &self,
        tenant_id: TenantId,
        ingredient_id: IngredientId,
    ) -> Result<Option<Ingredient>, RepositoryError> {
        let row = sqlx::query_as::<_, IngredientRow>(
            r"
            SELECT id, tenant_id, name, unit_cost, unit, updated_at
            FROM pricing.ingredients
            WHERE tenant_id = $1 AND id = $2
            ",
        )
        .bind(tenant_id)
        .bind(ingredient_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list_recipe_ids_by_ingredient(
        &self,
        tenant_id: TenantId,
        ingredient_id: IngredientId,
    ) -> Result<Vec<RecipeId>, RepositoryError> {
        let ids = sqlx::query_scalar::<_, RecipeId>(
            r"
            SELECT DISTINCT r.id
            FROM pricing.recipe_items ri
            JOIN pricing.recipes r ON r.id = ri.recipe_id
            WHERE r.tenant_id = $1 AND ri.ingredient_id = $2
            ORDER BY r.id
            ",
        )
        .bind(tenant_id)
        .bind(ingredient_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn get_product(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
    ) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, tenant_id, recipe_id, name, base_price, suggested_price,
                   margin_percent, packaging_cost, tax_rate, updated_at
            FROM pricing.products
            WHERE tenant_id = $1 AND id = $2
            ",
        )
        .bind(tenant_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }
}

#[async_trait]
impl SettingsRepository for PgCatalogRepository {
    async fn get_pricing_settings(
        &self,
        tenant_id: TenantId,
    ) -> Result<Option<PricingSettings>, RepositoryError> {
        let row = sqlx::query_as::<_, SettingsRow>(
            r"
            SELECT labor_cost_per_minute, default_packaging_cost, default_margin_percent,
                   fixed_monthly_costs, variable_cost_percent, default_sales_volume,
                   default_tax_rate
            FROM pricing.settings
            WHERE tenant_id = $1
            ",
        )
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }
}
