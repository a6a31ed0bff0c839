//! In-memory catalog store.
//!
//! Backs the CLI (loaded from a YAML fixture) and the test suites. Mutation
//! methods stand in for the CRUD layer: callers update the catalog first and
//! then notify the invalidation coordinator, the same write-then-invalidate
//! order a real store follows.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use recipe_cost_core::{IngredientId, ProductId, RecipeId, TenantId};

use super::{CatalogRepository, RepositoryError, SettingsRepository};
use crate::models::{Ingredient, PricingSettings, Product, Recipe};

/// Serialized catalog contents, as read from a fixture file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogFixture {
    /// Pricing settings keyed by tenant.
    pub settings: HashMap<TenantId, PricingSettings>,
    /// All ingredients, each carrying its tenant.
    pub ingredients: Vec<Ingredient>,
    /// All recipes, each carrying its tenant.
    pub recipes: Vec<Recipe>,
    /// All products, each carrying its tenant.
    pub products: Vec<Product>,
}

#[derive(Debug, Default)]
struct CatalogState {
    settings: HashMap<TenantId, PricingSettings>,
    ingredients: HashMap<(TenantId, IngredientId), Ingredient>,
    recipes: HashMap<(TenantId, RecipeId), Recipe>,
    products: HashMap<(TenantId, ProductId), Product>,
}

/// `HashMap`-backed catalog implementing both repository traits.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    state: RwLock<CatalogState>,
}

impl InMemoryCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog pre-populated from a fixture.
    #[must_use]
    pub fn from_fixture(fixture: CatalogFixture) -> Self {
        let state = CatalogState {
            settings: fixture.settings,
            ingredients: fixture
                .ingredients
                .into_iter()
                .map(|i| ((i.tenant_id, i.id), i))
                .collect(),
            recipes: fixture
                .recipes
                .into_iter()
                .map(|r| ((r.tenant_id, r.id), r))
                .collect(),
            products: fixture
                .products
                .into_iter()
                .map(|p| ((p.tenant_id, p.id), p))
                .collect(),
        };
        Self {
            state: RwLock::new(state),
        }
    }

    /// Insert or replace an ingredient.
    pub async fn upsert_ingredient(&self, ingredient: Ingredient) {
        let key = (ingredient.tenant_id, ingredient.id);
        self.state.write().await.ingredients.insert(key, ingredient);
    }

    /// Remove an ingredient, returning it if it existed.
    pub async fn remove_ingredient(
        &self,
        tenant_id: TenantId,
        ingredient_id: IngredientId,
    ) -> Option<Ingredient> {
        self.state
            .write()
            .await
            .ingredients
            .remove(&(tenant_id, ingredient_id))
    }

    /// Insert or replace a recipe.
    pub async fn upsert_recipe(&self, recipe: Recipe) {
        let key = (recipe.tenant_id, recipe.id);
        self.state.write().await.recipes.insert(key, recipe);
    }

    /// Remove a recipe, returning it if it existed.
    pub async fn remove_recipe(&self, tenant_id: TenantId, recipe_id: RecipeId) -> Option<Recipe> {
        self.state
            .write()
            .await
            .recipes
            .remove(&(tenant_id, recipe_id))
    }

    /// Insert or replace a product, returning the previous version.
    pub async fn upsert_product(&self, product: Product) -> Option<Product> {
        let key = (product.tenant_id, product.id);
        self.state.write().await.products.insert(key, product)
    }

    /// Remove a product, returning it if it existed.
    pub async fn remove_product(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
    ) -> Option<Product> {
        self.state
            .write()
            .await
            .products
            .remove(&(tenant_id, product_id))
    }

    /// Store a tenant's pricing settings.
    pub async fn set_pricing_settings(&self, tenant_id: TenantId, settings: PricingSettings) {
        self.state.write().await.settings.insert(tenant_id, settings);
    }
}

#[async_trait]
impl CatalogRepository for InMemoryCatalog {
    async fn get_recipe(
        &self,
        tenant_id: TenantId,
        recipe_id: RecipeId,
    ) -> Result<Option<Recipe>, RepositoryError> {
        Ok(self
            .state
            .read()
            .await
            .recipes
            .get(&(tenant_id, recipe_id))
            .cloned())
    }

    async fn get_ingredient(
        &self,
        tenant_id: TenantId,
        ingredient_id: IngredientId,
    ) -> Result<Option<Ingredient>, RepositoryError> {
        Ok(self
            .state
            .read()
            .await
            .ingredients
            .get(&(tenant_id, ingredient_id))
            .cloned())
    }

    async fn list_recipe_ids_by_ingredient(
        &self,
        tenant_id: TenantId,
        ingredient_id: IngredientId,
    ) -> Result<Vec<RecipeId>, RepositoryError> {
        let state = self.state.read().await;
        let mut ids: Vec<RecipeId> = state
            .recipes
            .values()
            .filter(|r| r.tenant_id == tenant_id && r.uses_ingredient(ingredient_id))
            .map(|r| r.id)
            .collect();
        ids.sort_by_key(|id| id.as_i32());
        Ok(ids)
    }

    async fn get_product(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
    ) -> Result<Option<Product>, RepositoryError> {
        Ok(self
            .state
            .read()
            .await
            .products
            .get(&(tenant_id, product_id))
            .cloned())
    }
}

#[async_trait]
impl SettingsRepository for InMemoryCatalog {
    async fn get_pricing_settings(
        &self,
        tenant_id: TenantId,
    ) -> Result<Option<PricingSettings>, RepositoryError> {
        Ok(self.state.read().await.settings.get(&tenant_id).cloned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use recipe_cost_core::{MeasurementUnit, RecipeItemId};

    use super::*;
    use crate::models::RecipeItem;

    fn recipe(tenant: i32, id: i32, ingredients: &[i32]) -> Recipe {
        Recipe {
            id: RecipeId::new(id),
            tenant_id: TenantId::new(tenant),
            name: format!("recipe {id}"),
            items: ingredients
                .iter()
                .enumerate()
                .map(|(n, ing)| RecipeItem {
                    id: RecipeItemId::new(id * 100 + i32::try_from(n).unwrap()),
                    ingredient_id: IngredientId::new(*ing),
                    quantity: Decimal::ONE,
                    unit: MeasurementUnit::Un,
                    waste_factor: Decimal::ZERO,
                })
                .collect(),
            yield_quantity: Decimal::ONE,
            production_time: Decimal::ZERO,
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_reverse_lookup_is_tenant_scoped() {
        let catalog = InMemoryCatalog::new();
        catalog.upsert_recipe(recipe(1, 10, &[100, 101])).await;
        catalog.upsert_recipe(recipe(1, 11, &[101])).await;
        catalog.upsert_recipe(recipe(2, 12, &[101])).await;

        let ids = catalog
            .list_recipe_ids_by_ingredient(TenantId::new(1), IngredientId::new(101))
            .await
            .unwrap();
        assert_eq!(ids, vec![RecipeId::new(10), RecipeId::new(11)]);

        let ids = catalog
            .list_recipe_ids_by_ingredient(TenantId::new(1), IngredientId::new(999))
            .await
            .unwrap();
        assert!(ids.is_empty());
    }

    #[tokio::test]
    async fn test_other_tenant_records_are_invisible() {
        let catalog = InMemoryCatalog::new();
        catalog.upsert_recipe(recipe(1, 10, &[100])).await;

        let found = catalog
            .get_recipe(TenantId::new(2), RecipeId::new(10))
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_fixture_from_yaml_shape() {
        let json = r#"{
            "settings": { "1": { "labor_cost_per_minute": "0.65" } },
            "ingredients": [
                { "id": 100, "tenant_id": 1, "name": "Flour", "unit_cost": "5.00", "unit": "kg" }
            ]
        }"#;
        let fixture: CatalogFixture = serde_json::from_str(json).unwrap();
        assert_eq!(fixture.ingredients.len(), 1);
        assert_eq!(
            fixture.settings[&TenantId::new(1)].labor_cost_per_minute,
            Decimal::new(65, 2)
        );
        assert!(fixture.recipes.is_empty());
    }
}
