//! `rc-cli what-if` - re-cost a recipe after repricing one ingredient.
//!
//! Runs the same write-then-invalidate sequence a catalog service would: the
//! fixture is updated, the ingredient's recipes are evicted, and the recipe is
//! costed again.

use rust_decimal::Decimal;
use serde_json::json;
use tracing::info;

use recipe_cost_core::{IngredientId, RecipeId, TenantId};
use recipe_cost_engine::db::CatalogRepository;

use super::catalog::Engine;
use super::print_json;

/// Print the recipe cost before and after the change.
///
/// # Errors
///
/// Returns an error without a `--catalog` fixture, if the ingredient does not
/// exist, or if the recipe cannot be costed.
pub async fn run(
    engine: &Engine,
    tenant: i32,
    recipe: i32,
    ingredient: i32,
    unit_cost: Decimal,
) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = engine
        .fixture
        .as_ref()
        .ok_or("what-if needs a --catalog fixture")?;
    let tenant_id = TenantId::new(tenant);
    let recipe_id = RecipeId::new(recipe);
    let ingredient_id = IngredientId::new(ingredient);

    let before = engine.service.compute_recipe_cost(tenant_id, recipe_id).await?;

    let mut changed = catalog
        .get_ingredient(tenant_id, ingredient_id)
        .await?
        .ok_or_else(|| format!("Ingredient {ingredient} not found"))?;
    let previous_cost = changed.unit_cost;
    changed.unit_cost = unit_cost;
    changed.updated_at = chrono::Utc::now();
    catalog.upsert_ingredient(changed).await;

    let evicted = engine
        .service
        .invalidate_by_ingredient(tenant_id, ingredient_id)
        .await?;
    info!(%previous_cost, %unit_cost, evicted, "Repriced ingredient");

    let after = engine.service.compute_recipe_cost(tenant_id, recipe_id).await?;

    print_json(&json!({
        "ingredient_id": ingredient_id,
        "previous_unit_cost": previous_cost,
        "unit_cost": unit_cost,
        "recipes_evicted": evicted,
        "before": before,
        "after": after,
        "total_cost_change": after.total_cost - before.total_cost,
        "cost_per_unit_change": after.cost_per_unit - before.cost_per_unit,
    }))
}
