//! `rc-cli cost` - cost one batch of a recipe.

use recipe_cost_core::{RecipeId, TenantId};

use super::catalog::Engine;
use super::print_json;

/// Print the recipe's cost summary.
///
/// # Errors
///
/// Returns an error if the recipe cannot be costed.
pub async fn run(engine: &Engine, tenant: i32, recipe: i32) -> Result<(), Box<dyn std::error::Error>> {
    let summary = engine
        .service
        .compute_recipe_cost(TenantId::new(tenant), RecipeId::new(recipe))
        .await?;
    print_json(&summary)
}
