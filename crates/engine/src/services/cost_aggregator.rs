//! Recipe bill-of-materials costing.
//!
//! Walks a recipe's items, prices each against its ingredient, then adds
//! labor and packaging:
//!
//! ```text
//! effective_qty   = quantity * (1 + waste_factor)      (in the ingredient unit)
//! ingredient_cost = sum(unit_cost * effective_qty)
//! labor_cost      = production_time * labor_cost_per_minute
//! total_cost      = ingredient_cost + labor_cost + packaging_cost
//! cost_per_unit   = total_cost / yield_quantity        (0 for a zero yield)
//! ```
//!
//! Sums keep full precision; each output field is rounded to cents once.

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, instrument};

use recipe_cost_core::{IngredientId, RecipeId, TenantId, round_currency, safe_div};

use crate::db::CatalogRepository;
use crate::error::{PricingError, PricingResult};
use crate::models::{CostLine, Ingredient, PricingSettings, Recipe, RecipeCostSummary};

/// Labor and packaging rates applied to a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchRates {
    /// Labor cost per minute of production time.
    pub labor_cost_per_minute: Decimal,
    /// Packaging cost for the whole batch.
    pub packaging_cost: Decimal,
}

impl From<&PricingSettings> for BatchRates {
    fn from(settings: &PricingSettings) -> Self {
        Self {
            labor_cost_per_minute: settings.labor_cost_per_minute,
            packaging_cost: settings.default_packaging_cost,
        }
    }
}

/// Computes [`RecipeCostSummary`] values from the catalog.
///
/// Does no caching; see [`CostingService`](super::CostingService) for the
/// memoized read path.
pub struct CostAggregator {
    catalog: Arc<dyn CatalogRepository>,
}

impl CostAggregator {
    /// Create an aggregator reading from `catalog`.
    #[must_use]
    pub fn new(catalog: Arc<dyn CatalogRepository>) -> Self {
        Self { catalog }
    }

    /// Compute the cost of one batch of a recipe.
    ///
    /// # Errors
    ///
    /// - `PricingError::NotFound` if the recipe or any of its ingredients is
    ///   missing for the tenant
    /// - `PricingError::Validation` for a non-positive quantity, a negative
    ///   waste factor, or a unit that cannot be converted to the ingredient's
    /// - `PricingError::Repository` if the store fails
    #[instrument(skip_all, fields(tenant_id = %tenant_id, recipe_id = %recipe_id))]
    pub async fn compute(
        &self,
        tenant_id: TenantId,
        recipe_id: RecipeId,
        rates: BatchRates,
    ) -> PricingResult<RecipeCostSummary> {
        let recipe = self
            .catalog
            .get_recipe(tenant_id, recipe_id)
            .await?
            .ok_or_else(|| PricingError::not_found("recipe", recipe_id))?;

        let mut ingredients: HashMap<IngredientId, Ingredient> = HashMap::new();
        for item in &recipe.items {
            if ingredients.contains_key(&item.ingredient_id) {
                continue;
            }
            let ingredient = self
                .catalog
                .get_ingredient(tenant_id, item.ingredient_id)
                .await?
                .ok_or_else(|| PricingError::not_found("ingredient", item.ingredient_id))?;
            ingredients.insert(item.ingredient_id, ingredient);
        }

        let summary = summarize(&recipe, &ingredients, rates)?;
        debug!(
            total_cost = %summary.total_cost,
            cost_per_unit = %summary.cost_per_unit,
            items = summary.lines.len(),
            "Computed recipe cost"
        );
        Ok(summary)
    }
}

/// Price a recipe against already-loaded ingredients.
///
/// # Errors
///
/// Returns `PricingError::NotFound` if an item references an ingredient not in
/// `ingredients`, and `PricingError::Validation` for invalid quantities, waste
/// factors, yields, production times or units, or for costs too large to
/// represent.
pub fn summarize(
    recipe: &Recipe,
    ingredients: &HashMap<IngredientId, Ingredient>,
    rates: BatchRates,
) -> PricingResult<RecipeCostSummary> {
    if recipe.yield_quantity < Decimal::ZERO {
        return Err(PricingError::validation(format!(
            "recipe {} has a negative yield",
            recipe.id
        )));
    }
    if recipe.production_time < Decimal::ZERO {
        return Err(PricingError::validation(format!(
            "recipe {} has a negative production time",
            recipe.id
        )));
    }

    let mut lines = Vec::with_capacity(recipe.items.len());
    let mut ingredient_cost = Decimal::ZERO;

    for item in &recipe.items {
        if item.quantity <= Decimal::ZERO {
            return Err(PricingError::validation(format!(
                "item {} quantity must be positive",
                item.id
            )));
        }
        if item.waste_factor < Decimal::ZERO {
            return Err(PricingError::validation(format!(
                "item {} waste factor must not be negative",
                item.id
            )));
        }

        let ingredient = ingredients
            .get(&item.ingredient_id)
            .ok_or_else(|| PricingError::not_found("ingredient", item.ingredient_id))?;

        let out_of_range = || PricingError::validation(format!("item {} cost is out of range", item.id));
        let effective_quantity = item
            .unit
            .convert(item.effective_quantity().ok_or_else(out_of_range)?, ingredient.unit)?;
        let line_cost = ingredient
            .unit_cost
            .checked_mul(effective_quantity)
            .ok_or_else(out_of_range)?;
        ingredient_cost = ingredient_cost
            .checked_add(line_cost)
            .ok_or_else(out_of_range)?;

        lines.push(CostLine {
            item_id: item.id,
            ingredient_id: ingredient.id,
            ingredient_name: ingredient.name.clone(),
            effective_quantity: effective_quantity.normalize(),
            unit: ingredient.unit,
            unit_cost: ingredient.unit_cost,
            line_cost: round_currency(line_cost),
        });
    }

    let out_of_range =
        |what: &str| PricingError::validation(format!("recipe {} {what} is out of range", recipe.id));
    let labor_cost = recipe
        .production_time
        .checked_mul(rates.labor_cost_per_minute)
        .ok_or_else(|| out_of_range("labor cost"))?;
    let total_cost = ingredient_cost
        .checked_add(labor_cost)
        .and_then(|cost| cost.checked_add(rates.packaging_cost))
        .ok_or_else(|| out_of_range("total cost"))?;
    let cost_per_unit =
        safe_div(total_cost, recipe.yield_quantity).ok_or_else(|| out_of_range("cost per unit"))?;

    Ok(RecipeCostSummary {
        tenant_id: recipe.tenant_id,
        recipe_id: recipe.id,
        lines,
        ingredient_cost: round_currency(ingredient_cost),
        labor_cost: round_currency(labor_cost),
        packaging_cost: round_currency(rates.packaging_cost),
        total_cost: round_currency(total_cost),
        cost_per_unit: round_currency(cost_per_unit),
        yield_quantity: recipe.yield_quantity,
    })
}
