//! Derived recipe cost summaries.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use recipe_cost_core::{IngredientId, MeasurementUnit, RecipeId, RecipeItemId, TenantId};

/// Cost of one recipe line after waste and unit conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostLine {
    /// Recipe item this line was computed from.
    pub item_id: RecipeItemId,
    /// Ingredient consumed.
    pub ingredient_id: IngredientId,
    /// Ingredient display name.
    pub ingredient_name: String,
    /// Quantity consumed including waste, in the ingredient's unit.
    pub effective_quantity: Decimal,
    /// The ingredient's pricing unit.
    pub unit: MeasurementUnit,
    /// Ingredient cost per `unit`.
    pub unit_cost: Decimal,
    /// `unit_cost * effective_quantity`, rounded to cents.
    pub line_cost: Decimal,
}

/// Full cost breakdown of one recipe batch.
///
/// Computed on demand, cached with a TTL, evicted when an ingredient, the
/// recipe, or a linked product changes. Every currency field is rounded to
/// cents exactly once, from unrounded sums.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeCostSummary {
    /// Tenant the recipe belongs to.
    pub tenant_id: TenantId,
    /// Recipe this summary describes.
    pub recipe_id: RecipeId,
    /// Per-line breakdown, in recipe display order.
    pub lines: Vec<CostLine>,
    /// Sum of all line costs.
    pub ingredient_cost: Decimal,
    /// `production_time * labor_cost_per_minute`.
    pub labor_cost: Decimal,
    /// Packaging for the batch.
    pub packaging_cost: Decimal,
    /// `ingredient_cost + labor_cost + packaging_cost`.
    pub total_cost: Decimal,
    /// `total_cost / yield_quantity`, or zero for a zero yield.
    pub cost_per_unit: Decimal,
    /// Yield the per-unit cost was computed for.
    pub yield_quantity: Decimal,
}
