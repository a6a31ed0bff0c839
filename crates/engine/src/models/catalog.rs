//! Catalog records consumed by the costing engine.
//!
//! These are read-only views of what the surrounding service persists. The
//! engine never writes them; it only derives costs and prices from them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use recipe_cost_core::{
    IngredientId, MeasurementUnit, ProductId, RecipeId, RecipeItemId, TenantId,
};

/// A purchasable ingredient priced per measurement unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    /// Unique ingredient ID.
    pub id: IngredientId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Display name.
    pub name: String,
    /// Cost per `unit`, in the tenant currency.
    pub unit_cost: Decimal,
    /// Unit the cost is expressed in.
    pub unit: MeasurementUnit,
    /// When the ingredient was last updated.
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

/// One bill-of-materials line of a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeItem {
    /// Unique item ID.
    pub id: RecipeItemId,
    /// Ingredient consumed by this line.
    pub ingredient_id: IngredientId,
    /// Nominal quantity, expected to be positive.
    pub quantity: Decimal,
    /// Unit `quantity` is measured in.
    pub unit: MeasurementUnit,
    /// Extra material lost to trim or spoilage, as a fraction (0.1 = 10%).
    #[serde(default)]
    pub waste_factor: Decimal,
}

impl RecipeItem {
    /// Quantity actually consumed: `quantity * (1 + waste_factor)`.
    ///
    /// `None` if the result does not fit in a decimal.
    #[must_use]
    pub fn effective_quantity(&self) -> Option<Decimal> {
        Decimal::ONE
            .checked_add(self.waste_factor)
            .and_then(|factor| self.quantity.checked_mul(factor))
    }
}

/// A recipe: ingredients plus the work needed to produce a batch.
///
/// A recipe has no persisted cost. Its cost is always derived from the current
/// ingredient prices and tenant settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    /// Unique recipe ID.
    pub id: RecipeId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Display name.
    pub name: String,
    /// Line items, in display order.
    #[serde(default)]
    pub items: Vec<RecipeItem>,
    /// Units produced by one batch.
    pub yield_quantity: Decimal,
    /// Hands-on production time for one batch, in minutes.
    #[serde(default)]
    pub production_time: Decimal,
    /// When the recipe was last updated.
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Recipe {
    /// Returns `true` if any line consumes the given ingredient.
    #[must_use]
    pub fn uses_ingredient(&self, ingredient_id: IngredientId) -> bool {
        self.items
            .iter()
            .any(|item| item.ingredient_id == ingredient_id)
    }
}

/// A sellable product backed by one recipe.
///
/// The price fields are snapshots taken when the product was last saved. They
/// are not recomputed on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Recipe the product is made from.
    pub recipe_id: RecipeId,
    /// Display name.
    pub name: String,
    /// Full cost per unit at save time (break-even basis before tax).
    pub base_price: Decimal,
    /// Selling price at save time, tax included when `tax_rate` is set.
    pub suggested_price: Decimal,
    /// Margin applied on top of `base_price`, in percent.
    pub margin_percent: Decimal,
    /// Per-unit packaging cost.
    #[serde(default)]
    pub packaging_cost: Decimal,
    /// Sales tax rate in percent, if the price is tax-inclusive.
    #[serde(default)]
    pub tax_rate: Option<Decimal>,
    /// When the product was last updated.
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}
