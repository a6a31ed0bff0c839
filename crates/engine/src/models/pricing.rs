//! Pricing suggestion inputs and outputs.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use recipe_cost_core::{ProductId, RecipeId, TenantId};

/// A request for a suggested selling price.
///
/// Either `recipe_id` or `product_id` must be set. Every `Option` field left
/// empty falls back to the product's stored value (when a product is given)
/// and then to the tenant's [`PricingSettings`](super::PricingSettings).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingSuggestionInput {
    /// Tenant making the request.
    pub tenant_id: TenantId,
    /// Recipe to price.
    pub recipe_id: Option<RecipeId>,
    /// Product to price; its recipe is used and its stored fields are defaults.
    pub product_id: Option<ProductId>,
    /// Margin over full cost, in percent.
    pub margin_percent: Option<Decimal>,
    /// Per-unit packaging cost.
    pub packaging_cost: Option<Decimal>,
    /// Make the suggested price tax-inclusive.
    #[serde(default)]
    pub include_tax: bool,
    /// Tax rate in percent. Setting it implies `include_tax`.
    pub tax_rate: Option<Decimal>,
    /// Monthly fixed costs to allocate across the sales volume.
    pub fixed_monthly_costs: Option<Decimal>,
    /// Variable costs as a percent of unit plus fixed cost.
    pub variable_cost_percent: Option<Decimal>,
    /// Expected units sold per month.
    pub sales_volume_monthly: Option<Decimal>,
    /// Price currently charged, for comparison.
    pub current_price: Option<Decimal>,
}

impl PricingSuggestionInput {
    /// A request for `recipe_id` with every parameter left to the defaults.
    #[must_use]
    pub const fn for_recipe(tenant_id: TenantId, recipe_id: RecipeId) -> Self {
        Self::empty(tenant_id, Some(recipe_id), None)
    }

    /// A request for `product_id` with every parameter left to the defaults.
    #[must_use]
    pub const fn for_product(tenant_id: TenantId, product_id: ProductId) -> Self {
        Self::empty(tenant_id, None, Some(product_id))
    }

    const fn empty(
        tenant_id: TenantId,
        recipe_id: Option<RecipeId>,
        product_id: Option<ProductId>,
    ) -> Self {
        Self {
            tenant_id,
            recipe_id,
            product_id,
            margin_percent: None,
            packaging_cost: None,
            include_tax: false,
            tax_rate: None,
            fixed_monthly_costs: None,
            variable_cost_percent: None,
            sales_volume_monthly: None,
            current_price: None,
        }
    }

    /// Whether the caller asked for a tax-inclusive price.
    #[must_use]
    pub const fn wants_tax(&self) -> bool {
        self.include_tax || self.tax_rate.is_some()
    }
}

/// How tax applies to a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "rate", rename_all = "snake_case")]
pub enum TaxTreatment {
    /// Price is quoted before tax.
    Excluded,
    /// Price includes tax at the given percent.
    Included(Decimal),
    /// Tax was requested but no rate could be resolved; treated as 0%.
    Missing,
}

/// Fully resolved inputs of the pricing formula.
///
/// Produced by the costing service after applying request overrides, product
/// snapshots and tenant defaults. The formula itself does no I/O.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingParameters {
    /// Recipe cost per produced unit.
    pub recipe_cost_per_unit: Decimal,
    /// Per-unit packaging cost.
    pub packaging_cost: Decimal,
    /// Margin over full cost, in percent.
    pub margin_percent: Decimal,
    /// Monthly fixed costs.
    pub fixed_monthly_costs: Decimal,
    /// Variable costs, in percent.
    pub variable_cost_percent: Decimal,
    /// Expected units sold per month.
    pub sales_volume_monthly: Option<Decimal>,
    /// Tax handling.
    pub tax: TaxTreatment,
    /// Price currently charged.
    pub current_price: Option<Decimal>,
}

/// Non-fatal warnings raised while computing a suggestion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingFlags {
    /// No sales volume to allocate fixed costs over; allocation left at 0.
    pub missing_sales_volume: bool,
    /// Tax requested without a resolvable rate; 0% applied.
    pub missing_tax_rate: bool,
    /// Margin below 20%.
    pub low_margin: bool,
    /// Current price is below the break-even price.
    pub below_break_even: bool,
    /// Fixed costs are more than 30% of the suggested price.
    pub high_fixed_cost_impact: bool,
}

/// A suggested selling price with its derived indicators.
///
/// Never persisted. All currency fields are rounded to cents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingSuggestion {
    /// Recipe the suggestion was computed for.
    pub recipe_id: RecipeId,
    /// Product the defaults came from, if any.
    pub product_id: Option<ProductId>,
    /// Recipe cost per unit plus packaging.
    pub unit_cost: Decimal,
    /// Packaging included in `unit_cost`.
    pub packaging_cost: Decimal,
    /// Share of monthly fixed costs per unit.
    pub fixed_cost_per_unit: Decimal,
    /// Variable costs per unit.
    pub variable_cost_unit: Decimal,
    /// `unit_cost + fixed_cost_per_unit + variable_cost_unit`.
    pub full_unit_cost: Decimal,
    /// Suggested price before tax.
    pub price_before_tax: Decimal,
    /// Tax rate applied, in percent.
    pub tax_rate: Option<Decimal>,
    /// Tax included in `suggested_price`.
    pub tax_value: Decimal,
    /// Suggested selling price.
    pub suggested_price: Decimal,
    /// Price at which the margin is exactly zero.
    pub break_even_price: Decimal,
    /// Margin applied, in percent.
    pub margin_percent: Decimal,
    /// Margin amount per unit.
    pub margin_value: Decimal,
    /// `(suggested - unit_cost) / unit_cost * 100`.
    pub markup_percent: Decimal,
    /// `suggested - variable_cost_unit`.
    pub contribution_margin: Decimal,
    /// Contribution margin as a percent of the suggested price.
    pub contribution_margin_percent: Decimal,
    /// Price currently charged, if supplied.
    pub current_price: Option<Decimal>,
    /// `suggested - current`, or 0 without a current price.
    pub delta_vs_current: Decimal,
    /// `delta / current * 100`, or 0 without a positive current price.
    pub delta_percent_vs_current: Decimal,
    /// Warnings.
    pub flags: PricingFlags,
}

impl PricingSuggestion {
    /// The price fields to persist on a product saved from this suggestion.
    #[must_use]
    pub const fn to_product_pricing(&self) -> ProductPricing {
        ProductPricing {
            base_price: self.full_unit_cost,
            suggested_price: self.suggested_price,
            margin_percent: self.margin_percent,
            packaging_cost: self.packaging_cost,
            tax_rate: self.tax_rate,
        }
    }
}

/// Price snapshot stored on a product at save time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPricing {
    /// Full cost per unit (unit + fixed + variable), before tax.
    pub base_price: Decimal,
    /// Selling price.
    pub suggested_price: Decimal,
    /// Margin applied, in percent.
    pub margin_percent: Decimal,
    /// Per-unit packaging cost.
    pub packaging_cost: Decimal,
    /// Tax rate, if the price is tax-inclusive.
    pub tax_rate: Option<Decimal>,
}

/// Display metrics re-derived from a product's stored prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPricingSummary {
    /// Product summarized.
    pub product_id: ProductId,
    /// Stored cost basis.
    pub base_price: Decimal,
    /// Stored selling price.
    pub suggested_price: Decimal,
    /// Selling price with tax removed.
    pub price_before_tax: Decimal,
    /// Stored tax rate.
    pub tax_rate: Option<Decimal>,
    /// Tax included in the selling price.
    pub tax_value: Decimal,
    /// Stored margin percent.
    pub margin_percent: Decimal,
    /// `base_price * margin_percent / 100`.
    pub margin_value: Decimal,
    /// Price at which the margin is zero, tax included.
    pub break_even_price: Decimal,
    /// `price_before_tax - base_price`.
    pub contribution_margin: Decimal,
    /// Contribution margin as a percent of the selling price.
    pub contribution_margin_percent: Decimal,
    /// `(suggested - base) / base * 100`.
    pub markup_percent: Decimal,
}
