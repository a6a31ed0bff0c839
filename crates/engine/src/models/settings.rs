//! Per-tenant pricing defaults.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Pricing defaults for a tenant.
///
/// Used whenever a request or product does not carry an explicit value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingSettings {
    /// Labor cost per minute of production time.
    pub labor_cost_per_minute: Decimal,
    /// Packaging cost applied to a recipe batch and to suggestions.
    pub default_packaging_cost: Decimal,
    /// Margin applied when none is requested, in percent.
    pub default_margin_percent: Decimal,
    /// Monthly fixed costs (rent, utilities, salaries) to allocate.
    pub fixed_monthly_costs: Decimal,
    /// Variable costs (card fees, commissions) as a percent of cost.
    pub variable_cost_percent: Decimal,
    /// Expected units sold per month, used to allocate fixed costs.
    pub default_sales_volume: Option<Decimal>,
    /// Sales tax rate in percent.
    pub default_tax_rate: Option<Decimal>,
}

impl Default for PricingSettings {
    fn default() -> Self {
        Self {
            labor_cost_per_minute: Decimal::ZERO,
            default_packaging_cost: Decimal::ZERO,
            default_margin_percent: Decimal::new(30, 0),
            fixed_monthly_costs: Decimal::ZERO,
            variable_cost_percent: Decimal::ZERO,
            default_sales_volume: None,
            default_tax_rate: None,
        }
    }
}
