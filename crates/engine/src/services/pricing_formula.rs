//! Suggested selling price from unit cost and pricing parameters.
//!
//! Fixed monthly costs are spread over the expected sales volume, variable
//! costs are a percentage of unit plus fixed cost, the margin is applied on
//! the full cost, and tax (if any) is added on top:
//!
//! ```text
//! unit_cost      = recipe_cost_per_unit + packaging
//! fixed          = fixed_monthly / volume                (0 without a volume)
//! variable       = (unit_cost + fixed) * variable_pct / 100
//! full           = unit_cost + fixed + variable
//! before_tax     = full * (1 + margin / 100)
//! suggested      = before_tax * (1 + tax / 100)
//! ```
//!
//! The engine is pure: no I/O, no clock, no cache.

use rust_decimal::Decimal;

use recipe_cost_core::{ProductId, RecipeId, percent_of, ratio_percent, round_currency, safe_div};

use crate::error::{PricingError, PricingResult};
use crate::models::{PricingFlags, PricingParameters, PricingSuggestion, TaxTreatment};

/// Margins below this percent raise `low_margin`.
pub const LOW_MARGIN_THRESHOLD: Decimal = Decimal::from_parts(20, 0, 0, false, 0);

/// Fixed cost above this share of the suggested price raises
/// `high_fixed_cost_impact`.
pub const HIGH_FIXED_COST_SHARE: Decimal = Decimal::from_parts(30, 0, 0, false, 2);

/// Stateless pricing calculator.
#[derive(Debug, Clone, Copy, Default)]
pub struct PricingFormulaEngine;

impl PricingFormulaEngine {
    /// Create a new engine.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Compute a pricing suggestion.
    ///
    /// # Errors
    ///
    /// Returns `PricingError::Validation` if packaging, fixed costs, sales
    /// volume, tax rate, current price or variable percent is negative, if
    /// the margin is -100% or lower, or if a figure overflows.
    pub fn suggest(
        &self,
        params: &PricingParameters,
        recipe_id: RecipeId,
        product_id: Option<ProductId>,
    ) -> PricingResult<PricingSuggestion> {
        validate(params)?;

        let mut flags = PricingFlags::default();

        let unit_cost = in_range(
            params.recipe_cost_per_unit.checked_add(params.packaging_cost),
            "unit_cost",
        )?;

        let fixed_cost_per_unit = match params.sales_volume_monthly {
            Some(volume) if volume > Decimal::ZERO => in_range(
                safe_div(params.fixed_monthly_costs, volume),
                "fixed_cost_per_unit",
            )?,
            _ => {
                flags.missing_sales_volume = true;
                Decimal::ZERO
            }
        };

        let unit_and_fixed = in_range(unit_cost.checked_add(fixed_cost_per_unit), "fixed_cost_per_unit")?;
        let variable_cost_unit = in_range(
            percent_of(unit_and_fixed, params.variable_cost_percent),
            "variable_cost_unit",
        )?;
        let full_unit_cost = in_range(unit_and_fixed.checked_add(variable_cost_unit), "full_unit_cost")?;

        let price_before_tax = in_range(
            percent_of(full_unit_cost, params.margin_percent)
                .and_then(|margin| full_unit_cost.checked_add(margin)),
            "price_before_tax",
        )?;

        let tax_rate = match params.tax {
            TaxTreatment::Excluded => None,
            TaxTreatment::Included(rate) => Some(rate),
            TaxTreatment::Missing => {
                flags.missing_tax_rate = true;
                None
            }
        };
        let tax_value = match tax_rate {
            Some(rate) => in_range(percent_of(price_before_tax, rate), "tax_value")?,
            None => Decimal::ZERO,
        };
        let suggested_price = in_range(price_before_tax.checked_add(tax_value), "suggested_price")?;

        let break_even_price = in_range(full_unit_cost.checked_add(tax_value), "break_even_price")?;
        let margin_value = in_range(price_before_tax.checked_sub(full_unit_cost), "margin_value")?
            .max(Decimal::ZERO);
        let markup_percent = in_range(
            suggested_price
                .checked_sub(unit_cost)
                .and_then(|gain| ratio_percent(gain, unit_cost)),
            "markup_percent",
        )?;
        let contribution_margin = in_range(
            suggested_price.checked_sub(variable_cost_unit),
            "contribution_margin",
        )?;
        let contribution_margin_percent = in_range(
            ratio_percent(contribution_margin, suggested_price),
            "contribution_margin_percent",
        )?;

        let (delta_vs_current, delta_percent_vs_current) = match params.current_price {
            Some(current) => {
                let delta = in_range(suggested_price.checked_sub(current), "delta_vs_current")?;
                let delta_percent =
                    in_range(ratio_percent(delta, current), "delta_percent_vs_current")?;
                (delta, delta_percent)
            }
            None => (Decimal::ZERO, Decimal::ZERO),
        };

        flags.low_margin = params.margin_percent < LOW_MARGIN_THRESHOLD;
        flags.below_break_even = params
            .current_price
            .is_some_and(|current| current < round_currency(break_even_price));
        flags.high_fixed_cost_impact = suggested_price > Decimal::ZERO
            && fixed_cost_per_unit
                .checked_div(suggested_price)
                .is_none_or(|share| share > HIGH_FIXED_COST_SHARE);

        Ok(PricingSuggestion {
            recipe_id,
            product_id,
            unit_cost: round_currency(unit_cost),
            packaging_cost: round_currency(params.packaging_cost),
            fixed_cost_per_unit: round_currency(fixed_cost_per_unit),
            variable_cost_unit: round_currency(variable_cost_unit),
            full_unit_cost: round_currency(full_unit_cost),
            price_before_tax: round_currency(price_before_tax),
            tax_rate,
            tax_value: round_currency(tax_value),
            suggested_price: round_currency(suggested_price),
            break_even_price: round_currency(break_even_price),
            margin_percent: params.margin_percent,
            margin_value: round_currency(margin_value),
            markup_percent: round_currency(markup_percent),
            contribution_margin: round_currency(contribution_margin),
            contribution_margin_percent: round_currency(contribution_margin_percent),
            current_price: params.current_price,
            delta_vs_current: round_currency(delta_vs_current),
            delta_percent_vs_current: round_currency(delta_percent_vs_current),
            flags,
        })
    }
}

fn in_range(value: Option<Decimal>, field: &str) -> PricingResult<Decimal> {
    value.ok_or_else(|| PricingError::validation(format!("{field} is out of range")))
}

fn validate(params: &PricingParameters) -> PricingResult<()> {
    fn non_negative(name: &str, value: Decimal) -> PricingResult<()> {
        if value < Decimal::ZERO {
            return Err(PricingError::validation(format!("{name} must not be negative")));
        }
        Ok(())
    }

    non_negative("packaging_cost", params.packaging_cost)?;
    non_negative("fixed_monthly_costs", params.fixed_monthly_costs)?;
    non_negative("variable_cost_percent", params.variable_cost_percent)?;
    if let Some(volume) = params.sales_volume_monthly {
        non_negative("sales_volume_monthly", volume)?;
    }
    if let TaxTreatment::Included(rate) = params.tax {
        non_negative("tax_rate", rate)?;
    }
    if let Some(current) = params.current_price {
        non_negative("current_price", current)?;
    }
    if params.margin_percent <= -Decimal::ONE_HUNDRED {
        return Err(PricingError::validation(
            "margin_percent must be greater than -100",
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    /// 4.85 per unit, 30% margin, 0.40 packaging, 5% variable, no fixed costs.
    fn bakery_params() -> PricingParameters {
        PricingParameters {
            recipe_cost_per_unit: d("4.85"),
            packaging_cost: d("0.40"),
            margin_percent: d("30"),
            fixed_monthly_costs: Decimal::ZERO,
            variable_cost_percent: d("5"),
            sales_volume_monthly: None,
            tax: TaxTreatment::Excluded,
            current_price: Some(d("7")),
        }
    }

    fn suggest(params: &PricingParameters) -> PricingResult<PricingSuggestion> {
        PricingFormulaEngine::new().suggest(params, RecipeId::new(10), None)
    }

    #[test]
    fn test_no_sales_volume() {
        let s = suggest(&bakery_params()).unwrap();

        assert!(s.flags.missing_sales_volume);
        assert_eq!(s.fixed_cost_per_unit, Decimal::ZERO);
        assert_eq!(s.unit_cost, d("5.25"));
        assert_eq!(s.variable_cost_unit, d("0.26"));
        assert_eq!(s.full_unit_cost, d("5.51"));
        assert_eq!(s.price_before_tax, d("7.17"));
        assert_eq!(s.suggested_price, d("7.17"));
        assert_eq!(s.tax_value, Decimal::ZERO);
        assert_eq!(s.break_even_price, d("5.51"));
        assert_eq!(s.margin_value, d("1.65"));
        assert_eq!(s.markup_percent, d("36.50"));
        assert_eq!(s.contribution_margin, d("6.90"));
        assert_eq!(s.delta_vs_current, d("0.17"));
        assert_eq!(s.delta_percent_vs_current, d("2.38"));
        assert!(!s.flags.low_margin);
        assert!(!s.flags.below_break_even);
        assert!(!s.flags.high_fixed_cost_impact);
    }

    #[test]
    fn test_zero_sales_volume_is_guarded() {
        let params = PricingParameters {
            fixed_monthly_costs: d("1000"),
            sales_volume_monthly: Some(Decimal::ZERO),
            ..bakery_params()
        };
        let s = suggest(&params).unwrap();
        assert!(s.flags.missing_sales_volume);
        assert_eq!(s.fixed_cost_per_unit, Decimal::ZERO);
    }

    #[test]
    fn test_fixed_costs_allocated_over_volume() {
        let params = PricingParameters {
            recipe_cost_per_unit: d("2.00"),
            packaging_cost: Decimal::ZERO,
            margin_percent: d("10"),
            fixed_monthly_costs: d("1500"),
            variable_cost_percent: Decimal::ZERO,
            sales_volume_monthly: Some(d("500")),
            tax: TaxTreatment::Excluded,
            current_price: Some(d("4.00")),
        };
        let s = suggest(&params).unwrap();

        assert!(!s.flags.missing_sales_volume);
        assert_eq!(s.fixed_cost_per_unit, d("3.00"));
        assert_eq!(s.full_unit_cost, d("5.00"));
        assert_eq!(s.suggested_price, d("5.50"));
        assert!(s.flags.low_margin);
        assert!(s.flags.below_break_even);
        // 3.00 / 5.50 is above 30%
        assert!(s.flags.high_fixed_cost_impact);
    }

    #[test]
    fn test_tax_inclusive_price() {
        let params = PricingParameters {
            recipe_cost_per_unit: d("10.00"),
            packaging_cost: Decimal::ZERO,
            margin_percent: d("20"),
            fixed_monthly_costs: Decimal::ZERO,
            variable_cost_percent: Decimal::ZERO,
            sales_volume_monthly: None,
            tax: TaxTreatment::Included(d("15")),
            current_price: None,
        };
        let s = suggest(&params).unwrap();

        assert_eq!(s.price_before_tax, d("12.00"));
        assert_eq!(s.suggested_price, d("13.80"));
        assert_eq!(s.tax_value, d("1.80"));
        assert_eq!(s.tax_rate, Some(d("15")));
        assert_eq!(s.break_even_price, d("11.80"));
        assert_eq!(s.delta_vs_current, Decimal::ZERO);
        assert!(!s.flags.below_break_even);
    }

    #[test]
    fn test_missing_tax_rate_applies_zero() {
        let params = PricingParameters {
            tax: TaxTreatment::Missing,
            ..bakery_params()
        };
        let s = suggest(&params).unwrap();
        assert!(s.flags.missing_tax_rate);
        assert_eq!(s.tax_value, Decimal::ZERO);
        assert_eq!(s.suggested_price, s.price_before_tax);
    }

    #[test]
    fn test_zero_cost_guards_ratios() {
        let params = PricingParameters {
            recipe_cost_per_unit: Decimal::ZERO,
            packaging_cost: Decimal::ZERO,
            margin_percent: d("30"),
            fixed_monthly_costs: Decimal::ZERO,
            variable_cost_percent: Decimal::ZERO,
            sales_volume_monthly: None,
            tax: TaxTreatment::Excluded,
            current_price: Some(Decimal::ZERO),
        };
        let s = suggest(&params).unwrap();
        assert_eq!(s.suggested_price, Decimal::ZERO);
        assert_eq!(s.markup_percent, Decimal::ZERO);
        assert_eq!(s.contribution_margin_percent, Decimal::ZERO);
        assert_eq!(s.delta_percent_vs_current, Decimal::ZERO);
    }

    #[test]
    fn test_negative_margin_clamps_margin_value() {
        let params = PricingParameters {
            margin_percent: d("-10"),
            ..bakery_params()
        };
        let s = suggest(&params).unwrap();
        assert_eq!(s.margin_value, Decimal::ZERO);
        assert!(s.flags.low_margin);
        assert!(s.suggested_price < s.full_unit_cost);
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let cases = [
            PricingParameters {
                packaging_cost: d("-0.01"),
                ..bakery_params()
            },
            PricingParameters {
                fixed_monthly_costs: d("-1"),
                ..bakery_params()
            },
            PricingParameters {
                variable_cost_percent: d("-5"),
                ..bakery_params()
            },
            PricingParameters {
                sales_volume_monthly: Some(d("-10")),
                ..bakery_params()
            },
            PricingParameters {
                tax: TaxTreatment::Included(d("-1")),
                ..bakery_params()
            },
            PricingParameters {
                current_price: Some(d("-7")),
                ..bakery_params()
            },
            PricingParameters {
                margin_percent: d("-100"),
                ..bakery_params()
            },
        ];
        for params in &cases {
            assert!(
                matches!(suggest(params), Err(PricingError::Validation(_))),
                "accepted {params:?}"
            );
        }
    }

    #[test]
    fn test_overflowing_parameters_rejected() {
        let tiny_volume = PricingParameters {
            fixed_monthly_costs: d("1000"),
            sales_volume_monthly: Some(Decimal::new(1, 28)),
            ..bakery_params()
        };
        let huge_margin = PricingParameters {
            margin_percent: Decimal::MAX,
            ..bakery_params()
        };
        let huge_tax = PricingParameters {
            tax: TaxTreatment::Included(Decimal::MAX),
            ..bakery_params()
        };
        let huge_cost = PricingParameters {
            recipe_cost_per_unit: Decimal::MAX,
            packaging_cost: d("1"),
            ..bakery_params()
        };
        for params in [&tiny_volume, &huge_margin, &huge_tax, &huge_cost] {
            let err = suggest(params).unwrap_err();
            assert!(
                matches!(err, PricingError::Validation(ref m) if m.contains("out of range")),
                "unexpected {err:?} for {params:?}"
            );
        }
    }

    #[test]
    fn test_product_pricing_snapshot() {
        let s = PricingFormulaEngine::new()
            .suggest(&bakery_params(), RecipeId::new(10), Some(ProductId::new(7)))
            .unwrap();
        let snapshot = s.to_product_pricing();
        assert_eq!(snapshot.base_price, s.full_unit_cost);
        assert_eq!(snapshot.suggested_price, d("7.17"));
        assert_eq!(snapshot.margin_percent, d("30"));
        assert_eq!(snapshot.packaging_cost, d("0.40"));
        assert_eq!(s.product_id, Some(ProductId::new(7)));
    }
}
