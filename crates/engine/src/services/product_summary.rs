//! Display figures derived from a product's saved prices.
//!
//! Cheap and cache-free: nothing is read besides the product itself, and the
//! saved `base_price` and `suggested_price` are taken as they are.

use rust_decimal::Decimal;

use recipe_cost_core::{percent_of, ratio_percent, round_currency};

use crate::error::{PricingError, PricingResult};
use crate::models::{Product, ProductPricingSummary};

/// Derive the financial indicators shown alongside a product.
///
/// # Errors
///
/// Returns `PricingError::Validation` if a saved figure is so large that a
/// derived one overflows.
pub fn derive_product_summary(product: &Product) -> PricingResult<ProductPricingSummary> {
    let out_of_range =
        |field: &str| PricingError::validation(format!("product {} {field} is out of range", product.id));
    let base = product.base_price;
    let suggested = product.suggested_price;
    let tax = product.tax_rate.unwrap_or_default();

    let tax_multiplier = percent_of(Decimal::ONE, tax)
        .and_then(|share| Decimal::ONE.checked_add(share))
        .ok_or_else(|| out_of_range("tax_rate"))?;
    let price_before_tax = if tax > Decimal::ZERO {
        suggested
            .checked_div(tax_multiplier)
            .ok_or_else(|| out_of_range("price_before_tax"))?
    } else {
        suggested
    };
    let tax_value = suggested - price_before_tax;
    let contribution_margin = price_before_tax
        .checked_sub(base)
        .ok_or_else(|| out_of_range("contribution_margin"))?;
    let markup = suggested
        .checked_sub(base)
        .and_then(|gain| ratio_percent(gain, base))
        .ok_or_else(|| out_of_range("markup_percent"))?;

    Ok(ProductPricingSummary {
        product_id: product.id,
        base_price: base,
        suggested_price: suggested,
        price_before_tax: round_currency(price_before_tax),
        tax_rate: product.tax_rate,
        tax_value: round_currency(tax_value),
        margin_percent: product.margin_percent,
        margin_value: round_currency(
            percent_of(base, product.margin_percent).ok_or_else(|| out_of_range("margin_value"))?,
        ),
        break_even_price: round_currency(
            base.checked_mul(tax_multiplier)
                .ok_or_else(|| out_of_range("break_even_price"))?,
        ),
        contribution_margin: round_currency(contribution_margin),
        contribution_margin_percent: round_currency(
            ratio_percent(contribution_margin, suggested)
                .ok_or_else(|| out_of_range("contribution_margin_percent"))?,
        ),
        markup_percent: round_currency(markup),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use recipe_cost_core::{ProductId, RecipeId, TenantId};

    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn product(base: &str, suggested: &str, margin: &str, tax: Option<&str>) -> Product {
        Product {
            id: ProductId::new(7),
            tenant_id: TenantId::new(1),
            recipe_id: RecipeId::new(10),
            name: "Brownie".to_string(),
            base_price: d(base),
            suggested_price: d(suggested),
            margin_percent: d(margin),
            packaging_cost: d("0.40"),
            tax_rate: tax.map(d),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_tax_inclusive_product() {
        let s = derive_product_summary(&product("10.00", "13.80", "20", Some("15"))).unwrap();

        assert_eq!(s.price_before_tax, d("12.00"));
        assert_eq!(s.tax_value, d("1.80"));
        assert_eq!(s.margin_value, d("2.00"));
        assert_eq!(s.break_even_price, d("11.50"));
        assert_eq!(s.contribution_margin, d("2.00"));
        assert_eq!(s.contribution_margin_percent, d("14.49"));
        assert_eq!(s.markup_percent, d("38.00"));
    }

    #[test]
    fn test_untaxed_product() {
        let s = derive_product_summary(&product("5.00", "6.50", "30", None)).unwrap();

        assert_eq!(s.price_before_tax, d("6.50"));
        assert_eq!(s.tax_value, Decimal::ZERO);
        assert_eq!(s.break_even_price, d("5.00"));
        assert_eq!(s.contribution_margin, d("1.50"));
        assert_eq!(s.markup_percent, d("30.00"));
    }

    #[test]
    fn test_saved_prices_are_not_recomputed() {
        let p = product("5.00", "99.99", "30", None);
        let s = derive_product_summary(&p).unwrap();
        assert_eq!(s.base_price, p.base_price);
        assert_eq!(s.suggested_price, p.suggested_price);
    }

    #[test]
    fn test_zero_prices_are_guarded() {
        let s = derive_product_summary(&product("0", "0", "0", Some("10"))).unwrap();
        assert_eq!(s.markup_percent, Decimal::ZERO);
        assert_eq!(s.contribution_margin_percent, Decimal::ZERO);
        assert_eq!(s.price_before_tax, Decimal::ZERO);
    }

    #[test]
    fn test_overflowing_saved_prices_are_rejected() {
        let huge = Decimal::MAX.to_string();
        let err = derive_product_summary(&product(&huge, "10", "30", Some("10"))).unwrap_err();
        assert!(matches!(err, PricingError::Validation(_)));

        let err = derive_product_summary(&product("0.01", &huge, "30", None)).unwrap_err();
        assert!(matches!(err, PricingError::Validation(_)));
    }
}
