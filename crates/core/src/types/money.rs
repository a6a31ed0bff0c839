//! Currency arithmetic helpers using decimal arithmetic.
//!
//! All money in the engine is a [`Decimal`] in the tenant currency's standard
//! unit (e.g., dollars, not cents). Intermediate results keep full precision;
//! [`round_currency`] is applied exactly once, when a value leaves a
//! computation as an output field.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places for currency output fields.
pub const CURRENCY_SCALE: u32 = 2;

/// Round a currency amount to cents, half away from zero.
///
/// Rounding is idempotent: `round_currency(round_currency(x)) == round_currency(x)`.
///
/// ```
/// use recipe_cost_core::round_currency;
/// use rust_decimal::Decimal;
///
/// let raw = Decimal::new(48_500_001, 7); // 4.8500001
/// assert_eq!(round_currency(raw), Decimal::new(485, 2));
/// assert_eq!(round_currency(Decimal::new(2_345, 3)), Decimal::new(235, 2));
/// ```
#[must_use]
pub fn round_currency(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(CURRENCY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// `value * percent / 100`, or `None` if the product overflows.
#[must_use]
pub fn percent_of(value: Decimal, percent: Decimal) -> Option<Decimal> {
    value.checked_mul(percent)?.checked_div(Decimal::ONE_HUNDRED)
}

/// Divide, substituting zero when the divisor is zero.
///
/// Zero yields, zero prices and zero sales volumes are expected inputs, not
/// errors, so every ratio in the engine goes through this guard. Returns
/// `None` only when the quotient does not fit in a [`Decimal`].
#[must_use]
pub fn safe_div(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    if denominator.is_zero() {
        Some(Decimal::ZERO)
    } else {
        numerator.checked_div(denominator)
    }
}

/// `part / whole * 100`, or zero when `whole` is not positive.
///
/// `None` if the ratio overflows.
#[must_use]
pub fn ratio_percent(part: Decimal, whole: Decimal) -> Option<Decimal> {
    if whole <= Decimal::ZERO {
        Some(Decimal::ZERO)
    } else {
        part.checked_div(whole)?.checked_mul(Decimal::ONE_HUNDRED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap_or_default()
    }

    #[test]
    fn test_round_currency_half_away_from_zero() {
        assert_eq!(round_currency(d("0.005")), d("0.01"));
        assert_eq!(round_currency(d("-0.005")), d("-0.01"));
        assert_eq!(round_currency(d("4.844")), d("4.84"));
        assert_eq!(round_currency(d("4.845")), d("4.85"));
    }

    #[test]
    fn test_round_currency_idempotent() {
        for raw in ["4.85", "67.9", "0.333333", "1234.5678", "-9.995", "0"] {
            let once = round_currency(d(raw));
            assert_eq!(round_currency(once), once, "not idempotent for {raw}");
        }
    }

    #[test]
    fn test_safe_div_zero_denominator() {
        assert_eq!(safe_div(d("67.90"), Decimal::ZERO), Some(Decimal::ZERO));
        assert_eq!(safe_div(d("10"), d("4")), Some(d("2.5")));
    }

    #[test]
    fn test_percent_helpers() {
        assert_eq!(percent_of(d("200"), d("15")), Some(d("30")));
        assert_eq!(ratio_percent(d("1"), d("4")), Some(d("25")));
        assert_eq!(ratio_percent(d("1"), Decimal::ZERO), Some(Decimal::ZERO));
        assert_eq!(ratio_percent(d("1"), d("-3")), Some(Decimal::ZERO));
    }

    #[test]
    fn test_overflow_is_none() {
        assert_eq!(safe_div(d("1000"), Decimal::new(1, 28)), None);
        assert_eq!(percent_of(Decimal::MAX, Decimal::MAX), None);
        assert_eq!(ratio_percent(Decimal::MAX, Decimal::new(1, 2)), None);
    }
}
