//! Money helpers.
//!
//! All monetary quantities are `rust_decimal::Decimal`: base-10 fixed point,
//! so sums and percentages never pick up binary rounding drift. Values are
//! stored unrounded; rounding to cents happens only when displaying.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{InvoicerError, Result};

/// Monetary amount, rate, or quantity.
pub type Money = Decimal;

/// `amount * rate / 100`, or zero when `rate` is not positive.
///
/// Rates are percentages: `10` means 10%.
///
/// # Errors
///
/// Returns `InvoicerError::Validation` if the product does not fit in a
/// `Decimal`.
pub fn percent_of(amount: Money, rate: Money) -> Result<Money> {
    if rate > Decimal::ZERO {
        checked_mul(amount, rate / Decimal::ONE_HUNDRED)
    } else {
        Ok(Decimal::ZERO)
    }
}

/// `a * b`, failing instead of panicking past the `Decimal` range.
pub fn checked_mul(a: Money, b: Money) -> Result<Money> {
    a.checked_mul(b).ok_or_else(amount_too_large)
}

/// `a + b`, failing instead of panicking past the `Decimal` range.
pub fn checked_add(a: Money, b: Money) -> Result<Money> {
    a.checked_add(b).ok_or_else(amount_too_large)
}

fn amount_too_large() -> InvoicerError {
    InvoicerError::Validation("Amount too large".to_string())
}

/// Format with exactly two decimal places.
pub fn format_money(amount: Money) -> String {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded.to_string()
}

/// Parse a user-supplied decimal such as `49.99` or `10`.
pub fn parse_money(value: &str) -> Result<Money> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(InvoicerError::Validation("Amount is empty".to_string()));
    }
    Decimal::from_str(trimmed)
        .map_err(|e| InvoicerError::Validation(format!("Invalid amount '{}': {}", trimmed, e)))
}

/// Reject negative amounts for the named field.
pub(crate) fn ensure_non_negative(field: &str, value: Money) -> Result<()> {
    if value < Decimal::ZERO {
        return Err(InvoicerError::Validation(format!(
            "{} cannot be negative",
            field
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_percent_of() {
        assert_eq!(percent_of(dec!(1500.00), dec!(10)).unwrap(), dec!(150.00));
        assert_eq!(percent_of(dec!(1350.00), dec!(8)).unwrap(), dec!(108.00));
        assert_eq!(percent_of(dec!(99.99), dec!(0)).unwrap(), Decimal::ZERO);
        assert_eq!(percent_of(dec!(99.99), dec!(-5)).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_overflow_is_an_error() {
        let huge = parse_money("99999999999999999999").unwrap();
        assert!(checked_mul(huge, huge).unwrap_err().is_validation());
        assert!(checked_add(Decimal::MAX, Decimal::ONE).unwrap_err().is_validation());
        assert!(percent_of(Decimal::MAX, dec!(200)).unwrap_err().is_validation());
    }

    #[test]
    fn test_repeated_cents_do_not_drift() {
        let mut total = Decimal::ZERO;
        for _ in 0..1000 {
            total += dec!(0.10);
        }
        assert_eq!(total, dec!(100.00));
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(dec!(1458)), "1458.00");
        assert_eq!(format_money(dec!(149.97)), "149.97");
        assert_eq!(format_money(dec!(0.005)), "0.01");
        assert_eq!(format_money(dec!(12.3449)), "12.34");
    }

    #[test]
    fn test_parse_money() {
        assert_eq!(parse_money(" 49.99 ").unwrap(), dec!(49.99));
        assert_eq!(parse_money("3").unwrap(), dec!(3));
        assert!(parse_money("").is_err());
        assert!(parse_money("abc").is_err());
    }
}
