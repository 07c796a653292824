//! Type-safe money representation using decimal arithmetic.
//!
//! Amounts are carried as `Decimal` in the currency's standard unit (rupees,
//! dollars). Payment gateways want integers in the smallest unit (paise,
//! cents); [`to_minor_units`] does that conversion.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// ISO 4217 currency codes accepted at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    INR,
    USD,
    EUR,
    GBP,
}

impl CurrencyCode {
    /// The three-letter ISO code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::INR => "INR",
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
        }
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Error for unsupported or malformed currency codes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported currency: {0}")]
pub struct CurrencyError(pub String);

impl std::str::FromStr for CurrencyCode {
    type Err = CurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INR" => Ok(Self::INR),
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            _ => Err(CurrencyError(s.to_owned())),
        }
    }
}

/// Error converting a decimal amount to minor units.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("amount must be positive (got {0})")]
    NotPositive(Decimal),
    #[error("amount {0} is too large")]
    Overflow(Decimal),
}

/// Convert an amount in standard units to minor units: `round(amount × 100)`.
///
/// Half-way values round away from zero, so `10.005` becomes `1001`.
///
/// # Errors
///
/// Returns `AmountError` if the amount is zero, negative, or does not fit in
/// an `i64` after scaling.
pub fn to_minor_units(amount: Decimal) -> Result<i64, AmountError> {
    if amount <= Decimal::ZERO {
        return Err(AmountError::NotPositive(amount));
    }

    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|scaled| scaled.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|rounded| rounded.to_i64())
        .ok_or(AmountError::Overflow(amount))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_minor_units_whole_amount() {
        assert_eq!(to_minor_units(Decimal::new(20040, 2)).unwrap(), 20040);
        assert_eq!(to_minor_units(Decimal::from(5)).unwrap(), 500);
    }

    #[test]
    fn test_minor_units_rounds_half_away_from_zero() {
        assert_eq!(to_minor_units(Decimal::new(10005, 3)).unwrap(), 1001);
        assert_eq!(to_minor_units(Decimal::new(10004, 3)).unwrap(), 1000);
    }

    #[test]
    fn test_minor_units_rejects_non_positive() {
        assert!(matches!(
            to_minor_units(Decimal::ZERO),
            Err(AmountError::NotPositive(_))
        ));
        assert!(matches!(
            to_minor_units(Decimal::from(-3)),
            Err(AmountError::NotPositive(_))
        ));
    }

    #[test]
    fn test_currency_parse_is_case_insensitive() {
        assert_eq!("inr".parse::<CurrencyCode>().unwrap(), CurrencyCode::INR);
        assert_eq!(" USD ".parse::<CurrencyCode>().unwrap(), CurrencyCode::USD);
        assert!("XYZ".parse::<CurrencyCode>().is_err());
    }

    #[test]
    fn test_default_currency_is_inr() {
        assert_eq!(CurrencyCode::default().to_string(), "INR");
    }
}
