//! Decimal money amounts.
//!
//! The backend stores prices as `BigDecimal` and exchanges them as plain JSON
//! numbers, so [`Money`] serializes as a number rather than a string.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A non-currency-tagged amount in the store currency (INR).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Money {
    /// Zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create an amount from a decimal value.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create an amount from whole rupees.
    #[must_use]
    pub fn from_major(amount: i64) -> Self {
        Self(Decimal::from(amount))
    }

    /// Get the underlying decimal value.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is strictly greater than zero.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Multiply a unit price by a quantity.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Mul<u32> for Money {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self::Output {
        self.times(rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "₹{:.2}", self.0.round_dp(2))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_sum_of_line_totals() {
        let total: Money = [Money::from_major(1000).times(2), Money::from_major(500)]
            .into_iter()
            .sum();
        assert_eq!(total, Money::from_major(2500));
    }

    #[test]
    fn test_display_two_decimals() {
        let price = Money::new(Decimal::from_str("1299.5").unwrap());
        assert_eq!(price.to_string(), "₹1299.50");
    }

    #[test]
    fn test_deserializes_integer_and_fraction() {
        let whole: Money = serde_json::from_str("500").unwrap();
        assert_eq!(whole, Money::from_major(500));

        let fraction: Money = serde_json::from_str("19.99").unwrap();
        assert_eq!(fraction.amount(), Decimal::from_str("19.99").unwrap());
    }

    #[test]
    fn test_serializes_as_number() {
        let json = serde_json::to_value(Money::from_major(500)).unwrap();
        assert!(json.is_number());
        assert!((json.as_f64().unwrap() - 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_is_positive() {
        assert!(Money::from_major(1).is_positive());
        assert!(!Money::ZERO.is_positive());
        assert!(!Money::from_major(-3).is_positive());
    }
}
