//! Money types with precise decimal arithmetic
//!
//! Claim values travel through the codec as `Money` backed by rust_decimal so
//! that totals never pick up floating-point noise. TISS documents require every
//! monetary value to render as fixed-point with exactly two decimals, which is
//! what [`Money::to_fixed`] produces.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Currency of a TISS amount (ISO 4217)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    BRL,
}

impl Currency {
    pub fn decimal_places(&self) -> u32 {
        match self {
            Currency::BRL => 2,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::BRL => "R$",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}

/// A monetary amount with associated currency
///
/// Amounts are kept at the currency's precision, rounded half away from zero
/// on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self {
            amount: amount.round_dp_with_strategy(
                currency.decimal_places(),
                RoundingStrategy::MidpointAwayFromZero,
            ),
            currency,
        }
    }

    pub fn brl(amount: Decimal) -> Self {
        Self::new(amount, Currency::BRL)
    }

    /// Creates a strictly positive amount
    ///
    /// Zero, negatives and anything that rounds to zero are rejected.
    pub fn positive(amount: Decimal, currency: Currency) -> Result<Self, MoneyError> {
        let money = Self::new(amount, currency);
        if !money.is_positive() {
            return Err(MoneyError::InvalidAmount(format!(
                "{amount} must be greater than zero"
            )));
        }
        Ok(money)
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn is_positive(&self) -> bool {
        self.amount.is_sign_positive() && !self.amount.is_zero()
    }

    /// Renders the amount as fixed-point with the currency's decimal places
    ///
    /// `150` renders as `150.00`, `300.5` as `300.50`. No symbol, no grouping.
    pub fn to_fixed(&self) -> String {
        let dp = self.currency.decimal_places() as usize;
        format!("{:.dp$}", self.amount, dp = dp)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.currency.symbol(), self.to_fixed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_fixed_rendering_pads_to_two_places() {
        assert_eq!(Money::brl(dec!(150)).to_fixed(), "150.00");
        assert_eq!(Money::brl(dec!(150.0)).to_fixed(), "150.00");
        assert_eq!(Money::brl(dec!(300.5)).to_fixed(), "300.50");
        assert_eq!(Money::brl(dec!(0.01)).to_fixed(), "0.01");
    }

    #[test]
    fn test_construction_rounds_half_away_from_zero() {
        assert_eq!(Money::brl(dec!(10.005)).to_fixed(), "10.01");
        assert_eq!(Money::brl(dec!(10.004)).to_fixed(), "10.00");
    }

    #[test]
    fn test_positive_rejects_zero_and_negative() {
        assert!(Money::positive(dec!(0), Currency::BRL).is_err());
        assert!(Money::positive(dec!(-1), Currency::BRL).is_err());
        assert!(Money::positive(dec!(0.001), Currency::BRL).is_err());
        assert!(Money::positive(dec!(1), Currency::BRL).is_ok());
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::brl(dec!(42)).to_string(), "R$ 42.00");
    }

    #[test]
    fn test_serde_keeps_currency_code() {
        let json = serde_json::to_value(Money::brl(dec!(1.5))).unwrap();
        assert_eq!(json["currency"], "BRL");
    }
}
