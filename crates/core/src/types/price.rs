//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are stored as `NUMERIC(10,2)` in the database and converted to
//! minor units (cents) only at the payment-provider boundary.

use core::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use super::locale::Locale;

/// Errors that can occur when constructing or converting a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// Prices cannot be negative.
    #[error("price cannot be negative")]
    Negative,
    /// More than two decimal places were supplied.
    #[error("price cannot have more than 2 decimal places")]
    TooPrecise,
    /// Arithmetic overflowed.
    #[error("price arithmetic overflowed")]
    Overflow,
    /// Unknown ISO 4217 code.
    #[error("unsupported currency: {0}")]
    UnsupportedCurrency(String),
}

/// ISO 4217 currency codes accepted by the shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    EUR,
    USD,
    GBP,
    CHF,
    UAH,
}

impl CurrencyCode {
    /// Uppercase ISO code, e.g. `EUR`.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::EUR => "EUR",
            Self::USD => "USD",
            Self::GBP => "GBP",
            Self::CHF => "CHF",
            Self::UAH => "UAH",
        }
    }

    /// Lowercase code as the payment provider expects it, e.g. `eur`.
    #[must_use]
    pub const fn stripe_code(self) -> &'static str {
        match self {
            Self::EUR => "eur",
            Self::USD => "usd",
            Self::GBP => "gbp",
            Self::CHF => "chf",
            Self::UAH => "uah",
        }
    }

    /// Display symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::EUR => "€",
            Self::USD => "$",
            Self::GBP => "£",
            Self::CHF => "CHF",
            Self::UAH => "₴",
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for CurrencyCode {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EUR" => Ok(Self::EUR),
            "USD" => Ok(Self::USD),
            "GBP" => Ok(Self::GBP),
            "CHF" => Ok(Self::CHF),
            "UAH" => Ok(Self::UAH),
            other => Err(PriceError::UnsupportedCurrency(other.to_owned())),
        }
    }
}

/// A non-negative price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (euros, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a price, validating sign and precision.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] or [`PriceError::TooPrecise`].
    pub fn new(amount: Decimal, currency_code: CurrencyCode) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        if amount.normalize().scale() > 2 {
            return Err(PriceError::TooPrecise);
        }
        Ok(Self {
            amount,
            currency_code,
        })
    }

    /// A zero price in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency_code,
        }
    }

    /// Build a price from minor units (cents).
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] for negative input.
    pub fn from_minor_units(cents: i64, currency_code: CurrencyCode) -> Result<Self, PriceError> {
        Self::new(Decimal::new(cents, 2), currency_code)
    }

    /// Amount in minor units (cents), as sent to the payment provider.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Overflow`] if the amount does not fit in `i64`.
    pub fn to_minor_units(&self) -> Result<i64, PriceError> {
        (self.amount * Decimal::ONE_HUNDRED)
            .round()
            .to_i64()
            .ok_or(PriceError::Overflow)
    }

    /// Multiply by a line quantity.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Overflow`] on overflow.
    pub fn times(&self, quantity: u32) -> Result<Self, PriceError> {
        let amount = self
            .amount
            .checked_mul(Decimal::from(quantity))
            .ok_or(PriceError::Overflow)?;
        Ok(Self {
            amount,
            currency_code: self.currency_code,
        })
    }

    /// Add another price in the same currency.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Overflow`] on overflow.
    pub fn plus(&self, other: &Self) -> Result<Self, PriceError> {
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or(PriceError::Overflow)?;
        Ok(Self {
            amount,
            currency_code: self.currency_code,
        })
    }

    /// Format for display in the given locale.
    ///
    /// German, Russian and Ukrainian put the symbol after the amount and use a
    /// decimal comma; English prefixes the symbol.
    #[must_use]
    pub fn display(&self, locale: Locale) -> String {
        let fixed = format!("{:.2}", self.amount.round_dp(2));
        let symbol = self.currency_code.symbol();
        match locale {
            Locale::En => format!("{symbol}{fixed}"),
            Locale::De | Locale::Ru | Locale::Uk => {
                format!("{} {symbol}", fixed.replace('.', ","))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn eur(s: &str) -> Price {
        Price::new(s.parse().unwrap(), CurrencyCode::EUR).unwrap()
    }

    #[test]
    fn test_rejects_negative_and_too_precise() {
        assert_eq!(
            Price::new("-1.00".parse().unwrap(), CurrencyCode::EUR),
            Err(PriceError::Negative)
        );
        assert_eq!(
            Price::new("1.005".parse().unwrap(), CurrencyCode::EUR),
            Err(PriceError::TooPrecise)
        );
        assert!(Price::new("1.500".parse().unwrap(), CurrencyCode::EUR).is_ok());
    }

    #[test]
    fn test_minor_units() {
        assert_eq!(eur("12.50").to_minor_units().unwrap(), 1250);
        let p = Price::from_minor_units(399, CurrencyCode::EUR).unwrap();
        assert_eq!(p.amount, "3.99".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_times_and_plus() {
        let line = eur("4.90").times(3).unwrap();
        assert_eq!(line, eur("14.70"));
        assert_eq!(line.plus(&eur("0.30")).unwrap(), eur("15.00"));
    }

    #[test]
    fn test_display_per_locale() {
        let p = eur("1234.5");
        assert_eq!(p.display(Locale::En), "€1234.50");
        assert_eq!(p.display(Locale::De), "1234,50 €");
        assert_eq!(p.display(Locale::Uk), "1234,50 €");
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!("eur".parse::<CurrencyCode>().unwrap(), CurrencyCode::EUR);
        assert_eq!(CurrencyCode::UAH.stripe_code(), "uah");
        assert!("xyz".parse::<CurrencyCode>().is_err());
    }
}
