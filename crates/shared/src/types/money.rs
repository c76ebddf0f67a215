//! Money type held in integer minor units.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! All arithmetic happens on `i64` minor units (cents, fils); `Decimal` is only
//! used at the edges where amounts enter or leave the system as text.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while moving between decimal and minor-unit representations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// Amount has more fractional digits than the currency allows.
    #[error("Amount {amount} has more than {digits} fractional digits for {currency}")]
    ExcessPrecision {
        /// The offending amount.
        amount: Decimal,
        /// Currency of the amount.
        currency: Currency,
        /// Fractional digits the currency supports.
        digits: u32,
    },

    /// Amount does not fit into 64-bit minor units.
    #[error("Amount overflows minor-unit range")]
    Overflow,

    /// Operation mixes two currencies.
    #[error("Currency mismatch: {left} vs {right}")]
    CurrencyMismatch {
        /// Left-hand currency.
        left: Currency,
        /// Right-hand currency.
        right: Currency,
    },
}

/// ISO 4217 currency codes supported by the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Yemeni Rial
    Yer,
    /// Saudi Riyal
    Sar,
    /// UAE Dirham
    Aed,
    /// US Dollar
    Usd,
    /// Euro
    Eur,
    /// Kuwaiti Dinar
    Kwd,
    /// Japanese Yen
    Jpy,
}

impl Currency {
    /// Number of fractional digits in one major unit.
    #[must_use]
    pub const fn minor_digits(self) -> u32 {
        match self {
            Self::Kwd => 3,
            Self::Jpy => 0,
            Self::Yer | Self::Sar | Self::Aed | Self::Usd | Self::Eur => 2,
        }
    }

    /// Returns the ISO code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Yer => "YER",
            Self::Sar => "SAR",
            Self::Aed => "AED",
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Kwd => "KWD",
            Self::Jpy => "JPY",
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "YER" => Ok(Self::Yer),
            "SAR" => Ok(Self::Sar),
            "AED" => Ok(Self::Aed),
            "USD" => Ok(Self::Usd),
            "EUR" => Ok(Self::Eur),
            "KWD" => Ok(Self::Kwd),
            "JPY" => Ok(Self::Jpy),
            _ => Err(format!("Unknown currency: {s}")),
        }
    }
}

/// A monetary amount in minor units of one currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    /// The amount in the smallest currency unit (e.g., cents).
    pub minor: i64,
    /// Currency of the amount.
    pub currency: Currency,
}

impl Money {
    /// Creates a new Money instance from minor units.
    #[must_use]
    pub const fn new(minor: i64, currency: Currency) -> Self {
        Self { minor, currency }
    }

    /// Creates a zero amount in the specified currency.
    #[must_use]
    pub const fn zero(currency: Currency) -> Self {
        Self { minor: 0, currency }
    }

    /// Parses a decimal major-unit amount (e.g. `10.50`) into minor units.
    ///
    /// Rejects amounts carrying more precision than the currency supports
    /// instead of rounding them away.
    pub fn from_decimal(amount: Decimal, currency: Currency) -> Result<Self, MoneyError> {
        let digits = currency.minor_digits();
        let normalized = amount.normalize();
        if normalized.scale() > digits {
            return Err(MoneyError::ExcessPrecision {
                amount,
                currency,
                digits,
            });
        }

        let factor = Decimal::from(10_i64.pow(digits));
        let minor = normalized
            .checked_mul(factor)
            .and_then(|v| v.to_i64())
            .ok_or(MoneyError::Overflow)?;

        Ok(Self { minor, currency })
    }

    /// Returns the amount as a decimal in major units with the currency's scale.
    #[must_use]
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.minor, self.currency.minor_digits())
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.minor == 0
    }

    /// Returns true if the amount is negative.
    #[must_use]
    pub const fn is_negative(&self) -> bool {
        self.minor < 0
    }

    /// Adds two amounts of the same currency.
    pub fn checked_add(self, other: Self) -> Result<Self, MoneyError> {
        self.ensure_same_currency(other)?;
        let minor = self.minor.checked_add(other.minor).ok_or(MoneyError::Overflow)?;
        Ok(Self::new(minor, self.currency))
    }

    /// Subtracts `other` from `self`.
    pub fn checked_sub(self, other: Self) -> Result<Self, MoneyError> {
        self.ensure_same_currency(other)?;
        let minor = self.minor.checked_sub(other.minor).ok_or(MoneyError::Overflow)?;
        Ok(Self::new(minor, self.currency))
    }

    fn ensure_same_currency(self, other: Self) -> Result<(), MoneyError> {
        if self.currency == other.currency {
            Ok(())
        } else {
            Err(MoneyError::CurrencyMismatch {
                left: self.currency,
                right: other.currency,
            })
        }
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.to_decimal(), self.currency)
    }
}
