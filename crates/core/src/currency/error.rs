//! Currency conversion errors.

use mizan_shared::{Currency, ErrorCategory, MoneyError};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur while converting into the base currency.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CurrencyError {
    /// Rate is zero or negative.
    #[error("Exchange rate must be positive, got {0}")]
    InvalidRate(Decimal),

    /// A base-currency amount was given a rate other than one.
    #[error("Rate for base currency {currency} must be 1, got {rate}")]
    BaseRateNotOne {
        /// The base currency.
        currency: Currency,
        /// The rejected rate.
        rate: Decimal,
    },

    /// Converted amount does not fit into minor units.
    #[error("Converted amount overflows")]
    Overflow,
}

impl From<MoneyError> for CurrencyError {
    fn from(_: MoneyError) -> Self {
        Self::Overflow
    }
}

impl CurrencyError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidRate(_) => "INVALID_RATE",
            Self::BaseRateNotOne { .. } => "BASE_RATE_NOT_ONE",
            Self::Overflow => "AMOUNT_OVERFLOW",
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        ErrorCategory::Validation
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        self.category().http_status_code()
    }
}
