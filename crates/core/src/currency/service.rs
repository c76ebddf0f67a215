//! Currency service for base-currency conversion.
//!
//! Amounts arrive in minor units of their own currency and leave in minor
//! units of the base currency, rounded with Banker's Rounding
//! (`MidpointNearestEven`) so repeated conversions do not drift in one direction.

use mizan_shared::{Currency, Money};
use rust_decimal::{Decimal, RoundingStrategy};

use super::error::CurrencyError;

/// Currency service for conversion operations.
pub struct CurrencyService;

impl CurrencyService {
    /// Validates a conversion rate for a line in `currency`.
    ///
    /// # Errors
    ///
    /// `InvalidRate` if the rate is not positive, `BaseRateNotOne` if a
    /// base-currency line carries a rate other than one.
    pub fn validate_rate(currency: Currency, rate: Decimal, base: Currency) -> Result<(), CurrencyError> {
        if rate <= Decimal::ZERO {
            return Err(CurrencyError::InvalidRate(rate));
        }
        if currency == base && rate != Decimal::ONE {
            return Err(CurrencyError::BaseRateNotOne {
                currency: base,
                rate,
            });
        }
        Ok(())
    }

    /// Converts `amount` into base-currency minor units: `amount * rate`.
    ///
    /// # Example
    ///
    /// ```
    /// use mizan_core::currency::CurrencyService;
    /// use mizan_shared::{Currency, Money};
    /// use rust_decimal::Decimal;
    ///
    /// // 10.00 SAR at 140.25 YER per SAR
    /// let base = CurrencyService::to_base(
    ///     Money::new(1_000, Currency::Sar),
    ///     Decimal::new(14025, 2),
    ///     Currency::Yer,
    /// )
    /// .unwrap();
    /// assert_eq!(base, 140_250);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `CurrencyError` if the rate is invalid or the result overflows.
    pub fn to_base(amount: Money, rate: Decimal, base: Currency) -> Result<i64, CurrencyError> {
        Self::validate_rate(amount.currency, rate, base)?;
        if amount.currency == base {
            return Ok(amount.minor);
        }

        let converted = amount
            .to_decimal()
            .checked_mul(rate)
            .ok_or(CurrencyError::Overflow)?;
        let rounded = Self::round(converted, base.minor_digits());
        Ok(Money::from_decimal(rounded, base)?.minor)
    }

    /// Round a decimal value using Banker's Rounding.
    #[must_use]
    pub fn round(value: Decimal, decimal_places: u32) -> Decimal {
        value.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointNearestEven)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_base_currency_passes_through() {
        let result = CurrencyService::to_base(Money::new(100_000, Currency::Yer), Decimal::ONE, Currency::Yer);
        assert_eq!(result, Ok(100_000));
    }

    #[test]
    fn test_foreign_currency_conversion() {
        // 100.00 USD * 535.5 = 53,550.00 YER
        let result =
            CurrencyService::to_base(Money::new(10_000, Currency::Usd), dec!(535.5), Currency::Yer);
        assert_eq!(result, Ok(5_355_000));
    }

    #[test]
    fn test_bankers_rounding_to_base_minor_units() {
        // 0.01 USD * 0.5 = 0.005 YER -> 0.00 (half to even)
        let result = CurrencyService::to_base(Money::new(1, Currency::Usd), dec!(0.5), Currency::Yer);
        assert_eq!(result, Ok(0));

        // 0.03 USD * 0.5 = 0.015 YER -> 0.02 (half to even)
        let result = CurrencyService::to_base(Money::new(3, Currency::Usd), dec!(0.5), Currency::Yer);
        assert_eq!(result, Ok(2));
    }

    #[test]
    fn test_different_minor_digits() {
        // 1.500 KWD * 3.25 = 4.875 USD -> 4.88
        let result = CurrencyService::to_base(Money::new(1_500, Currency::Kwd), dec!(3.25), Currency::Usd);
        assert_eq!(result, Ok(488));

        // 1000 JPY * 0.0067 = 6.70 USD
        let result = CurrencyService::to_base(Money::new(1_000, Currency::Jpy), dec!(0.0067), Currency::Usd);
        assert_eq!(result, Ok(670));
    }

    #[test]
    fn test_invalid_rate() {
        let amount = Money::new(100, Currency::Usd);
        assert_eq!(
            CurrencyService::to_base(amount, Decimal::ZERO, Currency::Yer),
            Err(CurrencyError::InvalidRate(Decimal::ZERO))
        );
        assert_eq!(
            CurrencyService::to_base(amount, dec!(-1), Currency::Yer),
            Err(CurrencyError::InvalidRate(dec!(-1)))
        );
    }

    #[test]
    fn test_base_currency_requires_unit_rate() {
        let result = CurrencyService::to_base(Money::new(100, Currency::Yer), dec!(2), Currency::Yer);
        assert!(matches!(result, Err(CurrencyError::BaseRateNotOne { .. })));
    }

    #[test]
    fn test_overflow() {
        let result = CurrencyService::to_base(Money::new(i64::MAX, Currency::Usd), dec!(1000), Currency::Yer);
        assert_eq!(result, Err(CurrencyError::Overflow));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(CurrencyError::InvalidRate(Decimal::ZERO).error_code(), "INVALID_RATE");
        assert_eq!(CurrencyError::Overflow.http_status_code(), 400);
    }
}
