//! Property-based tests for base-currency conversion.
//!
//! - Property 1: Conversion stays within half a minor unit of the exact product
//! - Property 2: Base-currency amounts are never altered

use mizan_shared::{Currency, Money};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::service::CurrencyService;

/// Strategy to generate minor-unit amounts (0.01 to 1,000,000.00).
fn minor_amount() -> impl Strategy<Value = i64> {
    1i64..100_000_000i64
}

/// Strategy to generate positive rates (0.0001 to 10000.0000).
fn positive_rate() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|v| Decimal::new(v, 4))
}

fn foreign_currency() -> impl Strategy<Value = Currency> {
    prop_oneof![
        Just(Currency::Usd),
        Just(Currency::Sar),
        Just(Currency::Eur),
        Just(Currency::Kwd),
        Just(Currency::Jpy),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property 1.1: Rounding error is bounded by half a base minor unit.
    #[test]
    fn prop_conversion_error_bounded(
        minor in minor_amount(),
        currency in foreign_currency(),
        rate in positive_rate(),
    ) {
        let amount = Money::new(minor, currency);
        let base = CurrencyService::to_base(amount, rate, Currency::Yer).unwrap();

        let exact = amount.to_decimal() * rate * Decimal::from(100);
        let diff = (Decimal::from(base) - exact).abs();
        prop_assert!(diff <= Decimal::new(5, 1), "diff {} too large", diff);
    }

    /// Property 1.2: Conversion is monotonic in the amount.
    #[test]
    fn prop_conversion_monotonic(
        a in minor_amount(),
        b in minor_amount(),
        rate in positive_rate(),
    ) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let lo_base = CurrencyService::to_base(Money::new(lo, Currency::Usd), rate, Currency::Yer).unwrap();
        let hi_base = CurrencyService::to_base(Money::new(hi, Currency::Usd), rate, Currency::Yer).unwrap();
        prop_assert!(lo_base <= hi_base);
    }

    /// Property 2.1: A base-currency amount at rate 1 is returned unchanged.
    #[test]
    fn prop_base_amount_unchanged(minor in minor_amount()) {
        let base = CurrencyService::to_base(Money::new(minor, Currency::Yer), Decimal::ONE, Currency::Yer).unwrap();
        prop_assert_eq!(base, minor);
    }

    /// Property 2.2: Non-positive rates are always rejected.
    #[test]
    fn prop_non_positive_rate_rejected(minor in minor_amount(), rate in -10_000i64..=0) {
        let result = CurrencyService::to_base(Money::new(minor, Currency::Usd), Decimal::from(rate), Currency::Yer);
        prop_assert!(result.is_err());
    }
}
