//! Property-based tests for `LedgerService` and `ReversalService`.
//!
//! - Property 1: accepted vouchers balance within one minor unit
//! - Property 2: reversal nets every account to zero
//! - Property 3: vouchers off by more than the tolerance are rejected

use chrono::NaiveDate;
use mizan_shared::{AccountId, Currency};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::HashMap;

use super::error::LedgerError;
use super::reversal::ReversalService;
use super::service::LedgerService;
use super::types::{AccountInfo, JournalLineInput, StageVoucherInput, BALANCE_TOLERANCE_MINOR};

/// Strategy for foreign line amounts (0.01 to 10,000.00).
fn foreign_amount() -> impl Strategy<Value = i64> {
    1i64..1_000_000i64
}

/// Strategy for conversion rates (1.000 to 500.000), so no line rounds to zero.
fn rate() -> impl Strategy<Value = Decimal> {
    (1_000i64..500_000i64).prop_map(|v| Decimal::new(v, 3))
}

/// Strategy for non-base currencies with two minor digits.
fn foreign_currency() -> impl Strategy<Value = Currency> {
    prop_oneof![
        Just(Currency::Sar),
        Just(Currency::Aed),
        Just(Currency::Usd),
        Just(Currency::Eur),
    ]
}

fn no_accounts(_: AccountId) -> Option<AccountInfo> {
    None
}

fn input(lines: Vec<JournalLineInput>) -> StageVoucherInput {
    StageVoucherInput {
        date: NaiveDate::from_ymd_opt(2026, 3, 15).unwrap(),
        description: "Generated".to_string(),
        reference: None,
        lines,
    }
}

/// Foreign debits balanced by base-currency credits computed from the same
/// conversion, plus the accounts they touch.
fn balanced_lines(
    debits: &[(i64, Currency, Decimal)],
) -> (Vec<JournalLineInput>, HashMap<AccountId, AccountInfo>) {
    let mut lines = Vec::new();
    let mut accounts = HashMap::new();
    let mut total_base = 0i64;
    for (amount, currency, rate) in debits {
        let id = AccountId::new();
        accounts.insert(
            id,
            AccountInfo {
                id,
                is_active: true,
                is_leaf: true,
            },
        );
        lines.push(JournalLineInput::debit(id, *amount, *currency).with_rate(*rate));
        let converted = crate::currency::CurrencyService::to_base(
            mizan_shared::Money::new(*amount, *currency),
            *rate,
            Currency::Yer,
        )
        .unwrap();
        total_base += converted;
    }
    let credit_account = AccountId::new();
    accounts.insert(
        credit_account,
        AccountInfo {
            id: credit_account,
            is_active: true,
            is_leaf: true,
        },
    );
    lines.push(JournalLineInput::credit(credit_account, total_base, Currency::Yer));
    (lines, accounts)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property 1: whatever validation accepts balances within the tolerance.
    #[test]
    fn prop_accepted_vouchers_balance(
        debits in prop::collection::vec((foreign_amount(), foreign_currency(), rate()), 1..6),
        skew in -1i64..=1i64,
    ) {
        let (mut lines, accounts) = balanced_lines(&debits);
        if let Some(last) = lines.last_mut() {
            last.credit += skew;
        }
        let result = LedgerService::validate_and_resolve(
            &input(lines),
            Currency::Yer,
            |id| accounts.get(&id).copied(),
        );

        match result {
            Ok((_, totals)) => prop_assert!(totals.delta().abs() <= BALANCE_TOLERANCE_MINOR),
            // A skew of -1 can zero out a one-unit credit.
            Err(LedgerError::MalformedLine { .. }) => prop_assert!(skew < 0),
            Err(other) => prop_assert!(false, "unexpected error: {other}"),
        }
    }

    /// Property 2: original plus reversal leaves every account at zero.
    #[test]
    fn prop_reversal_nets_to_zero(
        debits in prop::collection::vec((foreign_amount(), foreign_currency(), rate()), 1..6),
    ) {
        let (lines, accounts) = balanced_lines(&debits);
        let (resolved, _) = LedgerService::validate_and_resolve(
            &input(lines),
            Currency::Yer,
            |id| accounts.get(&id).copied(),
        )
        .unwrap();
        let reversed = ReversalService::reversing_lines(&resolved);

        let mut net: HashMap<AccountId, (i64, i64)> = HashMap::new();
        for line in resolved.iter().chain(reversed.iter()) {
            let entry = net.entry(line.account_id).or_default();
            entry.0 += line.base_debit - line.base_credit;
            entry.1 += line.debit - line.credit;
        }
        for (base, own) in net.values() {
            prop_assert_eq!(*base, 0);
            prop_assert_eq!(*own, 0);
        }
    }

    /// Property 3: an imbalance beyond the tolerance is always rejected.
    #[test]
    fn prop_imbalance_rejected(
        debits in prop::collection::vec((foreign_amount(), foreign_currency(), rate()), 1..6),
        extra in 2i64..1_000_000i64,
    ) {
        let (mut lines, accounts) = balanced_lines(&debits);
        if let Some(last) = lines.last_mut() {
            last.credit += extra;
        }
        let result = LedgerService::validate_and_resolve(
            &input(lines),
            Currency::Yer,
            |id| accounts.get(&id).copied(),
        );
        let is_unbalanced = matches!(result, Err(LedgerError::UnbalancedVoucher { .. }));
        prop_assert!(is_unbalanced);
    }
}

#[test]
fn test_unknown_accounts_rejected_before_balance() {
    let (lines, _) = balanced_lines(&[(100, Currency::Usd, Decimal::ONE)]);
    let err = LedgerService::validate_and_resolve(&input(lines), Currency::Yer, no_accounts).unwrap_err();
    assert!(matches!(err, LedgerError::AccountNotFound(_)));
}
