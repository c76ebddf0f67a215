//! Ledger service for voucher validation and resolution.
//!
//! Pure business logic: callers supply account lookups as closures and persist
//! whatever comes back.

use mizan_shared::{AccountId, Currency, Money, VoucherId};

use super::error::LedgerError;
use super::types::{
    AccountInfo, JournalLine, JournalLineInput, StageVoucherInput, VoucherStatus, VoucherTotals,
};
use crate::currency::CurrencyService;

/// Ledger service for voucher validation and resolution.
pub struct LedgerService;

impl LedgerService {
    /// Validate and resolve a voucher before staging.
    ///
    /// 1. Requires a description and at least two lines
    /// 2. Checks every line has exactly one positive side
    /// 3. Checks the account exists and is an active leaf
    /// 4. Converts each side into base minor units at the line rate
    /// 5. Checks base debits and credits agree within the tolerance
    ///
    /// # Errors
    ///
    /// Returns the first `LedgerError` encountered, in the order above.
    pub fn validate_and_resolve<A>(
        input: &StageVoucherInput,
        base: Currency,
        account_lookup: A,
    ) -> Result<(Vec<JournalLine>, VoucherTotals), LedgerError>
    where
        A: Fn(AccountId) -> Option<AccountInfo>,
    {
        if input.description.trim().is_empty() {
            return Err(LedgerError::InvalidVoucherInput(
                "description must not be empty".to_string(),
            ));
        }
        if input.lines.len() < 2 {
            return Err(LedgerError::InsufficientLines);
        }

        let mut resolved = Vec::with_capacity(input.lines.len());
        for (idx, line) in input.lines.iter().enumerate() {
            resolved.push(Self::resolve_line(idx + 1, line, base, &account_lookup)?);
        }

        let totals = Self::calculate_totals(&resolved)?;
        Self::check_balance(totals, base)?;
        Ok((resolved, totals))
    }

    fn resolve_line<A>(
        line_no: usize,
        line: &JournalLineInput,
        base: Currency,
        account_lookup: &A,
    ) -> Result<JournalLine, LedgerError>
    where
        A: Fn(AccountId) -> Option<AccountInfo>,
    {
        let amount = Self::line_amount(line_no, line.debit, line.credit)?;

        let info = account_lookup(line.account_id)
            .ok_or(LedgerError::AccountNotFound(line.account_id))?;
        Self::check_postable(&info)?;

        let base_amount = CurrencyService::to_base(Money::new(amount, line.currency), line.rate, base)
            .map_err(|source| LedgerError::Conversion {
                line: line_no,
                source,
            })?;
        let (base_debit, base_credit) = if line.debit > 0 {
            (base_amount, 0)
        } else {
            (0, base_amount)
        };

        Ok(JournalLine {
            line_no: i32::try_from(line_no).map_err(|_| LedgerError::InvalidVoucherInput(
                "too many lines".to_string(),
            ))?,
            account_id: line.account_id,
            debit: line.debit,
            credit: line.credit,
            currency: line.currency,
            rate: line.rate,
            base_debit,
            base_credit,
            entity_id: line.entity_id,
            memo: line.memo.clone(),
        })
    }

    /// Returns the positive side of a line.
    fn line_amount(line_no: usize, debit: i64, credit: i64) -> Result<i64, LedgerError> {
        let malformed = |reason| LedgerError::MalformedLine {
            line: line_no,
            reason,
        };
        if debit < 0 || credit < 0 {
            return Err(malformed("amounts must not be negative"));
        }
        match (debit > 0, credit > 0) {
            (true, false) => Ok(debit),
            (false, true) => Ok(credit),
            (true, true) => Err(malformed("debit and credit are both set")),
            (false, false) => Err(malformed("debit or credit must be positive")),
        }
    }

    /// Sum base amounts without overflowing.
    ///
    /// # Errors
    ///
    /// `AmountOverflow` if either side exceeds `i64`.
    pub fn calculate_totals(lines: &[JournalLine]) -> Result<VoucherTotals, LedgerError> {
        lines.iter().try_fold(VoucherTotals::default(), |acc, line| {
            Ok(VoucherTotals {
                base_debit: acc
                    .base_debit
                    .checked_add(line.base_debit)
                    .ok_or(LedgerError::AmountOverflow)?,
                base_credit: acc
                    .base_credit
                    .checked_add(line.base_credit)
                    .ok_or(LedgerError::AmountOverflow)?,
            })
        })
    }

    /// Check base totals agree within `BALANCE_TOLERANCE_MINOR`.
    ///
    /// # Errors
    ///
    /// `UnbalancedVoucher` with amounts in base major units.
    pub fn check_balance(totals: VoucherTotals, base: Currency) -> Result<(), LedgerError> {
        let delta = totals
            .base_debit
            .checked_sub(totals.base_credit)
            .ok_or(LedgerError::AmountOverflow)?;
        if delta.abs() <= super::types::BALANCE_TOLERANCE_MINOR {
            return Ok(());
        }
        Err(LedgerError::UnbalancedVoucher {
            delta: Money::new(delta, base).to_decimal(),
            debit: Money::new(totals.base_debit, base).to_decimal(),
            credit: Money::new(totals.base_credit, base).to_decimal(),
        })
    }

    /// Only active leaf accounts accept lines.
    ///
    /// # Errors
    ///
    /// `NonPostableAccount` naming the reason.
    pub const fn check_postable(info: &AccountInfo) -> Result<(), LedgerError> {
        if !info.is_active {
            return Err(LedgerError::NonPostableAccount {
                account_id: info.id,
                reason: "account is inactive",
            });
        }
        if !info.is_leaf {
            return Err(LedgerError::NonPostableAccount {
                account_id: info.id,
                reason: "account has children",
            });
        }
        Ok(())
    }

    /// Re-run the posting checks over stored lines.
    ///
    /// Accounts may have been deactivated or gained children since staging.
    ///
    /// # Errors
    ///
    /// `AccountNotFound`, `NonPostableAccount` or `UnbalancedVoucher`.
    pub fn revalidate<A>(
        lines: &[JournalLine],
        base: Currency,
        account_lookup: A,
    ) -> Result<VoucherTotals, LedgerError>
    where
        A: Fn(AccountId) -> Option<AccountInfo>,
    {
        if lines.len() < 2 {
            return Err(LedgerError::InsufficientLines);
        }
        for line in lines {
            let info = account_lookup(line.account_id)
                .ok_or(LedgerError::AccountNotFound(line.account_id))?;
            Self::check_postable(&info)?;
        }
        let totals = Self::calculate_totals(lines)?;
        Self::check_balance(totals, base)?;
        Ok(totals)
    }

    /// Validate that a voucher can be posted.
    ///
    /// # Errors
    ///
    /// `AlreadyPosted` if it is not a draft.
    pub const fn ensure_can_post(id: VoucherId, status: VoucherStatus) -> Result<(), LedgerError> {
        match status {
            VoucherStatus::Draft => Ok(()),
            VoucherStatus::Posted => Err(LedgerError::AlreadyPosted(id)),
        }
    }

    /// Validate that a voucher can be reversed.
    ///
    /// # Errors
    ///
    /// `NotPosted` for drafts, `AlreadyReversed` if a reversal exists.
    pub const fn ensure_can_reverse(
        id: VoucherId,
        status: VoucherStatus,
        already_reversed: bool,
    ) -> Result<(), LedgerError> {
        match status {
            VoucherStatus::Draft => Err(LedgerError::NotPosted(id)),
            VoucherStatus::Posted if already_reversed => Err(LedgerError::AlreadyReversed(id)),
            VoucherStatus::Posted => Ok(()),
        }
    }

    /// Validate that a voucher can be discarded.
    ///
    /// # Errors
    ///
    /// `AlreadyPosted` for posted vouchers.
    pub const fn ensure_can_discard(id: VoucherId, status: VoucherStatus) -> Result<(), LedgerError> {
        Self::ensure_can_post(id, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn leaf(id: AccountId) -> AccountInfo {
        AccountInfo {
            id,
            is_active: true,
            is_leaf: true,
        }
    }

    fn lookup(accounts: &[AccountInfo]) -> impl Fn(AccountId) -> Option<AccountInfo> + '_ {
        let map: HashMap<AccountId, AccountInfo> = accounts.iter().map(|a| (a.id, *a)).collect();
        move |id| map.get(&id).copied()
    }

    fn input(lines: Vec<JournalLineInput>) -> StageVoucherInput {
        StageVoucherInput {
            date: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            description: "Delivery fee".to_string(),
            reference: None,
            lines,
        }
    }

    #[test]
    fn test_balanced_voucher_resolves() {
        let cash = AccountId::new();
        let revenue = AccountId::new();
        let accounts = [leaf(cash), leaf(revenue)];

        let (lines, totals) = LedgerService::validate_and_resolve(
            &input(vec![
                JournalLineInput::debit(cash, 100_000, Currency::Yer),
                JournalLineInput::credit(revenue, 100_000, Currency::Yer),
            ]),
            Currency::Yer,
            lookup(&accounts),
        )
        .unwrap();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].line_no, 1);
        assert_eq!(lines[0].base_debit, 100_000);
        assert_eq!(lines[1].base_credit, 100_000);
        assert!(totals.is_balanced());
    }

    #[test]
    fn test_unbalanced_voucher_reports_delta_in_major_units() {
        let cash = AccountId::new();
        let revenue = AccountId::new();
        let accounts = [leaf(cash), leaf(revenue)];

        let err = LedgerService::validate_and_resolve(
            &input(vec![
                JournalLineInput::debit(cash, 100_000, Currency::Yer),
                JournalLineInput::credit(revenue, 90_000, Currency::Yer),
            ]),
            Currency::Yer,
            lookup(&accounts),
        )
        .unwrap_err();

        match err {
            LedgerError::UnbalancedVoucher { delta, .. } => assert_eq!(delta, dec!(100)),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_multi_currency_voucher_within_tolerance() {
        let cash_sar = AccountId::new();
        let revenue = AccountId::new();
        let accounts = [leaf(cash_sar), leaf(revenue)];

        // 10.01 SAR at 140.255 = 1403.95255 YER, rounds to 1403.95
        let (lines, totals) = LedgerService::validate_and_resolve(
            &input(vec![
                JournalLineInput::debit(cash_sar, 1_001, Currency::Sar).with_rate(dec!(140.255)),
                JournalLineInput::credit(revenue, 140_396, Currency::Yer),
            ]),
            Currency::Yer,
            lookup(&accounts),
        )
        .unwrap();

        assert_eq!(lines[0].base_debit, 140_395);
        assert_eq!(totals.delta(), -1);
    }

    #[test]
    fn test_single_line_rejected() {
        let cash = AccountId::new();
        let err = LedgerService::validate_and_resolve(
            &input(vec![JournalLineInput::debit(cash, 100, Currency::Yer)]),
            Currency::Yer,
            lookup(&[leaf(cash)]),
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientLines));
    }

    #[test]
    fn test_malformed_line_names_position() {
        let a = AccountId::new();
        let b = AccountId::new();
        let mut both = JournalLineInput::debit(b, 100, Currency::Yer);
        both.credit = 100;

        let err = LedgerService::validate_and_resolve(
            &input(vec![JournalLineInput::debit(a, 100, Currency::Yer), both]),
            Currency::Yer,
            lookup(&[leaf(a), leaf(b)]),
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::MalformedLine { line: 2, .. }));

        let err = LedgerService::validate_and_resolve(
            &input(vec![
                JournalLineInput::debit(a, 0, Currency::Yer),
                JournalLineInput::credit(b, 100, Currency::Yer),
            ]),
            Currency::Yer,
            lookup(&[leaf(a), leaf(b)]),
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::MalformedLine { line: 1, .. }));
    }

    #[test]
    fn test_unknown_and_non_postable_accounts() {
        let known = AccountId::new();
        let parent = AccountId::new();
        let unknown = AccountId::new();
        let accounts = [
            leaf(known),
            AccountInfo {
                id: parent,
                is_active: true,
                is_leaf: false,
            },
        ];

        let err = LedgerService::validate_and_resolve(
            &input(vec![
                JournalLineInput::debit(unknown, 100, Currency::Yer),
                JournalLineInput::credit(known, 100, Currency::Yer),
            ]),
            Currency::Yer,
            lookup(&accounts),
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::AccountNotFound(id) if id == unknown));

        let err = LedgerService::validate_and_resolve(
            &input(vec![
                JournalLineInput::debit(parent, 100, Currency::Yer),
                JournalLineInput::credit(known, 100, Currency::Yer),
            ]),
            Currency::Yer,
            lookup(&accounts),
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::NonPostableAccount { account_id, .. } if account_id == parent));
    }

    #[test]
    fn test_inactive_account_not_postable() {
        let id = AccountId::new();
        let info = AccountInfo {
            id,
            is_active: false,
            is_leaf: true,
        };
        assert!(matches!(
            LedgerService::check_postable(&info),
            Err(LedgerError::NonPostableAccount { .. })
        ));
    }

    #[test]
    fn test_non_positive_rate_rejected() {
        let a = AccountId::new();
        let b = AccountId::new();
        let err = LedgerService::validate_and_resolve(
            &input(vec![
                JournalLineInput::debit(a, 100, Currency::Usd).with_rate(dec!(0)),
                JournalLineInput::credit(b, 100, Currency::Yer),
            ]),
            Currency::Yer,
            lookup(&[leaf(a), leaf(b)]),
        )
        .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_RATE");
        assert!(matches!(err, LedgerError::Conversion { line: 1, .. }));
    }

    #[test]
    fn test_empty_description_rejected() {
        let mut voucher = input(vec![]);
        voucher.description = "   ".to_string();
        let err = LedgerService::validate_and_resolve(&voucher, Currency::Yer, |_| None).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidVoucherInput(_)));
    }

    #[test]
    fn test_revalidate_catches_deactivated_account() {
        let a = AccountId::new();
        let b = AccountId::new();
        let (lines, _) = LedgerService::validate_and_resolve(
            &input(vec![
                JournalLineInput::debit(a, 500, Currency::Yer),
                JournalLineInput::credit(b, 500, Currency::Yer),
            ]),
            Currency::Yer,
            lookup(&[leaf(a), leaf(b)]),
        )
        .unwrap();

        let deactivated = [
            leaf(a),
            AccountInfo {
                id: b,
                is_active: false,
                is_leaf: true,
            },
        ];
        let err = LedgerService::revalidate(&lines, Currency::Yer, lookup(&deactivated)).unwrap_err();
        assert!(matches!(err, LedgerError::NonPostableAccount { account_id, .. } if account_id == b));
    }

    #[test]
    fn test_state_guards() {
        let id = VoucherId::new();
        assert!(LedgerService::ensure_can_post(id, VoucherStatus::Draft).is_ok());
        assert!(matches!(
            LedgerService::ensure_can_post(id, VoucherStatus::Posted),
            Err(LedgerError::AlreadyPosted(_))
        ));
        assert!(matches!(
            LedgerService::ensure_can_reverse(id, VoucherStatus::Draft, false),
            Err(LedgerError::NotPosted(_))
        ));
        assert!(matches!(
            LedgerService::ensure_can_reverse(id, VoucherStatus::Posted, true),
            Err(LedgerError::AlreadyReversed(_))
        ));
        assert!(LedgerService::ensure_can_reverse(id, VoucherStatus::Posted, false).is_ok());
        assert!(matches!(
            LedgerService::ensure_can_discard(id, VoucherStatus::Posted),
            Err(LedgerError::AlreadyPosted(_))
        ));
    }
}
