//! Settlement aggregation, approval and posting.

use chrono::NaiveDate;
use mizan_shared::config::{PostingAccountsConfig, SettlementConfig};
use mizan_shared::{AccountId, Currency, EntityId};

use super::error::SettlementError;
use super::types::{Period, Settlement, SettlementStatus};
use crate::commission::BeneficiaryType;
use crate::ledger::{JournalLineInput, StageVoucherInput};

/// Resolved expense/payable pair for one settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementAccounts {
    /// Debited on approval.
    pub expense: AccountId,
    /// Credited on approval.
    pub payable: AccountId,
}

/// Stateless service for settlements.
pub struct SettlementService;

impl SettlementService {
    /// Build a period from its bounds.
    ///
    /// # Errors
    ///
    /// `InvalidPeriod` if `end` is before `start`.
    pub fn period(start: NaiveDate, end: NaiveDate) -> Result<Period, SettlementError> {
        if end < start {
            return Err(SettlementError::InvalidPeriod { start, end });
        }
        Ok(Period { start, end })
    }

    /// Reject a period overlapping any of the entity's existing settlements.
    ///
    /// # Errors
    ///
    /// `OverlappingPeriod` naming the first settlement found.
    pub fn check_overlap(
        entity_id: EntityId,
        period: &Period,
        existing: &[Settlement],
    ) -> Result<(), SettlementError> {
        match existing
            .iter()
            .find(|s| s.entity_id == entity_id && s.period().overlaps(period))
        {
            Some(clash) => Err(SettlementError::OverlappingPeriod {
                entity_id,
                existing: clash.id,
            }),
            None => Ok(()),
        }
    }

    /// Approved commission amounts plus the net ledger credit for the entity.
    ///
    /// # Errors
    ///
    /// `AmountOverflow` if the sum exceeds `i64`.
    pub fn expected_total(commission_amounts: &[i64], ledger_net_credit: i64) -> Result<i64, SettlementError> {
        commission_amounts
            .iter()
            .try_fold(ledger_net_credit, |acc, amount| acc.checked_add(*amount))
            .ok_or(SettlementError::AmountOverflow)
    }

    /// Expected total after dropping claims on commissions that are no
    /// longer approved.
    ///
    /// # Errors
    ///
    /// `AmountOverflow` if the difference leaves `i64`.
    pub fn release(expected_total: i64, released_amounts: &[i64]) -> Result<i64, SettlementError> {
        released_amounts
            .iter()
            .try_fold(expected_total, |acc, amount| acc.checked_sub(*amount))
            .ok_or(SettlementError::AmountOverflow)
    }

    /// Approve a draft settlement.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless the settlement is a draft.
    pub const fn approve(current: SettlementStatus) -> Result<SettlementStatus, SettlementError> {
        match current {
            SettlementStatus::Draft => Ok(SettlementStatus::Approved),
            _ => Err(SettlementError::InvalidTransition {
                from: current,
                to: SettlementStatus::Approved,
            }),
        }
    }

    /// Mark an approved settlement paid.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless the settlement is approved.
    pub const fn mark_paid(current: SettlementStatus) -> Result<SettlementStatus, SettlementError> {
        match current {
            SettlementStatus::Approved => Ok(SettlementStatus::Paid),
            _ => Err(SettlementError::InvalidTransition {
                from: current,
                to: SettlementStatus::Paid,
            }),
        }
    }

    /// Configured account codes for an entity model.
    #[must_use]
    pub const fn account_codes(config: &SettlementConfig, model: BeneficiaryType) -> &PostingAccountsConfig {
        match model {
            BeneficiaryType::Driver => &config.driver,
            BeneficiaryType::Store => &config.store,
            BeneficiaryType::Marketer => &config.marketer,
        }
    }

    /// Voucher recording an approved settlement, dated at the period end.
    ///
    /// A positive total debits expense and credits payable, a negative one
    /// swaps the sides, and a zero total needs no voucher.
    #[must_use]
    pub fn approval_voucher(
        settlement: &Settlement,
        accounts: SettlementAccounts,
        base: Currency,
    ) -> Option<StageVoucherInput> {
        let amount = settlement.expected_total.unsigned_abs();
        let amount = i64::try_from(amount).ok()?;
        if amount == 0 {
            return None;
        }
        let (debit_account, credit_account) = if settlement.expected_total > 0 {
            (accounts.expense, accounts.payable)
        } else {
            (accounts.payable, accounts.expense)
        };
        let memo = format!("Settlement {}", settlement.id);

        Some(StageVoucherInput {
            date: settlement.period_end,
            description: format!(
                "Settlement for {} {} ({})",
                settlement.entity_model,
                settlement.entity_id,
                settlement.period()
            ),
            reference: Some(settlement.id.to_string()),
            lines: vec![
                JournalLineInput::debit(debit_account, amount, base)
                    .with_entity(settlement.entity_id)
                    .with_memo(memo.clone()),
                JournalLineInput::credit(credit_account, amount, base)
                    .with_entity(settlement.entity_id)
                    .with_memo(memo),
            ],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use mizan_shared::SettlementId;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, day).unwrap()
    }

    fn settlement(entity_id: EntityId, start: NaiveDate, end: NaiveDate, total: i64) -> Settlement {
        Settlement {
            id: SettlementId::new(),
            entity_id,
            entity_model: BeneficiaryType::Driver,
            period_start: start,
            period_end: end,
            expected_total: total,
            commission_ids: vec![],
            status: SettlementStatus::Draft,
            voucher_id: None,
            approved_at: None,
            created_at: Utc::now(),
            version: 1,
        }
    }

    fn accounts() -> SettlementAccounts {
        SettlementAccounts {
            expense: AccountId::new(),
            payable: AccountId::new(),
        }
    }

    #[test]
    fn test_period_rejects_reversed_bounds() {
        assert!(SettlementService::period(d(1, 1), d(1, 1)).is_ok());
        assert!(matches!(
            SettlementService::period(d(1, 2), d(1, 1)),
            Err(SettlementError::InvalidPeriod { .. })
        ));
    }

    #[test]
    fn test_overlapping_period_rejected() {
        let driver = EntityId::new();
        let existing = vec![settlement(driver, d(1, 1), d(1, 15), 0)];

        let overlapping = SettlementService::period(d(1, 10), d(1, 20)).unwrap();
        assert!(matches!(
            SettlementService::check_overlap(driver, &overlapping, &existing),
            Err(SettlementError::OverlappingPeriod { existing: id, .. }) if id == existing[0].id
        ));

        let next = SettlementService::period(d(1, 16), d(1, 31)).unwrap();
        assert!(SettlementService::check_overlap(driver, &next, &existing).is_ok());

        // Other entities are unaffected.
        assert!(SettlementService::check_overlap(EntityId::new(), &overlapping, &existing).is_ok());
    }

    #[test]
    fn test_expected_total() {
        assert_eq!(SettlementService::expected_total(&[500, 500, 500], 0).unwrap(), 1_500);
        assert_eq!(SettlementService::expected_total(&[], -200).unwrap(), -200);
        assert!(matches!(
            SettlementService::expected_total(&[i64::MAX, 1], 0),
            Err(SettlementError::AmountOverflow)
        ));
    }

    #[test]
    fn test_release_subtracts_dropped_claims() {
        assert_eq!(SettlementService::release(1_500, &[500]).unwrap(), 1_000);
        assert_eq!(SettlementService::release(300, &[500]).unwrap(), -200);
        assert_eq!(SettlementService::release(700, &[]).unwrap(), 700);
        assert!(matches!(
            SettlementService::release(i64::MIN, &[1]),
            Err(SettlementError::AmountOverflow)
        ));
    }

    #[test]
    fn test_transitions() {
        assert_eq!(
            SettlementService::approve(SettlementStatus::Draft).unwrap(),
            SettlementStatus::Approved
        );
        assert!(SettlementService::approve(SettlementStatus::Approved).is_err());
        assert!(SettlementService::mark_paid(SettlementStatus::Draft).is_err());
        assert_eq!(
            SettlementService::mark_paid(SettlementStatus::Approved).unwrap(),
            SettlementStatus::Paid
        );
    }

    #[test]
    fn test_approval_voucher_debits_expense() {
        let accounts = accounts();
        let s = settlement(EntityId::new(), d(1, 1), d(1, 31), 150_000);
        let voucher = SettlementService::approval_voucher(&s, accounts, Currency::Yer).unwrap();

        assert_eq!(voucher.date, d(1, 31));
        assert_eq!(voucher.lines[0].account_id, accounts.expense);
        assert_eq!(voucher.lines[0].debit, 150_000);
        assert_eq!(voucher.lines[1].account_id, accounts.payable);
        assert_eq!(voucher.lines[1].credit, 150_000);
        assert!(voucher.lines.iter().all(|l| l.entity_id == Some(s.entity_id)));
    }

    #[test]
    fn test_approval_voucher_negative_total_swaps_sides() {
        let accounts = accounts();
        let s = settlement(EntityId::new(), d(1, 1), d(1, 31), -2_000);
        let voucher = SettlementService::approval_voucher(&s, accounts, Currency::Yer).unwrap();
        assert_eq!(voucher.lines[0].account_id, accounts.payable);
        assert_eq!(voucher.lines[0].debit, 2_000);
        assert_eq!(voucher.lines[1].account_id, accounts.expense);
    }

    #[test]
    fn test_zero_total_needs_no_voucher() {
        let s = settlement(EntityId::new(), d(1, 1), d(1, 31), 0);
        assert!(SettlementService::approval_voucher(&s, accounts(), Currency::Yer).is_none());
    }

    #[test]
    fn test_account_codes_per_model() {
        let config = SettlementConfig::default();
        assert_eq!(
            SettlementService::account_codes(&config, BeneficiaryType::Store).payable_code,
            "2-2"
        );
        assert_eq!(
            SettlementService::account_codes(&config, BeneficiaryType::Marketer).expense_code,
            "4-3"
        );
    }
}
