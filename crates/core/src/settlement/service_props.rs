//! Property-based tests for `SettlementService`.
//!
//! - Property 1: overlap detection agrees with day-by-day intersection
//! - Property 2: approval vouchers always balance

use chrono::{Duration, NaiveDate, Utc};
use mizan_shared::{AccountId, Currency, EntityId, SettlementId};
use proptest::prelude::*;

use super::service::{SettlementAccounts, SettlementService};
use super::types::{Period, Settlement, SettlementStatus};
use crate::commission::BeneficiaryType;

fn period() -> impl Strategy<Value = Period> {
    (0i64..120, 0i64..40).prop_map(|(offset, len)| {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap() + Duration::days(offset);
        Period {
            start,
            end: start + Duration::days(len),
        }
    })
}

fn settlement(entity_id: EntityId, period: Period, total: i64) -> Settlement {
    Settlement {
        id: SettlementId::new(),
        entity_id,
        entity_model: BeneficiaryType::Store,
        period_start: period.start,
        period_end: period.end,
        expected_total: total,
        commission_ids: vec![],
        status: SettlementStatus::Draft,
        voucher_id: None,
        approved_at: None,
        created_at: Utc::now(),
        version: 1,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property 1: two periods clash exactly when they share a day.
    #[test]
    fn prop_overlap_matches_shared_days(a in period(), b in period()) {
        let shares_day = a.start.iter_days().take_while(|d| *d <= a.end).any(|d| b.contains(d));
        prop_assert_eq!(a.overlaps(&b), shares_day);
        prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));

        let entity = EntityId::new();
        let existing = vec![settlement(entity, a, 0)];
        prop_assert_eq!(
            SettlementService::check_overlap(entity, &b, &existing).is_err(),
            shares_day
        );
    }

    /// Property 2: the approval voucher moves the absolute total on each side.
    #[test]
    fn prop_approval_voucher_balances(total in -10_000_000i64..10_000_000i64, p in period()) {
        let accounts = SettlementAccounts { expense: AccountId::new(), payable: AccountId::new() };
        let s = settlement(EntityId::new(), p, total);

        match SettlementService::approval_voucher(&s, accounts, Currency::Yer) {
            None => prop_assert_eq!(total, 0),
            Some(voucher) => {
                let debit: i64 = voucher.lines.iter().map(|l| l.debit).sum();
                let credit: i64 = voucher.lines.iter().map(|l| l.credit).sum();
                prop_assert_eq!(debit, credit);
                prop_assert_eq!(debit, total.abs());
                prop_assert!(p.contains(voucher.date));
            }
        }
    }
}
