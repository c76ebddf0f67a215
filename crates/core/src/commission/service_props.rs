//! Property-based tests for `CommissionService`.
//!
//! - Property 1: terminal commissions never change status
//! - Property 2: evaluation yields exactly one commission per matching active rule

use chrono::Utc;
use mizan_shared::{CommissionPlanId, EntityId};
use proptest::prelude::*;

use super::service::CommissionService;
use super::types::{Beneficiary, BeneficiaryType, CommissionPlan, CommissionRule, CommissionStatus};

fn status() -> impl Strategy<Value = CommissionStatus> {
    prop_oneof![
        Just(CommissionStatus::Pending),
        Just(CommissionStatus::Approved),
        Just(CommissionStatus::Paid),
        Just(CommissionStatus::Cancelled),
    ]
}

fn beneficiary_type() -> impl Strategy<Value = BeneficiaryType> {
    prop_oneof![
        Just(BeneficiaryType::Driver),
        Just(BeneficiaryType::Store),
        Just(BeneficiaryType::Marketer),
    ]
}

fn trigger() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("store_approved".to_string()),
        Just("order_delivered".to_string()),
        Just("driver_onboarded".to_string()),
    ]
}

fn plan() -> impl Strategy<Value = CommissionPlan> {
    (
        any::<bool>(),
        prop::collection::btree_map(
            trigger(),
            (1i64..1_000_000, prop::option::of(beneficiary_type())),
            0..3,
        ),
    )
        .prop_map(|(active, rules)| CommissionPlan {
            id: CommissionPlanId::new(),
            name: "generated".to_string(),
            active,
            rules: rules
                .into_iter()
                .map(|(trigger, (amount, beneficiary_type))| CommissionRule {
                    trigger,
                    amount,
                    beneficiary_type,
                })
                .collect(),
            created_at: Utc::now(),
            version: 1,
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property 1: no transition leaves a terminal status.
    #[test]
    fn prop_terminal_status_is_final(from in status()) {
        let moved = CommissionService::approve(from).is_ok()
            || CommissionService::cancel(from).is_ok()
            || CommissionService::mark_paid(from).is_ok();
        prop_assert_eq!(moved, !from.is_terminal());
    }

    /// Property 2: one commission per matching rule of each active plan.
    #[test]
    fn prop_one_commission_per_matching_rule(
        plans in prop::collection::vec(plan(), 0..4),
        event in trigger(),
        kind in beneficiary_type(),
    ) {
        let beneficiary = Beneficiary { id: EntityId::new(), beneficiary_type: kind };
        let expected: usize = plans
            .iter()
            .filter(|p| p.active)
            .map(|p| p.rules.iter().filter(|r| r.matches(&event, kind)).count())
            .sum();

        let created = CommissionService::commissions_for(&plans, &event, beneficiary, None);
        prop_assert_eq!(created.len(), expected);
        for commission in &created {
            prop_assert_eq!(&commission.trigger, &event);
            prop_assert!(commission.amount > 0);
            prop_assert_eq!(commission.beneficiary, beneficiary);
        }
    }
}
