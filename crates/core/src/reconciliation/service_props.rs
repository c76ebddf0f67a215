//! Property-based tests for `ReconciliationService`.
//!
//! - Property 1: a category is flagged exactly when it differs by more than the tolerance
//! - Property 2: identical totals never raise issues

use proptest::prelude::*;

use super::service::ReconciliationService;
use super::types::{CategoryTotals, RECONCILIATION_TOLERANCE_MINOR};

fn totals() -> impl Strategy<Value = CategoryTotals> {
    prop::collection::btree_map(
        prop_oneof![
            Just("1-1".to_string()),
            Just("1-2".to_string()),
            Just("2-1".to_string()),
            Just("4-1".to_string()),
        ],
        -1_000_000i64..1_000_000i64,
        0..4,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property 1: flagged categories are exactly those beyond tolerance.
    #[test]
    fn prop_flags_match_tolerance(expected in totals(), actual in totals()) {
        let found = ReconciliationService::detect_discrepancies(&expected, &actual).unwrap();

        for code in expected.keys().chain(actual.keys()) {
            let diff = expected.get(code).copied().unwrap_or(0) - actual.get(code).copied().unwrap_or(0);
            let flagged = found.iter().filter(|d| &d.category == code).count();
            prop_assert_eq!(flagged, usize::from(diff.abs() > RECONCILIATION_TOLERANCE_MINOR));
        }
    }

    /// Property 2: a statement matching the ledger raises nothing.
    #[test]
    fn prop_identical_totals_are_clean(expected in totals()) {
        let found = ReconciliationService::detect_discrepancies(&expected, &expected).unwrap();
        prop_assert!(found.is_empty());
    }
}
