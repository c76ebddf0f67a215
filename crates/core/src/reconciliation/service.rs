//! Expected totals, discrepancy detection and issue resolution.

use chrono::NaiveDate;
use mizan_shared::{Currency, IssueId, Money};

use super::error::ReconciliationError;
use super::types::{CategoryTotals, Discrepancy, IssueStatus, RECONCILIATION_TOLERANCE_MINOR};
use crate::settlement::Period;

/// Stateless service for reconciliations.
pub struct ReconciliationService;

impl ReconciliationService {
    /// Build a period from its bounds.
    ///
    /// # Errors
    ///
    /// `InvalidPeriod` if `end` is before `start`.
    pub fn period(start: NaiveDate, end: NaiveDate) -> Result<Period, ReconciliationError> {
        if end < start {
            return Err(ReconciliationError::InvalidPeriod { start, end });
        }
        Ok(Period { start, end })
    }

    /// Net `debit - credit` per account code over posted base movements.
    ///
    /// # Errors
    ///
    /// `AmountOverflow` if a category total exceeds `i64`.
    pub fn expected_totals<I>(movements: I) -> Result<CategoryTotals, ReconciliationError>
    where
        I: IntoIterator<Item = (String, i64, i64)>,
    {
        let mut totals = CategoryTotals::new();
        for (code, debit, credit) in movements {
            let net = debit
                .checked_sub(credit)
                .ok_or(ReconciliationError::AmountOverflow)?;
            let entry = totals.entry(code).or_insert(0);
            *entry = entry
                .checked_add(net)
                .ok_or(ReconciliationError::AmountOverflow)?;
        }
        Ok(totals)
    }

    /// Reject blank category names.
    ///
    /// # Errors
    ///
    /// `InvalidTotals` naming the first bad category.
    pub fn validate_actuals(actual: &CategoryTotals) -> Result<(), ReconciliationError> {
        match actual.keys().find(|k| k.trim().is_empty()) {
            Some(bad) => Err(ReconciliationError::InvalidTotals(format!(
                "blank category '{bad}'"
            ))),
            None => Ok(()),
        }
    }

    /// Categories whose totals differ by more than the tolerance, in code
    /// order. A category missing from either side counts as zero.
    ///
    /// # Errors
    ///
    /// `AmountOverflow` if a difference exceeds `i64`.
    pub fn detect_discrepancies(
        expected: &CategoryTotals,
        actual: &CategoryTotals,
    ) -> Result<Vec<Discrepancy>, ReconciliationError> {
        let mut categories: Vec<&String> = expected.keys().chain(actual.keys()).collect();
        categories.sort();
        categories.dedup();

        let mut out = Vec::new();
        for category in categories {
            let exp = expected.get(category).copied().unwrap_or(0);
            let act = actual.get(category).copied().unwrap_or(0);
            let difference = exp
                .checked_sub(act)
                .ok_or(ReconciliationError::AmountOverflow)?;
            if difference.abs() > RECONCILIATION_TOLERANCE_MINOR {
                out.push(Discrepancy {
                    category: category.clone(),
                    expected: exp,
                    actual: act,
                    difference,
                });
            }
        }
        Ok(out)
    }

    /// One-line summary for an issue.
    #[must_use]
    pub fn describe(discrepancy: &Discrepancy, base: Currency) -> String {
        format!(
            "Category {}: expected {}, actual {}, difference {}",
            discrepancy.category,
            Money::new(discrepancy.expected, base),
            Money::new(discrepancy.actual, base),
            Money::new(discrepancy.difference, base),
        )
    }

    /// Resolve an open issue.
    ///
    /// # Errors
    ///
    /// `MissingResolution` for blank text, `IssueAlreadyResolved` if the
    /// issue is not open.
    pub fn resolve(id: IssueId, current: IssueStatus, resolution: &str) -> Result<String, ReconciliationError> {
        let resolution = resolution.trim();
        if resolution.is_empty() {
            return Err(ReconciliationError::MissingResolution);
        }
        match current {
            IssueStatus::Open => Ok(resolution.to_string()),
            IssueStatus::Resolved => Err(ReconciliationError::IssueAlreadyResolved(id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn totals(pairs: &[(&str, i64)]) -> CategoryTotals {
        pairs.iter().map(|(k, v)| ((*k).to_string(), *v)).collect()
    }

    #[test]
    fn test_expected_totals_nets_per_code() {
        let totals = ReconciliationService::expected_totals(vec![
            ("1-1".to_string(), 5_000_000, 0),
            ("4-1".to_string(), 1_000, 0),
            ("1-1".to_string(), 0, 200_000),
            ("2-1".to_string(), 0, 1_000),
        ])
        .unwrap();

        assert_eq!(totals["1-1"], 4_800_000);
        assert_eq!(totals["4-1"], 1_000);
        assert_eq!(totals["2-1"], -1_000);
    }

    #[test]
    fn test_february_statement_discrepancy() {
        let expected = totals(&[("1-1", 5_000_000)]);
        let actual = totals(&[("1-1", 4_950_000)]);

        let found = ReconciliationService::detect_discrepancies(&expected, &actual).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].difference, 50_000);
        assert_eq!(
            ReconciliationService::describe(&found[0], Currency::Yer),
            "Category 1-1: expected 50000.00 YER, actual 49500.00 YER, difference 500.00 YER"
        );
    }

    #[test]
    fn test_missing_categories_count_as_zero() {
        let expected = totals(&[("1-1", 100), ("4-1", 300)]);
        let actual = totals(&[("1-1", 100), ("9-9", 50)]);

        let found = ReconciliationService::detect_discrepancies(&expected, &actual).unwrap();
        let cats: Vec<_> = found.iter().map(|d| d.category.as_str()).collect();
        assert_eq!(cats, vec!["4-1", "9-9"]);
        assert_eq!(found[1].difference, -50);
    }

    #[test]
    fn test_tolerance() {
        let expected = totals(&[("1-1", 100)]);
        assert!(ReconciliationService::detect_discrepancies(&expected, &totals(&[("1-1", 101)]))
            .unwrap()
            .is_empty());
        assert_eq!(
            ReconciliationService::detect_discrepancies(&expected, &totals(&[("1-1", 102)]))
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_resolve() {
        let id = IssueId::new();
        assert!(matches!(
            ReconciliationService::resolve(id, IssueStatus::Open, "   "),
            Err(ReconciliationError::MissingResolution)
        ));
        assert_eq!(
            ReconciliationService::resolve(id, IssueStatus::Open, " bank fee ").unwrap(),
            "bank fee"
        );
        assert!(matches!(
            ReconciliationService::resolve(id, IssueStatus::Resolved, "again"),
            Err(ReconciliationError::IssueAlreadyResolved(_))
        ));
    }

    #[test]
    fn test_validate_actuals() {
        assert!(ReconciliationService::validate_actuals(&totals(&[("1-1", 1)])).is_ok());
        assert!(ReconciliationService::validate_actuals(&totals(&[(" ", 1)])).is_err());
    }
}
