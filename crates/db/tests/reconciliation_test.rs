//! Reconciliation tracker tests.

mod common;

use common::{BASE, date, seed_chart, setup_db, simple_voucher};
use mizan_core::reconciliation::{CategoryTotals, IssueStatus, ReconciliationError};
use mizan_db::{LedgerRepository, ReconciliationRepository};

fn totals(pairs: &[(&str, i64)]) -> CategoryTotals {
    pairs.iter().map(|(k, v)| ((*k).to_string(), *v)).collect()
}

/// February: 50,000.00 YER cash against revenue, plus a March voucher
/// that must stay out of the period.
async fn seed_february(db: &sea_orm::DatabaseConnection) {
    let chart = seed_chart(db).await;
    let ledger = LedgerRepository::new(db.clone(), BASE);
    for (d, amount) in [(date(2026, 2, 10), 5_000_000), (date(2026, 3, 2), 70_000)] {
        let v = ledger
            .stage_voucher(simple_voucher(d, chart.cash.id, chart.revenue.id, amount))
            .await
            .unwrap();
        ledger.post_voucher(v.id).await.unwrap();
    }
    // Drafts never count.
    ledger
        .stage_voucher(simple_voucher(date(2026, 2, 11), chart.cash.id, chart.revenue.id, 999))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_february_statement_raises_issue() {
    let db = setup_db().await;
    seed_february(&db).await;
    let repo = ReconciliationRepository::new(db.clone(), BASE);
    let (start, end) = (date(2026, 2, 1), date(2026, 2, 28));

    let expected = repo.compute_expected(start, end).await.unwrap();
    assert_eq!(expected, totals(&[("1-1", 5_000_000), ("3-1", -5_000_000)]));

    let reconciliation = repo
        .record_actual(start, end, totals(&[("1-1", 4_950_000), ("3-1", -5_000_000)]))
        .await
        .unwrap();
    assert_eq!(reconciliation.expected_totals, expected);
    assert!(reconciliation.actual_totals.is_some());
    assert_eq!(reconciliation.issues.len(), 1);

    let issue = &reconciliation.issues[0];
    assert_eq!(issue.category, "1-1");
    assert_eq!(issue.expected, 5_000_000);
    assert_eq!(issue.actual, 4_950_000);
    assert_eq!(issue.difference, 50_000);
    assert_eq!(issue.status, IssueStatus::Open);
    assert!(issue.description.contains("500"));

    assert!(matches!(
        repo.resolve_issue(issue.id, "   ").await,
        Err(ReconciliationError::MissingResolution)
    ));

    let resolved = repo
        .resolve_issue(issue.id, "Bank fee withheld by processor")
        .await
        .unwrap();
    assert_eq!(resolved.status, IssueStatus::Resolved);
    assert_eq!(resolved.resolution.as_deref(), Some("Bank fee withheld by processor"));
    assert!(resolved.resolved_at.is_some());

    assert!(matches!(
        repo.resolve_issue(issue.id, "again").await,
        Err(ReconciliationError::IssueAlreadyResolved(_))
    ));
    assert!(repo.list_open_issues().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_difference_within_tolerance_ignored() {
    let db = setup_db().await;
    seed_february(&db).await;
    let repo = ReconciliationRepository::new(db.clone(), BASE);

    let reconciliation = repo
        .record_actual(
            date(2026, 2, 1),
            date(2026, 2, 28),
            totals(&[("1-1", 4_999_999), ("3-1", -5_000_000)]),
        )
        .await
        .unwrap();
    assert!(reconciliation.issues.is_empty());
}

#[tokio::test]
async fn test_missing_category_counts_as_zero() {
    let db = setup_db().await;
    seed_february(&db).await;
    let repo = ReconciliationRepository::new(db.clone(), BASE);

    let reconciliation = repo
        .record_actual(date(2026, 2, 1), date(2026, 2, 28), totals(&[("1-1", 5_000_000)]))
        .await
        .unwrap();
    assert_eq!(reconciliation.issues.len(), 1);
    assert_eq!(reconciliation.issues[0].category, "3-1");
    assert_eq!(reconciliation.issues[0].actual, 0);
}

#[tokio::test]
async fn test_open_then_record_once() {
    let db = setup_db().await;
    seed_february(&db).await;
    let repo = ReconciliationRepository::new(db.clone(), BASE);
    let (start, end) = (date(2026, 2, 1), date(2026, 2, 28));

    let opened = repo.open_reconciliation(start, end).await.unwrap();
    assert!(opened.actual_totals.is_none());
    assert!(matches!(
        repo.open_reconciliation(start, end).await,
        Err(ReconciliationError::DuplicatePeriod { .. })
    ));

    let recorded = repo
        .record_actual(start, end, totals(&[("1-1", 5_000_000), ("3-1", -5_000_000)]))
        .await
        .unwrap();
    assert_eq!(recorded.id, opened.id);

    assert!(matches!(
        repo.record_actual(start, end, totals(&[("1-1", 1)])).await,
        Err(ReconciliationError::ActualAlreadyRecorded(id)) if id == opened.id
    ));
    assert_eq!(repo.get_reconciliation(opened.id).await.unwrap(), recorded);
}

#[tokio::test]
async fn test_invalid_inputs_rejected() {
    let db = setup_db().await;
    let repo = ReconciliationRepository::new(db.clone(), BASE);

    assert!(matches!(
        repo.compute_expected(date(2026, 3, 1), date(2026, 2, 1)).await,
        Err(ReconciliationError::InvalidPeriod { .. })
    ));
    assert!(matches!(
        repo.record_actual(date(2026, 2, 1), date(2026, 2, 28), totals(&[(" ", 5)]))
            .await,
        Err(ReconciliationError::InvalidTotals(_))
    ));
}
