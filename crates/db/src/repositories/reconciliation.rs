//! Reconciliation repository.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use mizan_core::reconciliation::{
    CategoryTotals, IssueStatus, Reconciliation, ReconciliationError, ReconciliationIssue,
    ReconciliationService,
};
use mizan_core::settlement::Period;
use mizan_shared::{Currency, IssueId, ReconciliationId};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tracing::{info, warn};
use uuid::Uuid;

use super::ledger::{self, PostedLineFilter};
use super::{DbResultExt, is_unique_violation};
use crate::entities::{
    accounts, reconciliation_issues, reconciliation_totals, reconciliations, sea_orm_active_enums,
};
use sea_orm_active_enums::TotalsKind;

/// Reconciliation repository.
#[derive(Debug, Clone)]
pub struct ReconciliationRepository {
    db: DatabaseConnection,
    base: Currency,
}

impl ReconciliationRepository {
    /// Creates a new reconciliation repository reporting in `base`.
    #[must_use]
    pub const fn new(db: DatabaseConnection, base: Currency) -> Self {
        Self { db, base }
    }

    /// Net posted movement per account code over the period. Read-only.
    ///
    /// # Errors
    ///
    /// `InvalidPeriod`, `AmountOverflow`, or a database error.
    pub async fn compute_expected(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<CategoryTotals, ReconciliationError> {
        let period = ReconciliationService::period(start, end)?;
        expected_in(&self.db, period).await
    }

    /// Persists a reconciliation with the period's expected totals.
    ///
    /// # Errors
    ///
    /// `InvalidPeriod`, `DuplicatePeriod`.
    pub async fn open_reconciliation(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Reconciliation, ReconciliationError> {
        let period = ReconciliationService::period(start, end)?;
        let txn = self.db.begin().await.or_db(ReconciliationError::Database)?;
        let id = open_in(&txn, period).await?;
        let reconciliation = load(&txn, id).await?;
        txn.commit().await.or_db(ReconciliationError::Database)?;

        info!(reconciliation_id = %id, period = %period, "reconciliation opened");
        Ok(reconciliation)
    }

    /// Stores externally reported totals and raises an open issue per
    /// category whose difference exceeds the tolerance. Opens the
    /// reconciliation first if the period has none.
    ///
    /// # Errors
    ///
    /// `InvalidPeriod`, `InvalidTotals`, `ActualAlreadyRecorded`.
    pub async fn record_actual(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        actual: CategoryTotals,
    ) -> Result<Reconciliation, ReconciliationError> {
        let period = ReconciliationService::period(start, end)?;
        ReconciliationService::validate_actuals(&actual)?;

        let txn = self.db.begin().await.or_db(ReconciliationError::Database)?;
        let id = match find_by_period(&txn, period).await? {
            Some(existing) => existing.id.into(),
            None => open_in(&txn, period).await?,
        };

        let now = Utc::now();
        let claimed = reconciliations::Entity::update_many()
            .col_expr(reconciliations::Column::ActualsRecordedAt, Expr::value(now))
            .filter(reconciliations::Column::Id.eq(id.into_inner()))
            .filter(reconciliations::Column::ActualsRecordedAt.is_null())
            .exec(&txn)
            .await
            .or_db(ReconciliationError::Database)?;
        if claimed.rows_affected == 0 {
            warn!(reconciliation_id = %id, "actual totals already recorded");
            return Err(ReconciliationError::ActualAlreadyRecorded(id));
        }
        insert_totals(&txn, id, TotalsKind::Actual, &actual).await?;

        let expected = load(&txn, id).await?.expected_totals;
        let discrepancies = ReconciliationService::detect_discrepancies(&expected, &actual)?;
        for d in &discrepancies {
            reconciliation_issues::ActiveModel {
                id: Set(IssueId::new().into_inner()),
                reconciliation_id: Set(id.into_inner()),
                category: Set(d.category.clone()),
                expected: Set(d.expected),
                actual: Set(d.actual),
                difference: Set(d.difference),
                description: Set(ReconciliationService::describe(d, self.base)),
                status: Set(sea_orm_active_enums::IssueStatus::Open),
                resolution: Set(None),
                resolved_at: Set(None),
                created_at: Set(now),
            }
            .insert(&txn)
            .await
            .or_db(ReconciliationError::Database)?;
        }

        let reconciliation = load(&txn, id).await?;
        txn.commit().await.or_db(ReconciliationError::Database)?;

        info!(
            reconciliation_id = %id,
            issues = discrepancies.len(),
            "actual totals recorded"
        );
        Ok(reconciliation)
    }

    /// Closes an open issue with a resolution note.
    ///
    /// # Errors
    ///
    /// `IssueNotFound`, `MissingResolution`, `IssueAlreadyResolved`.
    pub async fn resolve_issue(
        &self,
        id: IssueId,
        resolution: &str,
    ) -> Result<ReconciliationIssue, ReconciliationError> {
        let txn = self.db.begin().await.or_db(ReconciliationError::Database)?;
        let issue = find_issue(&txn, id).await?;
        let resolution = ReconciliationService::resolve(id, issue.status.into(), resolution)?;

        let result = reconciliation_issues::Entity::update_many()
            .col_expr(
                reconciliation_issues::Column::Status,
                Expr::value(sea_orm_active_enums::IssueStatus::Resolved),
            )
            .col_expr(reconciliation_issues::Column::Resolution, Expr::value(resolution))
            .col_expr(reconciliation_issues::Column::ResolvedAt, Expr::value(Utc::now()))
            .filter(reconciliation_issues::Column::Id.eq(id.into_inner()))
            .filter(reconciliation_issues::Column::Status.eq(sea_orm_active_enums::IssueStatus::Open))
            .exec(&txn)
            .await
            .or_db(ReconciliationError::Database)?;
        if result.rows_affected == 0 {
            return Err(ReconciliationError::IssueAlreadyResolved(id));
        }

        let resolved = find_issue(&txn, id).await.map(to_issue)?;
        txn.commit().await.or_db(ReconciliationError::Database)?;

        info!(issue_id = %id, category = %resolved.category, "reconciliation issue resolved");
        Ok(resolved)
    }

    /// Fetches a reconciliation with its totals and issues.
    ///
    /// # Errors
    ///
    /// `ReconciliationNotFound`, or a database error.
    pub async fn get_reconciliation(
        &self,
        id: ReconciliationId,
    ) -> Result<Reconciliation, ReconciliationError> {
        load(&self.db, id).await
    }

    /// Issues in `status` (all when `None`), oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_issues(
        &self,
        status: Option<IssueStatus>,
    ) -> Result<Vec<ReconciliationIssue>, ReconciliationError> {
        let mut query = reconciliation_issues::Entity::find()
            .order_by_asc(reconciliation_issues::Column::CreatedAt)
            .order_by_asc(reconciliation_issues::Column::Category);
        if let Some(status) = status {
            query = query.filter(
                reconciliation_issues::Column::Status.eq(sea_orm_active_enums::IssueStatus::from(status)),
            );
        }
        let models = query.all(&self.db).await.or_db(ReconciliationError::Database)?;
        Ok(models.into_iter().map(to_issue).collect())
    }

    /// Open issues across all reconciliations.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_open_issues(&self) -> Result<Vec<ReconciliationIssue>, ReconciliationError> {
        self.list_issues(Some(IssueStatus::Open)).await
    }
}

async fn expected_in<C: ConnectionTrait>(
    conn: &C,
    period: Period,
) -> Result<CategoryTotals, ReconciliationError> {
    let lines = ledger::posted_lines(
        conn,
        PostedLineFilter {
            date_from: Some(period.start),
            date_to: Some(period.end),
            ..PostedLineFilter::default()
        },
    )
    .await
    .or_db(ReconciliationError::Database)?;

    let codes: HashMap<Uuid, String> = accounts::Entity::find()
        .all(conn)
        .await
        .or_db(ReconciliationError::Database)?
        .into_iter()
        .map(|a| (a.id, a.code))
        .collect();

    ReconciliationService::expected_totals(lines.into_iter().map(|line| {
        let code = codes.get(&line.account_id).cloned().unwrap_or_else(|| line.account_id.to_string());
        (code, line.base_debit, line.base_credit)
    }))
}

async fn open_in<C: ConnectionTrait>(
    conn: &C,
    period: Period,
) -> Result<ReconciliationId, ReconciliationError> {
    let expected = expected_in(conn, period).await?;
    let id = ReconciliationId::new();

    let inserted = reconciliations::ActiveModel {
        id: Set(id.into_inner()),
        period_start: Set(period.start),
        period_end: Set(period.end),
        actuals_recorded_at: Set(None),
        created_at: Set(Utc::now()),
    }
    .insert(conn)
    .await;
    match inserted {
        Ok(_) => {}
        Err(e) if is_unique_violation(&e) => {
            warn!(period = %period, "reconciliation already exists");
            return Err(ReconciliationError::DuplicatePeriod {
                start: period.start,
                end: period.end,
            });
        }
        Err(e) => return Err(e).or_db(ReconciliationError::Database),
    }

    insert_totals(conn, id, TotalsKind::Expected, &expected).await?;
    Ok(id)
}

async fn insert_totals<C: ConnectionTrait>(
    conn: &C,
    id: ReconciliationId,
    kind: TotalsKind,
    totals: &CategoryTotals,
) -> Result<(), ReconciliationError> {
    if totals.is_empty() {
        return Ok(());
    }
    let rows = totals.iter().map(|(category, amount)| reconciliation_totals::ActiveModel {
        reconciliation_id: Set(id.into_inner()),
        kind: Set(kind),
        category: Set(category.clone()),
        amount: Set(*amount),
    });
    reconciliation_totals::Entity::insert_many(rows)
        .exec_without_returning(conn)
        .await
        .or_db(ReconciliationError::Database)?;
    Ok(())
}

async fn find_by_period<C: ConnectionTrait>(
    conn: &C,
    period: Period,
) -> Result<Option<reconciliations::Model>, ReconciliationError> {
    reconciliations::Entity::find()
        .filter(reconciliations::Column::PeriodStart.eq(period.start))
        .filter(reconciliations::Column::PeriodEnd.eq(period.end))
        .one(conn)
        .await
        .or_db(ReconciliationError::Database)
}

async fn find_issue<C: ConnectionTrait>(
    conn: &C,
    id: IssueId,
) -> Result<reconciliation_issues::Model, ReconciliationError> {
    reconciliation_issues::Entity::find_by_id(id.into_inner())
        .one(conn)
        .await
        .or_db(ReconciliationError::Database)?
        .ok_or(ReconciliationError::IssueNotFound(id))
}

async fn load<C: ConnectionTrait>(
    conn: &C,
    id: ReconciliationId,
) -> Result<Reconciliation, ReconciliationError> {
    let model = reconciliations::Entity::find_by_id(id.into_inner())
        .one(conn)
        .await
        .or_db(ReconciliationError::Database)?
        .ok_or(ReconciliationError::ReconciliationNotFound(id))?;

    let totals = reconciliation_totals::Entity::find()
        .filter(reconciliation_totals::Column::ReconciliationId.eq(model.id))
        .all(conn)
        .await
        .or_db(ReconciliationError::Database)?;
    let mut expected_totals = CategoryTotals::new();
    let mut actual_totals = CategoryTotals::new();
    for row in totals {
        match row.kind {
            TotalsKind::Expected => expected_totals.insert(row.category, row.amount),
            TotalsKind::Actual => actual_totals.insert(row.category, row.amount),
        };
    }

    let issues = reconciliation_issues::Entity::find()
        .filter(reconciliation_issues::Column::ReconciliationId.eq(model.id))
        .order_by_asc(reconciliation_issues::Column::Category)
        .all(conn)
        .await
        .or_db(ReconciliationError::Database)?;

    Ok(Reconciliation {
        id,
        period_start: model.period_start,
        period_end: model.period_end,
        expected_totals,
        actual_totals: model.actuals_recorded_at.map(|_| actual_totals),
        issues: issues.into_iter().map(to_issue).collect(),
        created_at: model.created_at,
    })
}

fn to_issue(model: reconciliation_issues::Model) -> ReconciliationIssue {
    ReconciliationIssue {
        id: model.id.into(),
        reconciliation_id: model.reconciliation_id.into(),
        category: model.category,
        expected: model.expected,
        actual: model.actual,
        difference: model.difference,
        description: model.description,
        status: model.status.into(),
        resolution: model.resolution,
        resolved_at: model.resolved_at,
        created_at: model.created_at,
    }
}
