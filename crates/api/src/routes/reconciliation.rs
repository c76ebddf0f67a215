//! Reconciliation routes.

use std::collections::BTreeMap;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, NaiveDate, Utc};
use mizan_core::reconciliation::{CategoryTotals, IssueStatus, Reconciliation, ReconciliationIssue};
use mizan_shared::{Currency, IssueId, ReconciliationId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use super::{to_major, to_minor};
use crate::{ApiError, AppState};

/// Creates the reconciliation routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reconciliations", post(open_reconciliation))
        .route("/reconciliations/expected", get(expected_totals))
        .route("/reconciliations/actuals", post(record_actual))
        .route("/reconciliations/{reconciliation_id}", get(get_reconciliation))
        .route("/reconciliation-issues", get(list_issues))
        .route("/reconciliation-issues/{issue_id}/resolve", post(resolve_issue))
}

/// Query parameters for the expected-totals preview.
#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    /// First day.
    pub from: NaiveDate,
    /// Last day.
    pub to: NaiveDate,
}

/// Request body for opening a reconciliation.
#[derive(Debug, Deserialize)]
pub struct OpenRequest {
    /// First day.
    pub period_start: NaiveDate,
    /// Last day.
    pub period_end: NaiveDate,
}

/// Externally reported totals for a period, per account code.
#[derive(Debug, Deserialize)]
pub struct ActualsRequest {
    /// First day.
    pub period_start: NaiveDate,
    /// Last day.
    pub period_end: NaiveDate,
    /// Net `debit - credit` per account code, base currency.
    pub totals: BTreeMap<String, Decimal>,
}

/// Query parameters for listing issues.
#[derive(Debug, Deserialize)]
pub struct ListIssuesQuery {
    /// Filter by status.
    pub status: Option<IssueStatus>,
}

/// Request body for resolving an issue.
#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    /// What explained the difference.
    pub resolution: String,
}

/// Response for an issue.
#[derive(Debug, Serialize)]
pub struct IssueResponse {
    /// Issue ID.
    pub id: Uuid,
    /// Owning reconciliation.
    pub reconciliation_id: Uuid,
    /// Account code.
    pub category: String,
    /// Ledger-derived total.
    pub expected: Decimal,
    /// Reported total.
    pub actual: Decimal,
    /// `expected - actual`.
    pub difference: Decimal,
    /// Summary.
    pub description: String,
    /// Open or resolved.
    pub status: IssueStatus,
    /// Resolution note.
    pub resolution: Option<String>,
    /// Resolution time.
    pub resolved_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Response for a reconciliation.
#[derive(Debug, Serialize)]
pub struct ReconciliationResponse {
    /// Reconciliation ID.
    pub id: Uuid,
    /// First day.
    pub period_start: NaiveDate,
    /// Last day.
    pub period_end: NaiveDate,
    /// Base currency.
    pub currency: Currency,
    /// Ledger-derived totals per account code.
    pub expected_totals: BTreeMap<String, Decimal>,
    /// Reported totals, once recorded.
    pub actual_totals: Option<BTreeMap<String, Decimal>>,
    /// Discrepancies raised.
    pub issues: Vec<IssueResponse>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

fn totals_response(totals: CategoryTotals, base: Currency) -> BTreeMap<String, Decimal> {
    totals.into_iter().map(|(k, v)| (k, to_major(v, base))).collect()
}

fn issue_response(issue: ReconciliationIssue, base: Currency) -> IssueResponse {
    IssueResponse {
        id: issue.id.into_inner(),
        reconciliation_id: issue.reconciliation_id.into_inner(),
        category: issue.category,
        expected: to_major(issue.expected, base),
        actual: to_major(issue.actual, base),
        difference: to_major(issue.difference, base),
        description: issue.description,
        status: issue.status,
        resolution: issue.resolution,
        resolved_at: issue.resolved_at,
        created_at: issue.created_at,
    }
}

fn reconciliation_response(r: Reconciliation, base: Currency) -> ReconciliationResponse {
    ReconciliationResponse {
        id: r.id.into_inner(),
        period_start: r.period_start,
        period_end: r.period_end,
        currency: base,
        expected_totals: totals_response(r.expected_totals, base),
        actual_totals: r.actual_totals.map(|t| totals_response(t, base)),
        issues: r.issues.into_iter().map(|i| issue_response(i, base)).collect(),
        created_at: r.created_at,
    }
}

/// GET `/reconciliations/expected?from&to` - Read-only preview.
async fn expected_totals(
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let totals = state.reconciliations().compute_expected(query.from, query.to).await?;
    let base = state.base_currency;
    Ok(Json(json!({
        "period_start": query.from,
        "period_end": query.to,
        "currency": base,
        "totals": totals_response(totals, base)
    })))
}

/// POST `/reconciliations` - Snapshot expected totals.
async fn open_reconciliation(
    State(state): State<AppState>,
    Json(payload): Json<OpenRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let reconciliation = state
        .reconciliations()
        .open_reconciliation(payload.period_start, payload.period_end)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(reconciliation_response(reconciliation, state.base_currency)),
    ))
}

/// POST `/reconciliations/actuals` - Statement import.
async fn record_actual(
    State(state): State<AppState>,
    Json(payload): Json<ActualsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let base = state.base_currency;
    let actual = payload
        .totals
        .into_iter()
        .map(|(code, amount)| Ok((code, to_minor(amount, base)?)))
        .collect::<Result<CategoryTotals, ApiError>>()?;
    let reconciliation = state
        .reconciliations()
        .record_actual(payload.period_start, payload.period_end, actual)
        .await?;
    info!(
        reconciliation_id = %reconciliation.id,
        issues = reconciliation.issues.len(),
        "Statement imported"
    );
    Ok(Json(reconciliation_response(reconciliation, base)))
}

/// GET `/reconciliations/{reconciliation_id}`.
async fn get_reconciliation(
    State(state): State<AppState>,
    Path(reconciliation_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let reconciliation = state
        .reconciliations()
        .get_reconciliation(ReconciliationId::from(reconciliation_id))
        .await?;
    Ok(Json(reconciliation_response(reconciliation, state.base_currency)))
}

/// GET `/reconciliation-issues?status=open`.
async fn list_issues(
    State(state): State<AppState>,
    Query(query): Query<ListIssuesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let base = state.base_currency;
    let issues: Vec<IssueResponse> = state
        .reconciliations()
        .list_issues(query.status)
        .await?
        .into_iter()
        .map(|i| issue_response(i, base))
        .collect();
    Ok(Json(json!({ "issues": issues })))
}

/// POST `/reconciliation-issues/{issue_id}/resolve`.
async fn resolve_issue(
    State(state): State<AppState>,
    Path(issue_id): Path<Uuid>,
    Json(payload): Json<ResolveRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let issue = state
        .reconciliations()
        .resolve_issue(IssueId::from(issue_id), &payload.resolution)
        .await?;
    Ok(Json(issue_response(issue, state.base_currency)))
}
