//! Commission plan, trigger and commission routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, NaiveDate, Utc};
use mizan_core::commission::{
    BeneficiaryType, Commission, CommissionFilter, CommissionPlan, CommissionRule,
    CommissionStatus, CreatePlanInput, TriggerContext,
};
use mizan_shared::{CommissionId, CommissionPlanId, Currency, EntityId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use super::{map_page, page_request, to_major, to_minor};
use crate::{ApiError, AppState};

/// Creates the commission routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/commission-plans", get(list_plans).post(create_plan))
        .route("/commission-plans/{plan_id}", get(get_plan))
        .route("/commission-plans/{plan_id}/activate", post(activate_plan))
        .route("/commission-plans/{plan_id}/deactivate", post(deactivate_plan))
        .route("/events/triggers", post(on_trigger))
        .route("/commissions", get(list_commissions))
        .route("/commissions/{commission_id}", get(get_commission))
        .route("/commissions/{commission_id}/approve", post(approve_commission))
        .route("/commissions/{commission_id}/cancel", post(cancel_commission))
}

/// A rule in a plan request. `amount` is in the base currency.
#[derive(Debug, Deserialize, Serialize)]
pub struct RuleBody {
    /// Event name.
    pub trigger: String,
    /// Fixed amount paid per firing.
    pub amount: Decimal,
    /// Restricts the rule to one kind of beneficiary.
    #[serde(default)]
    pub beneficiary_type: Option<BeneficiaryType>,
}

/// Request body for creating a plan.
#[derive(Debug, Deserialize)]
pub struct CreatePlanRequest {
    /// Display name.
    pub name: String,
    /// Whether the plan pays immediately (default true).
    pub active: Option<bool>,
    /// Rules, one per trigger.
    pub rules: Vec<RuleBody>,
}

/// Response for a plan.
#[derive(Debug, Serialize)]
pub struct PlanResponse {
    /// Plan ID.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Whether triggers are evaluated against it.
    pub active: bool,
    /// Currency of the rule amounts.
    pub currency: Currency,
    /// Rules.
    pub rules: Vec<RuleBody>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Optimistic lock version.
    pub version: i64,
}

/// Trigger event delivered by the marketplace.
#[derive(Debug, Deserialize)]
pub struct TriggerRequest {
    /// Event name, e.g. `store_approved`.
    pub event_name: String,
    /// Order the event concerns, if any, plus the parties to pay.
    #[serde(flatten)]
    pub context: TriggerContext,
}

/// Query parameters for listing commissions.
#[derive(Debug, Deserialize)]
pub struct ListCommissionsQuery {
    /// Filter by status.
    pub status: Option<CommissionStatus>,
    /// Filter by beneficiary.
    pub beneficiary_id: Option<Uuid>,
    /// Filter by beneficiary kind.
    pub beneficiary_type: Option<BeneficiaryType>,
    /// Created on or after this day.
    pub from: Option<NaiveDate>,
    /// Created on or before this day.
    pub to: Option<NaiveDate>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Page size.
    pub per_page: Option<u32>,
}

/// Response for a commission.
#[derive(Debug, Serialize)]
pub struct CommissionResponse {
    /// Commission ID.
    pub id: Uuid,
    /// Who earns it.
    pub beneficiary_id: Uuid,
    /// Kind of beneficiary.
    pub beneficiary_type: BeneficiaryType,
    /// Amount in `currency`.
    pub amount: Decimal,
    /// Base currency.
    pub currency: Currency,
    /// Order that caused it.
    pub source_order_id: Option<String>,
    /// Event that caused it.
    pub trigger: String,
    /// Plan whose rule matched.
    pub plan_id: Uuid,
    /// Lifecycle status.
    pub status: CommissionStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Optimistic lock version.
    pub version: i64,
}

fn plan_response(plan: CommissionPlan, base: Currency) -> PlanResponse {
    PlanResponse {
        id: plan.id.into_inner(),
        name: plan.name,
        active: plan.active,
        currency: base,
        rules: plan
            .rules
            .into_iter()
            .map(|r| RuleBody {
                trigger: r.trigger,
                amount: to_major(r.amount, base),
                beneficiary_type: r.beneficiary_type,
            })
            .collect(),
        created_at: plan.created_at,
        version: plan.version,
    }
}

pub(crate) fn commission_response(c: Commission, base: Currency) -> CommissionResponse {
    CommissionResponse {
        id: c.id.into_inner(),
        beneficiary_id: c.beneficiary_id.into_inner(),
        beneficiary_type: c.beneficiary_type,
        amount: to_major(c.amount, base),
        currency: base,
        source_order_id: c.source_order_id,
        trigger: c.trigger,
        plan_id: c.plan_id.into_inner(),
        status: c.status,
        created_at: c.created_at,
        version: c.version,
    }
}

/// GET `/commission-plans`.
async fn list_plans(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let base = state.base_currency;
    let plans: Vec<PlanResponse> = state
        .commissions()
        .list_plans()
        .await?
        .into_iter()
        .map(|p| plan_response(p, base))
        .collect();
    Ok(Json(json!({ "plans": plans })))
}

/// POST `/commission-plans`.
async fn create_plan(
    State(state): State<AppState>,
    Json(payload): Json<CreatePlanRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let base = state.base_currency;
    let rules = payload
        .rules
        .into_iter()
        .map(|r| {
            Ok(CommissionRule {
                trigger: r.trigger,
                amount: to_minor(r.amount, base)?,
                beneficiary_type: r.beneficiary_type,
            })
        })
        .collect::<Result<Vec<_>, ApiError>>()?;
    let plan = state
        .commissions()
        .create_plan(CreatePlanInput {
            name: payload.name,
            active: payload.active.unwrap_or(true),
            rules,
        })
        .await?;
    info!(plan_id = %plan.id, rules = plan.rules.len(), "Commission plan created");
    Ok((StatusCode::CREATED, Json(plan_response(plan, base))))
}

/// GET `/commission-plans/{plan_id}`.
async fn get_plan(
    State(state): State<AppState>,
    Path(plan_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let plan = state.commissions().get_plan(CommissionPlanId::from(plan_id)).await?;
    Ok(Json(plan_response(plan, state.base_currency)))
}

/// POST `/commission-plans/{plan_id}/activate`.
async fn activate_plan(
    State(state): State<AppState>,
    Path(plan_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let plan = state
        .commissions()
        .set_plan_active(CommissionPlanId::from(plan_id), true)
        .await?;
    Ok(Json(plan_response(plan, state.base_currency)))
}

/// POST `/commission-plans/{plan_id}/deactivate`.
async fn deactivate_plan(
    State(state): State<AppState>,
    Path(plan_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let plan = state
        .commissions()
        .set_plan_active(CommissionPlanId::from(plan_id), false)
        .await?;
    Ok(Json(plan_response(plan, state.base_currency)))
}

/// POST `/events/triggers` - At-least-once event ingestion.
///
/// Replays of an already handled (event, order, beneficiary) return an
/// empty list.
async fn on_trigger(
    State(state): State<AppState>,
    Json(payload): Json<TriggerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state
        .commissions()
        .evaluate_trigger(&payload.event_name, &payload.context)
        .await?;
    let ids: Vec<Uuid> = created.iter().map(|c| c.id.into_inner()).collect();
    Ok(Json(json!({ "commission_ids": ids })))
}

/// GET `/commissions`.
async fn list_commissions(
    State(state): State<AppState>,
    Query(query): Query<ListCommissionsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = CommissionFilter {
        status: query.status,
        beneficiary_id: query.beneficiary_id.map(EntityId::from),
        beneficiary_type: query.beneficiary_type,
        date_from: query.from,
        date_to: query.to,
    };
    let page = page_request(query.page, query.per_page);
    let commissions = state.commissions().list_commissions(&filter, &page).await?;
    let base = state.base_currency;
    Ok(Json(map_page(commissions, |c| commission_response(c, base))))
}

/// GET `/commissions/{commission_id}`.
async fn get_commission(
    State(state): State<AppState>,
    Path(commission_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let commission = state
        .commissions()
        .get_commission(CommissionId::from(commission_id))
        .await?;
    Ok(Json(commission_response(commission, state.base_currency)))
}

/// POST `/commissions/{commission_id}/approve`.
async fn approve_commission(
    State(state): State<AppState>,
    Path(commission_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let commission = state.commissions().approve(CommissionId::from(commission_id)).await?;
    Ok(Json(commission_response(commission, state.base_currency)))
}

/// POST `/commissions/{commission_id}/cancel`.
async fn cancel_commission(
    State(state): State<AppState>,
    Path(commission_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let commission = state.commissions().cancel(CommissionId::from(commission_id)).await?;
    Ok(Json(commission_response(commission, state.base_currency)))
}
