//! Settlement routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, NaiveDate, Utc};
use mizan_core::commission::BeneficiaryType;
use mizan_core::settlement::{CreateSettlementInput, Settlement, SettlementFilter, SettlementStatus};
use mizan_shared::{Currency, EntityId, SettlementId, VoucherId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::{map_page, page_request, to_major};
use crate::{ApiError, AppState};

/// Creates the settlement routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/settlements", get(list_settlements).post(create_settlement))
        .route("/settlements/{settlement_id}", get(get_settlement))
        .route("/settlements/{settlement_id}/approve", post(approve_settlement))
}

/// Query parameters for listing settlements.
#[derive(Debug, Deserialize)]
pub struct ListSettlementsQuery {
    /// Filter by status.
    pub status: Option<SettlementStatus>,
    /// Filter by entity.
    pub entity_id: Option<Uuid>,
    /// Periods ending on or after this day.
    pub from: Option<NaiveDate>,
    /// Periods starting on or before this day.
    pub to: Option<NaiveDate>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Page size.
    pub per_page: Option<u32>,
}

/// Response for a settlement.
#[derive(Debug, Serialize)]
pub struct SettlementResponse {
    /// Settlement ID.
    pub id: Uuid,
    /// Settled party.
    pub entity_id: Uuid,
    /// Kind of party.
    pub entity_model: BeneficiaryType,
    /// First day.
    pub period_start: NaiveDate,
    /// Last day.
    pub period_end: NaiveDate,
    /// Amount owed to the party.
    pub expected_total: Decimal,
    /// Base currency.
    pub currency: Currency,
    /// Commissions claimed by this settlement.
    pub commission_ids: Vec<Uuid>,
    /// Lifecycle status.
    pub status: SettlementStatus,
    /// Voucher posted on approval.
    pub voucher_id: Option<Uuid>,
    /// Approval time.
    pub approved_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Optimistic lock version.
    pub version: i64,
}

fn settlement_response(s: Settlement, base: Currency) -> SettlementResponse {
    SettlementResponse {
        id: s.id.into_inner(),
        entity_id: s.entity_id.into_inner(),
        entity_model: s.entity_model,
        period_start: s.period_start,
        period_end: s.period_end,
        expected_total: to_major(s.expected_total, base),
        currency: base,
        commission_ids: s.commission_ids.into_iter().map(|id| id.into_inner()).collect(),
        status: s.status,
        voucher_id: s.voucher_id.map(VoucherId::into_inner),
        approved_at: s.approved_at,
        created_at: s.created_at,
        version: s.version,
    }
}

/// GET `/settlements`.
async fn list_settlements(
    State(state): State<AppState>,
    Query(query): Query<ListSettlementsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = SettlementFilter {
        status: query.status,
        entity_id: query.entity_id.map(EntityId::from),
        date_from: query.from,
        date_to: query.to,
    };
    let page = page_request(query.page, query.per_page);
    let settlements = state.settlements().list_settlements(&filter, &page).await?;
    let base = state.base_currency;
    Ok(Json(map_page(settlements, |s| settlement_response(s, base))))
}

/// POST `/settlements` - Aggregate a period into a draft.
async fn create_settlement(
    State(state): State<AppState>,
    Json(payload): Json<CreateSettlementInput>,
) -> Result<impl IntoResponse, ApiError> {
    let settlement = state.settlements().create_settlement(payload).await?;
    info!(
        settlement_id = %settlement.id,
        entity_id = %settlement.entity_id,
        expected_total = settlement.expected_total,
        "Settlement created"
    );
    Ok((StatusCode::CREATED, Json(settlement_response(settlement, state.base_currency))))
}

/// GET `/settlements/{settlement_id}`.
async fn get_settlement(
    State(state): State<AppState>,
    Path(settlement_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let settlement = state
        .settlements()
        .get_settlement(SettlementId::from(settlement_id))
        .await?;
    Ok(Json(settlement_response(settlement, state.base_currency)))
}

/// POST `/settlements/{settlement_id}/approve` - Approve and post.
async fn approve_settlement(
    State(state): State<AppState>,
    Path(settlement_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let settlement = state.settlements().approve(SettlementId::from(settlement_id)).await?;
    Ok(Json(settlement_response(settlement, state.base_currency)))
}
