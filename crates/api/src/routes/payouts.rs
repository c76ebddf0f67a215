//! Payout batch routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use mizan_core::payout::{BatchFilter, BatchStatus, ItemOutcome, ItemSource, PayoutBatch, PayoutItemInput};
use mizan_shared::{Currency, PayoutBatchId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::{map_page, page_request, to_major};
use crate::{ApiError, AppState};

/// Creates the payout batch routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/payout-batches", get(list_batches).post(create_batch))
        .route("/payout-batches/{batch_id}", get(get_batch))
        .route("/payout-batches/{batch_id}/approve", post(approve_batch))
        .route("/payout-batches/{batch_id}/complete", post(complete_batch))
}

/// Request body for creating a batch.
#[derive(Debug, Deserialize)]
pub struct CreateBatchRequest {
    /// Commissions and settlements to pay.
    pub items: Vec<PayoutItemInput>,
}

/// Query parameters for listing batches.
#[derive(Debug, Deserialize)]
pub struct ListBatchesQuery {
    /// Filter by status.
    pub status: Option<BatchStatus>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Page size.
    pub per_page: Option<u32>,
}

/// Response for a batch item.
#[derive(Debug, Serialize)]
pub struct ItemResponse {
    /// Commission or settlement.
    pub source: ItemSource,
    /// Source ID.
    pub source_id: Uuid,
    /// Amount snapshotted at creation.
    pub amount: Decimal,
    /// When the source was marked paid.
    pub paid_at: Option<DateTime<Utc>>,
    /// Result of completion, once processed.
    pub outcome: Option<ItemOutcome>,
}

/// Response for a batch.
#[derive(Debug, Serialize)]
pub struct BatchResponse {
    /// Batch ID.
    pub id: Uuid,
    /// Lifecycle status.
    pub status: BatchStatus,
    /// Sum of item amounts.
    pub total: Decimal,
    /// Base currency.
    pub currency: Currency,
    /// Items in insertion order.
    pub items: Vec<ItemResponse>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Approval time.
    pub approved_at: Option<DateTime<Utc>>,
    /// Completion time.
    pub completed_at: Option<DateTime<Utc>>,
    /// Optimistic lock version.
    pub version: i64,
}

fn batch_response(batch: PayoutBatch, base: Currency) -> BatchResponse {
    BatchResponse {
        id: batch.id.into_inner(),
        status: batch.status,
        total: to_major(batch.total, base),
        currency: base,
        items: batch
            .items
            .into_iter()
            .map(|i| ItemResponse {
                source: i.source,
                source_id: i.source_id,
                amount: to_major(i.amount, base),
                paid_at: i.paid_at,
                outcome: i.outcome,
            })
            .collect(),
        created_at: batch.created_at,
        approved_at: batch.approved_at,
        completed_at: batch.completed_at,
        version: batch.version,
    }
}

/// GET `/payout-batches`.
async fn list_batches(
    State(state): State<AppState>,
    Query(query): Query<ListBatchesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = BatchFilter { status: query.status };
    let page = page_request(query.page, query.per_page);
    let batches = state.payouts().list_batches(&filter, &page).await?;
    let base = state.base_currency;
    Ok(Json(map_page(batches, |b| batch_response(b, base))))
}

/// POST `/payout-batches` - Snapshot payable items.
async fn create_batch(
    State(state): State<AppState>,
    Json(payload): Json<CreateBatchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let batch = state.payouts().create_batch(payload.items).await?;
    info!(batch_id = %batch.id, items = batch.items.len(), total = batch.total, "Payout batch created");
    Ok((StatusCode::CREATED, Json(batch_response(batch, state.base_currency))))
}

/// GET `/payout-batches/{batch_id}`.
async fn get_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let batch = state.payouts().get_batch(PayoutBatchId::from(batch_id)).await?;
    Ok(Json(batch_response(batch, state.base_currency)))
}

/// POST `/payout-batches/{batch_id}/approve`.
async fn approve_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let batch = state.payouts().approve_batch(PayoutBatchId::from(batch_id)).await?;
    Ok(Json(batch_response(batch, state.base_currency)))
}

/// POST `/payout-batches/{batch_id}/complete` - Safe to retry.
async fn complete_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let batch = state.payouts().complete_batch(PayoutBatchId::from(batch_id)).await?;
    Ok(Json(batch_response(batch, state.base_currency)))
}
