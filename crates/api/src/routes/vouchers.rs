//! Journal voucher routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, NaiveDate, Utc};
use mizan_core::ledger::{
    JournalLine, JournalLineInput, JournalVoucher, StageVoucherInput, VoucherFilter, VoucherStatus,
};
use mizan_shared::{AccountId, Currency, EntityId, VoucherId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::{map_page, page_request, to_major, to_minor};
use crate::{ApiError, AppState};

/// Creates the voucher routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/vouchers", get(list_vouchers).post(stage_voucher))
        .route("/vouchers/by-number/{number}", get(get_voucher_by_number))
        .route("/vouchers/{voucher_id}", get(get_voucher).delete(discard_draft))
        .route("/vouchers/{voucher_id}/post", post(post_voucher))
        .route("/vouchers/{voucher_id}/reverse", post(reverse_voucher))
}

/// Query parameters for listing vouchers.
#[derive(Debug, Deserialize)]
pub struct ListVouchersQuery {
    /// Filter by status.
    pub status: Option<VoucherStatus>,
    /// Start date filter (inclusive).
    pub from: Option<NaiveDate>,
    /// End date filter (inclusive).
    pub to: Option<NaiveDate>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Page size.
    pub per_page: Option<u32>,
}

/// One line of a voucher being staged. Amounts are in `currency`.
#[derive(Debug, Deserialize)]
pub struct LineRequest {
    /// Leaf account.
    pub account_id: Uuid,
    /// Debit amount; omit on credit lines.
    pub debit: Option<Decimal>,
    /// Credit amount; omit on debit lines.
    pub credit: Option<Decimal>,
    /// Line currency.
    pub currency: Currency,
    /// Rate into the base currency (default 1).
    pub rate: Option<Decimal>,
    /// Party the line concerns.
    pub entity_id: Option<Uuid>,
    /// Optional memo.
    pub memo: Option<String>,
}

/// Request body for staging a voucher.
#[derive(Debug, Deserialize)]
pub struct StageVoucherRequest {
    /// Accounting date.
    pub date: NaiveDate,
    /// Description.
    pub description: String,
    /// External reference.
    pub reference: Option<String>,
    /// Lines.
    pub lines: Vec<LineRequest>,
}

impl StageVoucherRequest {
    fn into_input(self) -> Result<StageVoucherInput, ApiError> {
        let lines = self
            .lines
            .into_iter()
            .map(|line| {
                Ok(JournalLineInput {
                    account_id: AccountId::from(line.account_id),
                    debit: to_minor(line.debit.unwrap_or_default(), line.currency)?,
                    credit: to_minor(line.credit.unwrap_or_default(), line.currency)?,
                    currency: line.currency,
                    rate: line.rate.unwrap_or(Decimal::ONE),
                    entity_id: line.entity_id.map(EntityId::from),
                    memo: line.memo,
                })
            })
            .collect::<Result<Vec<_>, ApiError>>()?;
        Ok(StageVoucherInput {
            date: self.date,
            description: self.description,
            reference: self.reference,
            lines,
        })
    }
}

/// Request body for reversing a voucher.
#[derive(Debug, Default, Deserialize)]
pub struct ReverseRequest {
    /// Date of the reversal (default today).
    pub date: Option<NaiveDate>,
}

/// Response for a voucher line.
#[derive(Debug, Serialize)]
pub struct LineResponse {
    /// 1-based position.
    pub line_no: i32,
    /// Account.
    pub account_id: Uuid,
    /// Debit in the line currency.
    pub debit: Decimal,
    /// Credit in the line currency.
    pub credit: Decimal,
    /// Line currency.
    pub currency: Currency,
    /// Rate into the base currency.
    pub rate: Decimal,
    /// Debit in the base currency.
    pub base_debit: Decimal,
    /// Credit in the base currency.
    pub base_credit: Decimal,
    /// Party the line concerns.
    pub entity_id: Option<Uuid>,
    /// Memo.
    pub memo: Option<String>,
}

/// Response for a voucher.
#[derive(Debug, Serialize)]
pub struct VoucherResponse {
    /// Voucher ID.
    pub id: Uuid,
    /// Human-readable number.
    pub voucher_number: String,
    /// Accounting date.
    pub date: NaiveDate,
    /// Description.
    pub description: String,
    /// External reference.
    pub reference: Option<String>,
    /// Draft or posted.
    pub status: VoucherStatus,
    /// Voucher this one reverses.
    pub reverses_voucher_id: Option<Uuid>,
    /// Settlement whose approval produced this voucher.
    pub settlement_id: Option<Uuid>,
    /// Base currency of the totals.
    pub base_currency: Currency,
    /// Sum of base debits.
    pub total_debit: Decimal,
    /// Sum of base credits.
    pub total_credit: Decimal,
    /// Lines in order.
    pub lines: Vec<LineResponse>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Posting time.
    pub posted_at: Option<DateTime<Utc>>,
    /// Optimistic lock version.
    pub version: i64,
}

fn line_response(line: JournalLine, base: Currency) -> LineResponse {
    LineResponse {
        line_no: line.line_no,
        account_id: line.account_id.into_inner(),
        debit: to_major(line.debit, line.currency),
        credit: to_major(line.credit, line.currency),
        currency: line.currency,
        rate: line.rate,
        base_debit: to_major(line.base_debit, base),
        base_credit: to_major(line.base_credit, base),
        entity_id: line.entity_id.map(EntityId::into_inner),
        memo: line.memo,
    }
}

pub(crate) fn voucher_response(voucher: JournalVoucher, base: Currency) -> VoucherResponse {
    let totals = voucher.totals();
    VoucherResponse {
        id: voucher.id.into_inner(),
        voucher_number: voucher.voucher_number,
        date: voucher.date,
        description: voucher.description,
        reference: voucher.reference,
        status: voucher.status,
        reverses_voucher_id: voucher.reverses_voucher_id.map(VoucherId::into_inner),
        settlement_id: voucher.settlement_id.map(|id| id.into_inner()),
        base_currency: base,
        total_debit: to_major(totals.base_debit, base),
        total_credit: to_major(totals.base_credit, base),
        lines: voucher.lines.into_iter().map(|l| line_response(l, base)).collect(),
        created_at: voucher.created_at,
        posted_at: voucher.posted_at,
        version: voucher.version,
    }
}

/// GET `/vouchers` - Paged list, newest first.
async fn list_vouchers(
    State(state): State<AppState>,
    Query(query): Query<ListVouchersQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = VoucherFilter {
        status: query.status,
        date_from: query.from,
        date_to: query.to,
    };
    let page = page_request(query.page, query.per_page);
    let vouchers = state.ledger().list_vouchers(&filter, &page).await?;
    let base = state.base_currency;
    Ok(Json(map_page(vouchers, |v| voucher_response(v, base))))
}

/// POST `/vouchers` - Stage a draft.
async fn stage_voucher(
    State(state): State<AppState>,
    Json(payload): Json<StageVoucherRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = payload.into_input()?;
    let voucher = state.ledger().stage_voucher(input).await?;
    info!(
        voucher_id = %voucher.id,
        voucher_number = %voucher.voucher_number,
        "Voucher staged"
    );
    Ok((StatusCode::CREATED, Json(voucher_response(voucher, state.base_currency))))
}

/// GET `/vouchers/{voucher_id}`.
async fn get_voucher(
    State(state): State<AppState>,
    Path(voucher_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let voucher = state.ledger().get_voucher(VoucherId::from(voucher_id)).await?;
    Ok(Json(voucher_response(voucher, state.base_currency)))
}

/// GET `/vouchers/by-number/{number}`.
async fn get_voucher_by_number(
    State(state): State<AppState>,
    Path(number): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let voucher = state.ledger().get_voucher_by_number(&number).await?;
    Ok(Json(voucher_response(voucher, state.base_currency)))
}

/// POST `/vouchers/{voucher_id}/post` - Commit a draft.
async fn post_voucher(
    State(state): State<AppState>,
    Path(voucher_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let voucher = state.ledger().post_voucher(VoucherId::from(voucher_id)).await?;
    Ok(Json(voucher_response(voucher, state.base_currency)))
}

/// POST `/vouchers/{voucher_id}/reverse` - Post the mirror image.
async fn reverse_voucher(
    State(state): State<AppState>,
    Path(voucher_id): Path<Uuid>,
    payload: Option<Json<ReverseRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload.unwrap_or_default();
    let reversal = state
        .ledger()
        .reverse_voucher(VoucherId::from(voucher_id), request.date)
        .await?;
    Ok((StatusCode::CREATED, Json(voucher_response(reversal, state.base_currency))))
}

/// DELETE `/vouchers/{voucher_id}` - Discard a draft.
async fn discard_draft(
    State(state): State<AppState>,
    Path(voucher_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.ledger().discard_draft(VoucherId::from(voucher_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
