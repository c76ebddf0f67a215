//! Account registry routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use mizan_core::accounts::{CreateAccountInput, UpdateAccountInput};
use mizan_shared::{AccountId, Currency};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use super::to_major;
use crate::{ApiError, AppState};

/// Creates the account routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/accounts", get(list_accounts).post(create_account))
        .route("/accounts/tree", get(account_tree))
        .route(
            "/accounts/{account_id}",
            get(get_account).patch(update_account).delete(delete_account),
        )
        .route("/accounts/{account_id}/balance", get(account_balance))
}

/// Query parameters for listing accounts.
#[derive(Debug, Deserialize)]
pub struct ListAccountsQuery {
    /// Filter by active status.
    pub active: Option<bool>,
}

/// Posted totals over an account's subtree.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// Account ID.
    pub account_id: Uuid,
    /// Reporting currency of the amounts.
    pub currency: Currency,
    /// Sum of posted debits.
    pub debit: Decimal,
    /// Sum of posted credits.
    pub credit: Decimal,
    /// `debit - credit`.
    pub balance: Decimal,
}

/// GET `/accounts` - Flat list ordered by code.
async fn list_accounts(
    State(state): State<AppState>,
    Query(query): Query<ListAccountsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let accounts = state.accounts().list_accounts(query.active).await?;
    Ok(Json(json!({ "accounts": accounts })))
}

/// GET `/accounts/tree` - Roots with nested children.
async fn account_tree(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let tree = state.accounts().tree().await?;
    Ok(Json(json!({ "accounts": tree })))
}

/// POST `/accounts` - Create an account.
async fn create_account(
    State(state): State<AppState>,
    Json(payload): Json<CreateAccountInput>,
) -> Result<impl IntoResponse, ApiError> {
    let account = state.accounts().create_account(payload).await?;
    info!(account_id = %account.id, code = %account.code, "Account created");
    Ok((StatusCode::CREATED, Json(account)))
}

/// GET `/accounts/{account_id}`.
async fn get_account(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let account = state.accounts().get_account(AccountId::from(account_id)).await?;
    Ok(Json(account))
}

/// PATCH `/accounts/{account_id}` - Rename or toggle active.
async fn update_account(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
    Json(payload): Json<UpdateAccountInput>,
) -> Result<impl IntoResponse, ApiError> {
    let account = state
        .accounts()
        .update_account(AccountId::from(account_id), payload)
        .await?;
    Ok(Json(account))
}

/// DELETE `/accounts/{account_id}` - Only unused leaves.
async fn delete_account(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.accounts().delete_account(AccountId::from(account_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET `/accounts/{account_id}/balance`.
async fn account_balance(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let balance = state.accounts().account_balance(AccountId::from(account_id)).await?;
    let base = state.base_currency;
    Ok(Json(BalanceResponse {
        account_id,
        currency: base,
        debit: to_major(balance.debit, base),
        credit: to_major(balance.credit, base),
        balance: to_major(balance.debit.saturating_sub(balance.credit), base),
    }))
}
