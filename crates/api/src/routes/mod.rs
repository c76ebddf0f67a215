//! API route definitions.

use axum::Router;
use mizan_shared::{Currency, Money, PageRequest, PageResponse};
use rust_decimal::Decimal;

use crate::{AppState, ApiError};

pub mod accounts;
pub mod commissions;
pub mod health;
pub mod payouts;
pub mod reconciliation;
pub mod settlements;
pub mod vouchers;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(accounts::routes())
        .merge(vouchers::routes())
        .merge(commissions::routes())
        .merge(settlements::routes())
        .merge(payouts::routes())
        .merge(reconciliation::routes())
}

/// Decimal string amount to minor units, rejecting excess precision.
pub(crate) fn to_minor(amount: Decimal, currency: Currency) -> Result<i64, ApiError> {
    Ok(Money::from_decimal(amount, currency)?.minor)
}

/// Minor units back to a decimal amount.
pub(crate) fn to_major(minor: i64, currency: Currency) -> Decimal {
    Money::new(minor, currency).to_decimal()
}

pub(crate) fn page_request(page: Option<u32>, per_page: Option<u32>) -> PageRequest {
    let defaults = PageRequest::default();
    PageRequest::new(page.unwrap_or(defaults.page), per_page.unwrap_or(defaults.per_page))
}

pub(crate) fn map_page<T, U>(page: PageResponse<T>, f: impl FnMut(T) -> U) -> PageResponse<U> {
    PageResponse {
        data: page.data.into_iter().map(f).collect(),
        meta: page.meta,
    }
}
