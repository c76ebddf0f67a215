//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes under `/api/v1`
//! - Request and response bodies with money as decimal strings
//! - Mapping of domain errors onto HTTP responses

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use mizan_db::{
    AccountRepository, CommissionRepository, LedgerRepository, PayoutRepository,
    ReconciliationRepository, SettlementRepository,
};
use mizan_shared::Currency;
use mizan_shared::config::SettlementConfig;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// Reporting currency.
    pub base_currency: Currency,
    /// Posting accounts used when settlements are approved.
    pub settlement: Arc<SettlementConfig>,
}

impl AppState {
    pub(crate) fn accounts(&self) -> AccountRepository {
        AccountRepository::new((*self.db).clone())
    }

    pub(crate) fn ledger(&self) -> LedgerRepository {
        LedgerRepository::new((*self.db).clone(), self.base_currency)
    }

    pub(crate) fn commissions(&self) -> CommissionRepository {
        CommissionRepository::new((*self.db).clone())
    }

    pub(crate) fn settlements(&self) -> SettlementRepository {
        SettlementRepository::new((*self.db).clone(), self.base_currency, (*self.settlement).clone())
    }

    pub(crate) fn payouts(&self) -> PayoutRepository {
        PayoutRepository::new((*self.db).clone())
    }

    pub(crate) fn reconciliations(&self) -> ReconciliationRepository {
        ReconciliationRepository::new((*self.db).clone(), self.base_currency)
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
