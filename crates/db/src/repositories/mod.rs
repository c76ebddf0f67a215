//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! Every mutation runs inside one database transaction; state transitions are
//! `UPDATE … WHERE id = ? AND version = ?` and report a lost race when no row
//! matched.

pub mod account;
pub mod commission;
pub mod ledger;
pub mod payout;
pub mod reconciliation;
pub mod settlement;

pub use account::AccountRepository;
pub use commission::CommissionRepository;
pub use ledger::LedgerRepository;
pub use payout::PayoutRepository;
pub use reconciliation::ReconciliationRepository;
pub use settlement::SettlementRepository;

use sea_orm::{DbErr, SqlErr};

/// Maps storage failures onto a domain error's `Database` variant.
pub(crate) trait DbResultExt<T> {
    /// Logs the failure and wraps its message with `wrap`.
    fn or_db<E>(self, wrap: fn(String) -> E) -> Result<T, E>;
}

impl<T> DbResultExt<T> for Result<T, DbErr> {
    fn or_db<E>(self, wrap: fn(String) -> E) -> Result<T, E> {
        self.map_err(|e| {
            tracing::error!(error = %e, "database operation failed");
            wrap(e.to_string())
        })
    }
}

/// True if the error is a unique index violation.
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Midnight UTC at the start of `date`.
pub(crate) fn day_start(date: chrono::NaiveDate) -> chrono::DateTime<chrono::Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// Midnight UTC after `date`, the exclusive upper bound of that day.
pub(crate) fn day_end(date: chrono::NaiveDate) -> chrono::DateTime<chrono::Utc> {
    day_start(date.succ_opt().unwrap_or(chrono::NaiveDate::MAX))
}
