//! Settlement errors.

use chrono::NaiveDate;
use mizan_shared::{EntityId, ErrorCategory, SettlementId};
use thiserror::Error;

use super::types::SettlementStatus;
use crate::ledger::LedgerError;

/// Errors that can occur during settlement operations.
#[derive(Debug, Error)]
pub enum SettlementError {
    /// Period ends before it starts.
    #[error("Invalid period: {start} is after {end}")]
    InvalidPeriod {
        /// Requested start.
        start: NaiveDate,
        /// Requested end.
        end: NaiveDate,
    },

    /// Another settlement for the entity covers part of the range.
    #[error("Entity {entity_id} already has settlement {existing} overlapping the period")]
    OverlappingPeriod {
        /// The entity.
        entity_id: EntityId,
        /// The settlement already covering those days.
        existing: SettlementId,
    },

    /// Attempted an invalid status transition.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: SettlementStatus,
        /// The attempted target status.
        to: SettlementStatus,
    },

    /// Configured posting account does not exist.
    #[error("Settlement posting account '{0}' not found")]
    PostingAccountMissing(String),

    /// Aggregated total overflowed.
    #[error("Settlement total overflows")]
    AmountOverflow,

    /// The approval voucher was rejected.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Settlement not found.
    #[error("Settlement not found: {0}")]
    SettlementNotFound(SettlementId),

    /// Settlement changed since it was read.
    #[error("Settlement {0} was modified concurrently, please retry")]
    StaleVersion(SettlementId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl SettlementError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidPeriod { .. } => "INVALID_PERIOD",
            Self::OverlappingPeriod { .. } => "OVERLAPPING_PERIOD",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::PostingAccountMissing(_) => "POSTING_ACCOUNT_MISSING",
            Self::AmountOverflow => "AMOUNT_OVERFLOW",
            Self::Ledger(inner) => inner.error_code(),
            Self::SettlementNotFound(_) => "SETTLEMENT_NOT_FOUND",
            Self::StaleVersion(_) => "STALE_VERSION",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidPeriod { .. } | Self::AmountOverflow => ErrorCategory::Validation,
            Self::OverlappingPeriod { .. } | Self::InvalidTransition { .. } => {
                ErrorCategory::StateMachine
            }
            Self::Ledger(inner) => inner.category(),
            Self::SettlementNotFound(_) => ErrorCategory::NotFound,
            Self::StaleVersion(_) => ErrorCategory::Concurrency,
            Self::PostingAccountMissing(_) | Self::Database(_) => ErrorCategory::External,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        self.category().http_status_code()
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }
}
