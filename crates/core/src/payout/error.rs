//! Payout batch errors.

use mizan_shared::{ErrorCategory, PayoutBatchId};
use thiserror::Error;
use uuid::Uuid;

use super::types::{BatchStatus, ItemSource};

/// Errors that can occur during payout batch operations.
#[derive(Debug, Error)]
pub enum PayoutError {
    // ========== Validation Errors ==========
    /// A batch needs at least one item.
    #[error("Payout batch must have at least one item")]
    EmptyBatch,

    /// The same source is listed twice.
    #[error("{kind} {source_id} is listed more than once")]
    DuplicateItem {
        /// Source kind.
        kind: ItemSource,
        /// Source ID.
        source_id: Uuid,
    },

    /// The source does not exist.
    #[error("{kind} {source_id} not found")]
    SourceNotFound {
        /// Source kind.
        kind: ItemSource,
        /// Source ID.
        source_id: Uuid,
    },

    /// Nothing to pay for this source.
    #[error("{kind} {source_id} has non-positive amount {amount}")]
    NonPositiveAmount {
        /// Source kind.
        kind: ItemSource,
        /// Source ID.
        source_id: Uuid,
        /// The rejected amount.
        amount: i64,
    },

    /// Batch total overflowed.
    #[error("Payout batch total overflows")]
    AmountOverflow,

    // ========== State Errors ==========
    /// Source is cancelled, paid, or otherwise not payable.
    #[error("{kind} {source_id} is no longer payable")]
    ItemNoLongerPayable {
        /// Source kind.
        kind: ItemSource,
        /// Source ID.
        source_id: Uuid,
    },

    /// Source already belongs to another batch.
    #[error("{kind} {source_id} is already part of a payout batch")]
    ItemAlreadyBatched {
        /// Source kind.
        kind: ItemSource,
        /// Source ID.
        source_id: Uuid,
    },

    /// Attempted an invalid status transition.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: BatchStatus,
        /// The attempted target status.
        to: BatchStatus,
    },

    /// Batch not found.
    #[error("Payout batch not found: {0}")]
    BatchNotFound(PayoutBatchId),

    // ========== Concurrency Errors ==========
    /// Batch changed since it was read.
    #[error("Payout batch {0} was modified concurrently, please retry")]
    StaleVersion(PayoutBatchId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl PayoutError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyBatch => "EMPTY_BATCH",
            Self::DuplicateItem { .. } => "DUPLICATE_ITEM",
            Self::SourceNotFound { .. } => "SOURCE_NOT_FOUND",
            Self::NonPositiveAmount { .. } => "NON_POSITIVE_AMOUNT",
            Self::AmountOverflow => "AMOUNT_OVERFLOW",
            Self::ItemNoLongerPayable { .. } => "ITEM_NO_LONGER_PAYABLE",
            Self::ItemAlreadyBatched { .. } => "ITEM_ALREADY_BATCHED",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::BatchNotFound(_) => "BATCH_NOT_FOUND",
            Self::StaleVersion(_) => "STALE_VERSION",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::EmptyBatch
            | Self::DuplicateItem { .. }
            | Self::SourceNotFound { .. }
            | Self::NonPositiveAmount { .. }
            | Self::AmountOverflow => ErrorCategory::Validation,
            Self::ItemNoLongerPayable { .. }
            | Self::ItemAlreadyBatched { .. }
            | Self::InvalidTransition { .. } => ErrorCategory::StateMachine,
            Self::BatchNotFound(_) => ErrorCategory::NotFound,
            Self::StaleVersion(_) => ErrorCategory::Concurrency,
            Self::Database(_) => ErrorCategory::External,
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
