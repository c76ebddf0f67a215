//! Reconciliation errors.

use chrono::NaiveDate;
use mizan_shared::{ErrorCategory, IssueId, ReconciliationId};
use thiserror::Error;

/// Errors that can occur during reconciliation operations.
#[derive(Debug, Error)]
pub enum ReconciliationError {
    /// Period ends before it starts.
    #[error("Invalid period: {start} is after {end}")]
    InvalidPeriod {
        /// Requested start.
        start: NaiveDate,
        /// Requested end.
        end: NaiveDate,
    },

    /// Reported totals are malformed.
    #[error("Invalid totals: {0}")]
    InvalidTotals(String),

    /// Totals overflowed.
    #[error("Reconciliation totals overflow")]
    AmountOverflow,

    /// Resolution text is required.
    #[error("Resolution text is required")]
    MissingResolution,

    /// A reconciliation for the period already exists.
    #[error("Reconciliation for {start}..{end} already exists")]
    DuplicatePeriod {
        /// Period start.
        start: NaiveDate,
        /// Period end.
        end: NaiveDate,
    },

    /// Actuals can be imported once.
    #[error("Actual totals already recorded for reconciliation {0}")]
    ActualAlreadyRecorded(ReconciliationId),

    /// Issue is not open.
    #[error("Issue {0} is already resolved")]
    IssueAlreadyResolved(IssueId),

    /// Reconciliation not found.
    #[error("Reconciliation not found: {0}")]
    ReconciliationNotFound(ReconciliationId),

    /// Issue not found.
    #[error("Reconciliation issue not found: {0}")]
    IssueNotFound(IssueId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl ReconciliationError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidPeriod { .. } => "INVALID_PERIOD",
            Self::InvalidTotals(_) => "INVALID_TOTALS",
            Self::AmountOverflow => "AMOUNT_OVERFLOW",
            Self::MissingResolution => "MISSING_RESOLUTION",
            Self::DuplicatePeriod { .. } => "DUPLICATE_PERIOD",
            Self::ActualAlreadyRecorded(_) => "ACTUAL_ALREADY_RECORDED",
            Self::IssueAlreadyResolved(_) => "ISSUE_ALREADY_RESOLVED",
            Self::ReconciliationNotFound(_) => "RECONCILIATION_NOT_FOUND",
            Self::IssueNotFound(_) => "ISSUE_NOT_FOUND",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidPeriod { .. }
            | Self::InvalidTotals(_)
            | Self::AmountOverflow
            | Self::MissingResolution => ErrorCategory::Validation,
            Self::DuplicatePeriod { .. }
            | Self::ActualAlreadyRecorded(_)
            | Self::IssueAlreadyResolved(_) => ErrorCategory::StateMachine,
            Self::ReconciliationNotFound(_) | Self::IssueNotFound(_) => ErrorCategory::NotFound,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(ReconciliationError::MissingResolution.error_code(), "MISSING_RESOLUTION");
        assert_eq!(ReconciliationError::MissingResolution.http_status_code(), 400);
        assert_eq!(
            ReconciliationError::IssueAlreadyResolved(IssueId::new()).http_status_code(),
            409
        );
        assert!(!ReconciliationError::MissingResolution.is_retryable());
    }
}
