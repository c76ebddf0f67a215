//! Commission engine errors.

use mizan_shared::{CommissionId, CommissionPlanId, ErrorCategory};
use thiserror::Error;

use super::types::CommissionStatus;

/// Errors that can occur during commission operations.
#[derive(Debug, Error)]
pub enum CommissionError {
    /// Plan name or rule shape is invalid.
    #[error("Invalid commission plan: {0}")]
    InvalidPlanInput(String),

    /// Two rules of one plan share a trigger.
    #[error("Trigger '{0}' appears more than once in the plan")]
    DuplicateRuleTrigger(String),

    /// Rule amount is not positive.
    #[error("Rule '{trigger}' has non-positive amount {amount}")]
    InvalidRuleAmount {
        /// The rule's trigger.
        trigger: String,
        /// The rejected amount in minor units.
        amount: i64,
    },

    /// Trigger event is malformed.
    #[error("Invalid trigger event: {0}")]
    InvalidTriggerInput(String),

    /// Attempted an invalid status transition.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: CommissionStatus,
        /// The attempted target status.
        to: CommissionStatus,
    },

    /// Commission not found.
    #[error("Commission not found: {0}")]
    CommissionNotFound(CommissionId),

    /// Plan not found.
    #[error("Commission plan not found: {0}")]
    PlanNotFound(CommissionPlanId),

    /// Commission changed since it was read.
    #[error("Commission {0} was modified concurrently, please retry")]
    StaleVersion(CommissionId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl CommissionError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidPlanInput(_) => "INVALID_PLAN_INPUT",
            Self::DuplicateRuleTrigger(_) => "DUPLICATE_RULE_TRIGGER",
            Self::InvalidRuleAmount { .. } => "INVALID_RULE_AMOUNT",
            Self::InvalidTriggerInput(_) => "INVALID_TRIGGER_INPUT",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::CommissionNotFound(_) => "COMMISSION_NOT_FOUND",
            Self::PlanNotFound(_) => "PLAN_NOT_FOUND",
            Self::StaleVersion(_) => "STALE_VERSION",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidPlanInput(_)
            | Self::DuplicateRuleTrigger(_)
            | Self::InvalidRuleAmount { .. }
            | Self::InvalidTriggerInput(_) => ErrorCategory::Validation,
            Self::InvalidTransition { .. } => ErrorCategory::StateMachine,
            Self::CommissionNotFound(_) | Self::PlanNotFound(_) => ErrorCategory::NotFound,
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
