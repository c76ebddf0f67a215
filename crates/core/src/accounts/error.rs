//! Chart of accounts errors.

use mizan_shared::{AccountId, ErrorCategory};
use thiserror::Error;

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    // ========== Validation Errors ==========
    /// Code or name is empty or malformed.
    #[error("Invalid account input: {0}")]
    InvalidAccountInput(String),

    /// Account code already exists.
    #[error("Account code '{0}' already exists")]
    DuplicateCode(String),

    /// Parent is missing, inactive, or already carries journal lines.
    #[error("Invalid parent account {parent_id}: {reason}")]
    InvalidParent {
        /// The requested parent.
        parent_id: AccountId,
        /// Why the parent was rejected.
        reason: &'static str,
    },

    // ========== Invariant Errors ==========
    /// Leaf still holds a posted balance and cannot be deactivated.
    #[error("Account {account_id} has a posted balance of {balance} minor units")]
    AccountHasBalance {
        /// The account.
        account_id: AccountId,
        /// Net posted balance in base minor units.
        balance: i64,
    },

    // ========== State Errors ==========
    /// Account (or a descendant) is referenced by journal lines.
    #[error("Account {0} is referenced by journal lines")]
    AccountInUse(AccountId),

    /// Account still has children.
    #[error("Account {0} has child accounts")]
    AccountHasChildren(AccountId),

    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    // ========== Concurrency Errors ==========
    /// Account was modified since the caller read it.
    #[error("Account {0} was modified concurrently, please retry")]
    StaleVersion(AccountId),

    // ========== Database Errors ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl AccountError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAccountInput(_) => "INVALID_ACCOUNT_INPUT",
            Self::DuplicateCode(_) => "DUPLICATE_CODE",
            Self::InvalidParent { .. } => "INVALID_PARENT",
            Self::AccountHasBalance { .. } => "ACCOUNT_HAS_BALANCE",
            Self::AccountInUse(_) => "ACCOUNT_IN_USE",
            Self::AccountHasChildren(_) => "ACCOUNT_HAS_CHILDREN",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::StaleVersion(_) => "STALE_VERSION",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidAccountInput(_) | Self::DuplicateCode(_) | Self::InvalidParent { .. } => {
                ErrorCategory::Validation
            }
            Self::AccountHasBalance { .. } => ErrorCategory::Invariant,
            Self::AccountInUse(_) | Self::AccountHasChildren(_) => ErrorCategory::StateMachine,
            Self::AccountNotFound(_) => ErrorCategory::NotFound,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_and_status() {
        let id = AccountId::new();
        assert_eq!(AccountError::DuplicateCode("4-1".into()).error_code(), "DUPLICATE_CODE");
        assert_eq!(AccountError::DuplicateCode("4-1".into()).http_status_code(), 400);
        assert_eq!(
            AccountError::AccountHasBalance { account_id: id, balance: 10 }.http_status_code(),
            422
        );
        assert_eq!(AccountError::AccountInUse(id).http_status_code(), 409);
        assert_eq!(AccountError::AccountNotFound(id).http_status_code(), 404);
        assert!(AccountError::StaleVersion(id).is_retryable());
        assert!(!AccountError::AccountHasChildren(id).is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = AccountError::DuplicateCode("2-1".to_string());
        assert_eq!(err.to_string(), "Account code '2-1' already exists");
    }
}
