//! Ledger error types for validation and state errors.

use mizan_shared::{AccountId, ErrorCategory, VoucherId};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::currency::CurrencyError;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Voucher must have at least 2 lines.
    #[error("Voucher must have at least 2 lines")]
    InsufficientLines,

    /// Exactly one of debit/credit must be positive on every line.
    #[error("Line {line} is malformed: {reason}")]
    MalformedLine {
        /// 1-based line number.
        line: usize,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// Line rate could not be applied.
    #[error("Line {line}: {source}")]
    Conversion {
        /// 1-based line number.
        line: usize,
        /// Underlying conversion error.
        #[source]
        source: CurrencyError,
    },

    /// Header fields are invalid.
    #[error("Invalid voucher input: {0}")]
    InvalidVoucherInput(String),

    /// Sums overflowed 64-bit minor units.
    #[error("Voucher amounts overflow")]
    AmountOverflow,

    // ========== Invariant Errors ==========
    /// Debits and credits differ by more than the tolerance.
    #[error("Voucher is not balanced. Debit: {debit}, Credit: {credit}, Delta: {delta}")]
    UnbalancedVoucher {
        /// Debit minus credit, base currency major units.
        delta: Decimal,
        /// Total base debit, major units.
        debit: Decimal,
        /// Total base credit, major units.
        credit: Decimal,
    },

    /// Account is not an active leaf.
    #[error("Account {account_id} is not postable: {reason}")]
    NonPostableAccount {
        /// The account.
        account_id: AccountId,
        /// Why it cannot receive lines.
        reason: &'static str,
    },

    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    // ========== Voucher State Errors ==========
    /// Voucher is already posted.
    #[error("Voucher {0} is already posted")]
    AlreadyPosted(VoucherId),

    /// Only posted vouchers can be reversed.
    #[error("Voucher {0} is not posted")]
    NotPosted(VoucherId),

    /// A reversal for this voucher already exists.
    #[error("Voucher {0} has already been reversed")]
    AlreadyReversed(VoucherId),

    /// Voucher not found.
    #[error("Voucher not found: {0}")]
    VoucherNotFound(String),

    // ========== Concurrency Errors ==========
    /// Voucher changed since it was read.
    #[error("Voucher {0} was modified concurrently, please retry")]
    StaleVersion(VoucherId),

    // ========== Database Errors ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientLines => "INSUFFICIENT_LINES",
            Self::MalformedLine { .. } => "MALFORMED_LINE",
            Self::Conversion { source, .. } => source.error_code(),
            Self::InvalidVoucherInput(_) => "INVALID_VOUCHER_INPUT",
            Self::AmountOverflow => "AMOUNT_OVERFLOW",
            Self::UnbalancedVoucher { .. } => "UNBALANCED_VOUCHER",
            Self::NonPostableAccount { .. } => "NON_POSTABLE_ACCOUNT",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::AlreadyPosted(_) => "ALREADY_POSTED",
            Self::NotPosted(_) => "NOT_POSTED",
            Self::AlreadyReversed(_) => "ALREADY_REVERSED",
            Self::VoucherNotFound(_) => "VOUCHER_NOT_FOUND",
            Self::StaleVersion(_) => "STALE_VERSION",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::InsufficientLines
            | Self::MalformedLine { .. }
            | Self::Conversion { .. }
            | Self::InvalidVoucherInput(_)
            | Self::AmountOverflow => ErrorCategory::Validation,
            Self::UnbalancedVoucher { .. } | Self::NonPostableAccount { .. } => {
                ErrorCategory::Invariant
            }
            // A line naming an unknown account is an input problem, not a missing resource.
            Self::AccountNotFound(_) => ErrorCategory::Validation,
            Self::AlreadyPosted(_) | Self::NotPosted(_) | Self::AlreadyReversed(_) => {
                ErrorCategory::StateMachine
            }
            Self::VoucherNotFound(_) => ErrorCategory::NotFound,
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
