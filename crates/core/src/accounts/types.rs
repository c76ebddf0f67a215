//! Chart of accounts domain types.

use chrono::{DateTime, Utc};
use mizan_shared::AccountId;
use serde::{Deserialize, Serialize};

/// A node of the chart of accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account ID.
    pub id: AccountId,
    /// Unique account code, e.g. `1-1-02`.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Parent account; fixed at creation.
    pub parent_id: Option<AccountId>,
    /// Inactive accounts reject new journal lines.
    pub is_active: bool,
    /// Optimistic-lock version.
    pub version: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an account.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAccountInput {
    /// Account code (unique across the chart).
    pub code: String,
    /// Account name.
    pub name: String,
    /// Parent account, if any.
    pub parent_id: Option<AccountId>,
}

/// Input for updating an account.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAccountInput {
    /// New name.
    pub name: Option<String>,
    /// New active flag.
    pub is_active: Option<bool>,
    /// Version the caller last read; mismatches fail with `StaleVersion`.
    pub expected_version: Option<i64>,
}

/// An account with its ordered children, as returned by the tree read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountNode {
    /// The account itself.
    #[serde(flatten)]
    pub account: Account,
    /// True if the account has no children.
    pub is_leaf: bool,
    /// Children ordered by code.
    pub children: Vec<AccountNode>,
}

/// Posted base-currency totals for an account (and its descendants).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccountBalance {
    /// Account the balance belongs to.
    pub account_id: AccountId,
    /// Sum of posted base debits, minor units.
    pub debit: i64,
    /// Sum of posted base credits, minor units.
    pub credit: i64,
}

impl AccountBalance {
    /// Net balance, debit minus credit.
    #[must_use]
    pub const fn net(&self) -> i64 {
        self.debit - self.credit
    }
}
