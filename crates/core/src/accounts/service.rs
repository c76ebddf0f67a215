//! Chart of accounts rules.
//!
//! Stateless checks applied by the account repository inside the same
//! database transaction as the mutation they guard.

use mizan_shared::AccountId;

use super::error::AccountError;
use super::types::{CreateAccountInput, UpdateAccountInput};

/// Longest accepted account code.
pub const MAX_CODE_LEN: usize = 32;

/// What the registry knows about a prospective or current parent.
#[derive(Debug, Clone, Copy)]
pub struct ParentState {
    /// The parent account.
    pub id: AccountId,
    /// Whether the parent is active.
    pub is_active: bool,
    /// Whether journal lines already reference the parent.
    pub has_lines: bool,
}

/// Stateless service for account rules.
pub struct AccountService;

impl AccountService {
    /// Validates and normalizes a create request.
    ///
    /// Returns the trimmed input.
    pub fn validate_create(input: CreateAccountInput) -> Result<CreateAccountInput, AccountError> {
        let code = input.code.trim().to_string();
        if code.is_empty() {
            return Err(AccountError::InvalidAccountInput("code is required".into()));
        }
        if code.len() > MAX_CODE_LEN {
            return Err(AccountError::InvalidAccountInput(format!(
                "code must be at most {MAX_CODE_LEN} characters"
            )));
        }
        if code.chars().any(char::is_whitespace) {
            return Err(AccountError::InvalidAccountInput(
                "code must not contain whitespace".into(),
            ));
        }
        let name = Self::validate_name(&input.name)?;

        Ok(CreateAccountInput {
            code,
            name,
            parent_id: input.parent_id,
        })
    }

    /// Trims and checks an account name.
    pub fn validate_name(name: &str) -> Result<String, AccountError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AccountError::InvalidAccountInput("name is required".into()));
        }
        Ok(name.to_string())
    }

    /// A parent must exist, be active, and not already carry journal lines
    /// (a leaf with lines gaining a child would leave lines on a non-leaf).
    pub fn validate_parent(
        requested: AccountId,
        parent: Option<ParentState>,
    ) -> Result<(), AccountError> {
        match parent {
            None => Err(AccountError::InvalidParent {
                parent_id: requested,
                reason: "parent does not exist",
            }),
            Some(p) if !p.is_active => Err(AccountError::InvalidParent {
                parent_id: p.id,
                reason: "parent is inactive",
            }),
            Some(p) if p.has_lines => Err(AccountError::InvalidParent {
                parent_id: p.id,
                reason: "parent already has journal lines",
            }),
            Some(_) => Ok(()),
        }
    }

    /// Checks the caller's expected version, if one was supplied.
    pub fn check_version(
        id: AccountId,
        input: &UpdateAccountInput,
        current: i64,
    ) -> Result<(), AccountError> {
        match input.expected_version {
            Some(expected) if expected != current => Err(AccountError::StaleVersion(id)),
            _ => Ok(()),
        }
    }

    /// Deactivating a leaf requires a zero posted balance. A non-leaf is
    /// deactivated on its own; its children keep their flag.
    pub fn validate_deactivation(
        id: AccountId,
        is_leaf: bool,
        posted_balance: i64,
    ) -> Result<(), AccountError> {
        if is_leaf && posted_balance != 0 {
            return Err(AccountError::AccountHasBalance {
                account_id: id,
                balance: posted_balance,
            });
        }
        Ok(())
    }

    /// Re-activation requires an active parent, mirroring creation.
    pub fn validate_activation(parent: Option<ParentState>) -> Result<(), AccountError> {
        match parent {
            Some(p) if !p.is_active => Err(AccountError::InvalidParent {
                parent_id: p.id,
                reason: "parent is inactive",
            }),
            _ => Ok(()),
        }
    }

    /// Deletion rules: lines anywhere in the subtree win over children.
    pub fn validate_delete(
        id: AccountId,
        subtree_line_count: u64,
        child_count: u64,
    ) -> Result<(), AccountError> {
        if subtree_line_count > 0 {
            return Err(AccountError::AccountInUse(id));
        }
        if child_count > 0 {
            return Err(AccountError::AccountHasChildren(id));
        }
        Ok(())
    }
}
