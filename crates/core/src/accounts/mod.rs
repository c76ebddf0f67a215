//! Chart of accounts.
//!
//! Accounts form a forest keyed by id with an explicit `parent_id`; the
//! parent to children index is rebuilt on every read. Only active leaves
//! accept journal lines.

pub mod error;
pub mod service;
pub mod tree;
pub mod types;

#[cfg(test)]
mod tree_props;

pub use error::AccountError;
pub use service::{AccountService, ParentState};
pub use tree::AccountTree;
pub use types::{Account, AccountBalance, AccountNode, CreateAccountInput, UpdateAccountInput};
