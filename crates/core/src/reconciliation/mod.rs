//! Reconciliation of ledger totals against external statements.

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::ReconciliationError;
pub use service::ReconciliationService;
pub use types::{
    CategoryTotals, Discrepancy, IssueStatus, RECONCILIATION_TOLERANCE_MINOR, Reconciliation,
    ReconciliationIssue,
};
