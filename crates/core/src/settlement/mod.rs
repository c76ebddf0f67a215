//! Settlements: per-entity, per-period aggregation of earnings with an
//! approval step that posts to the ledger.

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::SettlementError;
pub use service::{SettlementAccounts, SettlementService};
pub use types::{CreateSettlementInput, Period, Settlement, SettlementFilter, SettlementStatus};
