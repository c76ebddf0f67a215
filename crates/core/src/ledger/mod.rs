//! Double-entry bookkeeping logic.
//!
//! - Voucher and line types
//! - Validation and base-currency resolution of staged vouchers
//! - Posting, reversal and discard guards
//! - Voucher numbering

pub mod error;
pub mod numbering;
pub mod reversal;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::LedgerError;
pub use numbering::VoucherNumber;
pub use reversal::{ReversalDraft, ReversalService};
pub use service::LedgerService;
pub use types::{
    AccountInfo, BALANCE_TOLERANCE_MINOR, JournalLine, JournalLineInput, JournalVoucher,
    StageVoucherInput, VoucherFilter, VoucherLinks, VoucherStatus, VoucherTotals,
};
