//! `SeaORM` entity definitions, one module per table.
#![allow(missing_docs)]

pub mod sea_orm_active_enums;

pub mod accounts;
pub mod commission_plans;
pub mod commission_rules;
pub mod commissions;
pub mod entity_settlement_guards;
pub mod journal_lines;
pub mod journal_vouchers;
pub mod payout_batch_items;
pub mod payout_batches;
pub mod reconciliation_issues;
pub mod reconciliation_totals;
pub mod reconciliations;
pub mod settlement_commissions;
pub mod settlements;
pub mod trigger_receipts;
pub mod voucher_sequences;
