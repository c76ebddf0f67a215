//! Core finance logic for Mizan.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and state transitions live here.
//!
//! # Modules
//!
//! - `accounts` - Chart of accounts tree and mutation rules
//! - `currency` - Conversion of line amounts into the base currency
//! - `ledger` - Double-entry journal vouchers
//! - `commission` - Commission plans and trigger evaluation
//! - `settlement` - Per-entity settlements and their approval voucher
//! - `payout` - Payout batch lifecycle
//! - `reconciliation` - Expected against reported totals

pub mod accounts;
pub mod commission;
pub mod currency;
pub mod ledger;
pub mod payout;
pub mod reconciliation;
pub mod settlement;
