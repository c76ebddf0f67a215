//! Journal voucher domain types.
//!
//! All amounts are integer minor units. Line amounts are in the line's own
//! currency; `base_*` amounts are in the deployment's base currency.

use chrono::{DateTime, NaiveDate, Utc};
use mizan_shared::{AccountId, Currency, EntityId, SettlementId, VoucherId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest base-currency difference between debits and credits that still
/// counts as balanced. Absorbs per-line rounding of `rate` multiplication.
pub const BALANCE_TOLERANCE_MINOR: i64 = 1;

/// Voucher lifecycle: staged as `Draft`, immutable once `Posted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoucherStatus {
    /// Staged and validated, not yet part of the books.
    Draft,
    /// Committed to the books (immutable).
    Posted,
}

impl VoucherStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Posted => "posted",
        }
    }

    /// Parses a status from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "posted" => Some(Self::Posted),
            _ => None,
        }
    }
}

impl fmt::Display for VoucherStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_rate() -> Decimal {
    Decimal::ONE
}

/// Input line for staging a voucher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalLineInput {
    /// Leaf account receiving the line.
    pub account_id: AccountId,
    /// Debit in minor units of `currency` (0 if credit).
    #[serde(default)]
    pub debit: i64,
    /// Credit in minor units of `currency` (0 if debit).
    #[serde(default)]
    pub credit: i64,
    /// Currency of the line amounts.
    pub currency: Currency,
    /// Multiplier into the base currency.
    #[serde(default = "default_rate")]
    pub rate: Decimal,
    /// Party the movement concerns (driver, store, marketer).
    #[serde(default)]
    pub entity_id: Option<EntityId>,
    /// Optional memo.
    #[serde(default)]
    pub memo: Option<String>,
}

impl JournalLineInput {
    /// Debit line at rate 1.
    #[must_use]
    pub const fn debit(account_id: AccountId, amount: i64, currency: Currency) -> Self {
        Self {
            account_id,
            debit: amount,
            credit: 0,
            currency,
            rate: Decimal::ONE,
            entity_id: None,
            memo: None,
        }
    }

    /// Credit line at rate 1.
    #[must_use]
    pub const fn credit(account_id: AccountId, amount: i64, currency: Currency) -> Self {
        Self {
            account_id,
            debit: 0,
            credit: amount,
            currency,
            rate: Decimal::ONE,
            entity_id: None,
            memo: None,
        }
    }

    /// Sets the conversion rate.
    #[must_use]
    pub const fn with_rate(mut self, rate: Decimal) -> Self {
        self.rate = rate;
        self
    }

    /// Tags the line with a party.
    #[must_use]
    pub const fn with_entity(mut self, entity_id: EntityId) -> Self {
        self.entity_id = Some(entity_id);
        self
    }

    /// Sets the memo.
    #[must_use]
    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }
}

/// Input for staging a voucher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageVoucherInput {
    /// Accounting date; decides the numbering period.
    pub date: NaiveDate,
    /// Description.
    pub description: String,
    /// External reference (order number, statement id, ...).
    #[serde(default)]
    pub reference: Option<String>,
    /// The lines.
    pub lines: Vec<JournalLineInput>,
}

/// Links recorded on vouchers produced by other operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoucherLinks {
    /// Set on reversal vouchers.
    pub reverses: Option<VoucherId>,
    /// Set on vouchers produced by settlement approval.
    pub settlement_id: Option<SettlementId>,
}

/// A validated journal line with its base-currency amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    /// 1-based position within the voucher.
    pub line_no: i32,
    /// Leaf account receiving the line.
    pub account_id: AccountId,
    /// Debit in minor units of `currency`.
    pub debit: i64,
    /// Credit in minor units of `currency`.
    pub credit: i64,
    /// Currency of `debit`/`credit`.
    pub currency: Currency,
    /// Multiplier into the base currency.
    pub rate: Decimal,
    /// Converted debit, base minor units.
    pub base_debit: i64,
    /// Converted credit, base minor units.
    pub base_credit: i64,
    /// Party tag.
    pub entity_id: Option<EntityId>,
    /// Memo.
    pub memo: Option<String>,
}

/// Base-currency totals of a voucher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct VoucherTotals {
    /// Sum of base debits.
    pub base_debit: i64,
    /// Sum of base credits.
    pub base_credit: i64,
}

impl VoucherTotals {
    /// Debit minus credit.
    #[must_use]
    pub const fn delta(&self) -> i64 {
        self.base_debit - self.base_credit
    }

    /// True if the difference is within `BALANCE_TOLERANCE_MINOR`.
    #[must_use]
    pub const fn is_balanced(&self) -> bool {
        self.delta().abs() <= BALANCE_TOLERANCE_MINOR
    }
}

/// A journal voucher with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalVoucher {
    /// Internal ID.
    pub id: VoucherId,
    /// Human-readable number, sequential per period (`JV-YYYYMM-NNNNNN`).
    pub voucher_number: String,
    /// Accounting date.
    pub date: NaiveDate,
    /// Description.
    pub description: String,
    /// External reference.
    pub reference: Option<String>,
    /// Current status.
    pub status: VoucherStatus,
    /// Voucher this one reverses.
    pub reverses_voucher_id: Option<VoucherId>,
    /// Settlement whose approval produced this voucher.
    pub settlement_id: Option<SettlementId>,
    /// Lines in order.
    pub lines: Vec<JournalLine>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Posting timestamp.
    pub posted_at: Option<DateTime<Utc>>,
    /// Optimistic-lock version.
    pub version: i64,
}

impl JournalVoucher {
    /// Base totals over the stored lines.
    #[must_use]
    pub fn totals(&self) -> VoucherTotals {
        VoucherTotals {
            base_debit: self.lines.iter().map(|l| l.base_debit).sum(),
            base_credit: self.lines.iter().map(|l| l.base_credit).sum(),
        }
    }
}

/// What validation needs to know about an account.
#[derive(Debug, Clone, Copy)]
pub struct AccountInfo {
    /// The account ID.
    pub id: AccountId,
    /// Whether the account is active.
    pub is_active: bool,
    /// Whether the account has no children.
    pub is_leaf: bool,
}

/// Filter options for listing vouchers.
#[derive(Debug, Clone, Default)]
pub struct VoucherFilter {
    /// Filter by status.
    pub status: Option<VoucherStatus>,
    /// Inclusive lower bound on the voucher date.
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound on the voucher date.
    pub date_to: Option<NaiveDate>,
}
