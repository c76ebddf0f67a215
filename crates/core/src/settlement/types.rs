//! Settlement types.

use chrono::{DateTime, NaiveDate, Utc};
use mizan_shared::{CommissionId, EntityId, SettlementId, VoucherId};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::commission::BeneficiaryType;

/// Settlement lifecycle: Draft → Approved → Paid, one way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementStatus {
    /// Computed, awaiting approval.
    Draft,
    /// Approved and posted to the ledger.
    Approved,
    /// Paid out by a completed batch.
    Paid,
}

impl SettlementStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Approved => "approved",
            Self::Paid => "paid",
        }
    }

    /// Parses a status from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "approved" => Some(Self::Approved),
            "paid" => Some(Self::Paid),
            _ => None,
        }
    }
}

impl fmt::Display for SettlementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    /// First day.
    pub start: NaiveDate,
    /// Last day.
    pub end: NaiveDate,
}

impl Period {
    /// True if the two ranges share at least one day.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// True if `date` falls within the range.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A settlement of one beneficiary's earnings over a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    /// Settlement ID.
    pub id: SettlementId,
    /// The party being settled.
    pub entity_id: EntityId,
    /// What kind of party.
    pub entity_model: BeneficiaryType,
    /// First day covered.
    pub period_start: NaiveDate,
    /// Last day covered.
    pub period_end: NaiveDate,
    /// Amount owed in base minor units.
    pub expected_total: i64,
    /// Commissions claimed by this settlement.
    pub commission_ids: Vec<CommissionId>,
    /// Current status.
    pub status: SettlementStatus,
    /// Voucher posted on approval.
    pub voucher_id: Option<VoucherId>,
    /// Approval timestamp.
    pub approved_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Optimistic-lock version.
    pub version: i64,
}

impl Settlement {
    /// The covered range.
    #[must_use]
    pub const fn period(&self) -> Period {
        Period {
            start: self.period_start,
            end: self.period_end,
        }
    }
}

/// Input for creating a settlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSettlementInput {
    /// The party being settled.
    pub entity_id: EntityId,
    /// What kind of party.
    pub entity_model: BeneficiaryType,
    /// First day covered.
    pub period_start: NaiveDate,
    /// Last day covered.
    pub period_end: NaiveDate,
}

/// Filter options for listing settlements.
#[derive(Debug, Clone, Default)]
pub struct SettlementFilter {
    /// Filter by status.
    pub status: Option<SettlementStatus>,
    /// Filter by party.
    pub entity_id: Option<EntityId>,
    /// Settlements ending on or after this date.
    pub date_from: Option<NaiveDate>,
    /// Settlements starting on or before this date.
    pub date_to: Option<NaiveDate>,
}
