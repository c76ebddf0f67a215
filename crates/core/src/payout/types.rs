//! Payout batch types.

use chrono::{DateTime, Utc};
use mizan_shared::PayoutBatchId;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::commission::CommissionStatus;
use crate::settlement::SettlementStatus;

/// Batch lifecycle: Created → Approved → Completed, one way, no skipping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    /// Items snapshotted, awaiting approval.
    Created,
    /// Approved for payment.
    Approved,
    /// Every item processed (terminal).
    Completed,
}

impl BatchStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Approved => "approved",
            Self::Completed => "completed",
        }
    }

    /// Parses a status from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "created" => Some(Self::Created),
            "approved" => Some(Self::Approved),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a batch item pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemSource {
    /// A single commission.
    Commission,
    /// An approved settlement and the commissions it claims.
    Settlement,
}

impl ItemSource {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Commission => "commission",
            Self::Settlement => "settlement",
        }
    }
}

impl fmt::Display for ItemSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What completion did with an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemOutcome {
    /// Source marked paid.
    Paid,
    /// Source was no longer payable; nothing was paid.
    Skipped,
}

impl ItemOutcome {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Paid => "paid",
            Self::Skipped => "skipped",
        }
    }
}

/// Requested batch item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PayoutItemInput {
    /// Source kind.
    pub source: ItemSource,
    /// Commission or settlement ID.
    pub source_id: Uuid,
}

/// A batch item with its snapshotted amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutItem {
    /// Source kind.
    pub source: ItemSource,
    /// Commission or settlement ID.
    pub source_id: Uuid,
    /// Amount at batch creation, base minor units.
    pub amount: i64,
    /// When completion processed the item.
    pub paid_at: Option<DateTime<Utc>>,
    /// What completion did.
    pub outcome: Option<ItemOutcome>,
}

/// A payout batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutBatch {
    /// Batch ID.
    pub id: PayoutBatchId,
    /// Items, fixed at creation.
    pub items: Vec<PayoutItem>,
    /// Current status.
    pub status: BatchStatus,
    /// Sum of item amounts.
    pub total: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Approval timestamp.
    pub approved_at: Option<DateTime<Utc>>,
    /// Completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
    /// Optimistic-lock version.
    pub version: i64,
}

/// Current state of an item's source record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceState {
    /// A commission and its status.
    Commission(CommissionStatus),
    /// A settlement and the statuses of the commissions it claims.
    Settlement {
        /// Settlement status.
        status: SettlementStatus,
        /// Claimed commission statuses.
        commissions: Vec<CommissionStatus>,
    },
}

/// What completion has to do for a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionPlan {
    /// Process the remaining items, then flip the batch.
    Process,
    /// Already completed; return the stored batch.
    AlreadyCompleted,
}

/// Filter options for listing batches.
#[derive(Debug, Clone, Default)]
pub struct BatchFilter {
    /// Filter by status.
    pub status: Option<BatchStatus>,
}
