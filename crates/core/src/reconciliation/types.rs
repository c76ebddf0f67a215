//! Reconciliation types.

use chrono::{DateTime, NaiveDate, Utc};
use mizan_shared::{IssueId, ReconciliationId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Largest expected/actual difference that does not raise an issue.
pub const RECONCILIATION_TOLERANCE_MINOR: i64 = 1;

/// Net base movement per category (leaf account code), minor units.
pub type CategoryTotals = BTreeMap<String, i64>;

/// Issue lifecycle: Open → Resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueStatus {
    /// Awaiting investigation.
    Open,
    /// Closed with a resolution note.
    Resolved,
}

impl IssueStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Resolved => "resolved",
        }
    }

    /// Parses a status from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "open" => Some(Self::Open),
            "resolved" => Some(Self::Resolved),
            _ => None,
        }
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A category whose expected and actual totals disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discrepancy {
    /// Account code.
    pub category: String,
    /// Ledger-derived total.
    pub expected: i64,
    /// Reported total.
    pub actual: i64,
    /// `expected - actual`.
    pub difference: i64,
}

/// A discrepancy under investigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationIssue {
    /// Issue ID.
    pub id: IssueId,
    /// Owning reconciliation.
    pub reconciliation_id: ReconciliationId,
    /// Account code.
    pub category: String,
    /// Ledger-derived total.
    pub expected: i64,
    /// Reported total.
    pub actual: i64,
    /// `expected - actual`.
    pub difference: i64,
    /// Human-readable summary.
    pub description: String,
    /// Current status.
    pub status: IssueStatus,
    /// Resolution note.
    pub resolution: Option<String>,
    /// Resolution timestamp.
    pub resolved_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Expected against actual totals for one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    /// Reconciliation ID.
    pub id: ReconciliationId,
    /// First day covered.
    pub period_start: NaiveDate,
    /// Last day covered.
    pub period_end: NaiveDate,
    /// Ledger-derived totals at opening time.
    pub expected_totals: CategoryTotals,
    /// Reported totals, once imported.
    pub actual_totals: Option<CategoryTotals>,
    /// Issues raised by the import.
    pub issues: Vec<ReconciliationIssue>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
