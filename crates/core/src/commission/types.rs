//! Commission plan and commission types.

use chrono::{DateTime, NaiveDate, Utc};
use mizan_shared::{CommissionId, CommissionPlanId, EntityId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of party a commission or settlement is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BeneficiaryType {
    /// Delivery driver.
    Driver,
    /// Store on the marketplace.
    Store,
    /// Marketer referring stores or customers.
    Marketer,
}

impl BeneficiaryType {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Driver => "driver",
            Self::Store => "store",
            Self::Marketer => "marketer",
        }
    }

    /// Parses a beneficiary type from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "driver" => Some(Self::Driver),
            "store" => Some(Self::Store),
            "marketer" => Some(Self::Marketer),
            _ => None,
        }
    }
}

impl fmt::Display for BeneficiaryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Commission lifecycle.
///
/// - Pending → Approved (approve)
/// - Pending | Approved → Cancelled (cancel)
/// - Pending | Approved → Paid (payout completion)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommissionStatus {
    /// Created by a trigger, awaiting review.
    Pending,
    /// Reviewed and payable.
    Approved,
    /// Paid out by a completed batch (terminal).
    Paid,
    /// Withdrawn before payment (terminal).
    Cancelled,
}

impl CommissionStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Paid => "paid",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a status from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "paid" => Some(Self::Paid),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns true for `Paid` and `Cancelled`.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Paid | Self::Cancelled)
    }
}

impl fmt::Display for CommissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A plan rule: a fixed base-currency amount paid when `trigger` fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionRule {
    /// Event name, e.g. `store_approved`.
    pub trigger: String,
    /// Amount in base minor units.
    pub amount: i64,
    /// Restricts the rule to one kind of beneficiary.
    #[serde(default)]
    pub beneficiary_type: Option<BeneficiaryType>,
}

impl CommissionRule {
    /// True if the rule pays `beneficiary_type` when `event_name` fires.
    #[must_use]
    pub fn matches(&self, event_name: &str, beneficiary_type: BeneficiaryType) -> bool {
        self.trigger == event_name
            && self.beneficiary_type.is_none_or(|t| t == beneficiary_type)
    }
}

/// A commission plan with its rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionPlan {
    /// Plan ID.
    pub id: CommissionPlanId,
    /// Display name.
    pub name: String,
    /// Only active plans are evaluated.
    pub active: bool,
    /// Rules, unique by trigger.
    pub rules: Vec<CommissionRule>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Optimistic-lock version.
    pub version: i64,
}

/// Input for creating a plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlanInput {
    /// Display name.
    pub name: String,
    /// Whether the plan starts active.
    #[serde(default = "default_active")]
    pub active: bool,
    /// Rules.
    pub rules: Vec<CommissionRule>,
}

const fn default_active() -> bool {
    true
}

/// A party named by a trigger event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Beneficiary {
    /// The party.
    pub id: EntityId,
    /// What kind of party.
    #[serde(rename = "type")]
    pub beneficiary_type: BeneficiaryType,
}

/// Context delivered with a trigger event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerContext {
    /// Order the event concerns, if any.
    #[serde(default)]
    pub source_order_id: Option<String>,
    /// Parties to evaluate rules for.
    #[serde(default)]
    pub beneficiaries: Vec<Beneficiary>,
}

/// Idempotency key of one beneficiary's share of a trigger delivery.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TriggerKey {
    /// Event name.
    pub event_name: String,
    /// Source order, empty when the event has none.
    pub source_order_key: String,
    /// The beneficiary.
    pub beneficiary_id: EntityId,
}

impl TriggerKey {
    /// Key for `beneficiary_id`'s share of an event.
    #[must_use]
    pub fn new(event_name: &str, source_order_id: Option<&str>, beneficiary_id: EntityId) -> Self {
        Self {
            event_name: event_name.to_string(),
            source_order_key: source_order_id.unwrap_or_default().to_string(),
            beneficiary_id,
        }
    }
}

/// A commission about to be created by a trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCommission {
    /// Plan whose rule matched.
    pub plan_id: CommissionPlanId,
    /// Matching trigger.
    pub trigger: String,
    /// Amount in base minor units.
    pub amount: i64,
    /// Who earns it.
    pub beneficiary: Beneficiary,
    /// Order the event concerns.
    pub source_order_id: Option<String>,
}

/// A commission owed to a beneficiary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commission {
    /// Commission ID.
    pub id: CommissionId,
    /// Who earns it.
    pub beneficiary_id: EntityId,
    /// What kind of party earns it.
    pub beneficiary_type: BeneficiaryType,
    /// Amount in base minor units.
    pub amount: i64,
    /// Order the triggering event concerned.
    pub source_order_id: Option<String>,
    /// Triggering event name.
    pub trigger: String,
    /// Plan whose rule produced it.
    pub plan_id: CommissionPlanId,
    /// Current status.
    pub status: CommissionStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Optimistic-lock version.
    pub version: i64,
}

/// Filter options for listing commissions.
#[derive(Debug, Clone, Default)]
pub struct CommissionFilter {
    /// Filter by status.
    pub status: Option<CommissionStatus>,
    /// Filter by beneficiary.
    pub beneficiary_id: Option<EntityId>,
    /// Filter by beneficiary type.
    pub beneficiary_type: Option<BeneficiaryType>,
    /// Created on or after this date.
    pub date_from: Option<NaiveDate>,
    /// Created on or before this date.
    pub date_to: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_matching() {
        let any = CommissionRule {
            trigger: "order_delivered".to_string(),
            amount: 500,
            beneficiary_type: None,
        };
        let drivers_only = CommissionRule {
            beneficiary_type: Some(BeneficiaryType::Driver),
            ..any.clone()
        };

        assert!(any.matches("order_delivered", BeneficiaryType::Store));
        assert!(!any.matches("store_approved", BeneficiaryType::Store));
        assert!(drivers_only.matches("order_delivered", BeneficiaryType::Driver));
        assert!(!drivers_only.matches("order_delivered", BeneficiaryType::Marketer));
    }

    #[test]
    fn test_trigger_key_without_order() {
        let id = EntityId::new();
        let key = TriggerKey::new("store_approved", None, id);
        assert_eq!(key.source_order_key, "");
        assert_eq!(key, TriggerKey::new("store_approved", Some(""), id));
        assert_ne!(key, TriggerKey::new("store_approved", Some("ORD-1"), id));
    }

    #[test]
    fn test_beneficiary_wire_shape() {
        let json = r#"{"id":"0190a0a0-0000-7000-8000-000000000009","type":"store"}"#;
        let b: Beneficiary = serde_json::from_str(json).unwrap();
        assert_eq!(b.beneficiary_type, BeneficiaryType::Store);
    }

    #[test]
    fn test_status_terminal() {
        assert!(CommissionStatus::Paid.is_terminal());
        assert!(CommissionStatus::Cancelled.is_terminal());
        assert!(!CommissionStatus::Approved.is_terminal());
        assert_eq!(CommissionStatus::parse("CANCELLED"), Some(CommissionStatus::Cancelled));
    }
}
