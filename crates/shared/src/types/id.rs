//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `CommissionId` where a `SettlementId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random ID using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

typed_id!(AccountId, "Unique identifier for a chart of accounts node.");
typed_id!(VoucherId, "Unique identifier for a journal voucher.");
typed_id!(CommissionPlanId, "Unique identifier for a commission plan.");
typed_id!(CommissionId, "Unique identifier for a commission.");
typed_id!(SettlementId, "Unique identifier for a settlement.");
typed_id!(PayoutBatchId, "Unique identifier for a payout batch.");
typed_id!(ReconciliationId, "Unique identifier for a reconciliation.");
typed_id!(IssueId, "Unique identifier for a reconciliation issue.");
typed_id!(
    EntityId,
    "Identifier of a marketplace party (driver, store, or marketer)."
);
