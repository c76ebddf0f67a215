//! `SeaORM` active enums, stored as short strings so the schema stays
//! portable between PostgreSQL and SQLite.

use mizan_core::{commission, ledger, payout, reconciliation, settlement};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum VoucherStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "posted")]
    Posted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum BeneficiaryType {
    #[sea_orm(string_value = "driver")]
    Driver,
    #[sea_orm(string_value = "store")]
    Store,
    #[sea_orm(string_value = "marketer")]
    Marketer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum CommissionStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum SettlementStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "paid")]
    Paid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum BatchStatus {
    #[sea_orm(string_value = "created")]
    Created,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "completed")]
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ItemSource {
    #[sea_orm(string_value = "commission")]
    Commission,
    #[sea_orm(string_value = "settlement")]
    Settlement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ItemOutcome {
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "skipped")]
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum IssueStatus {
    #[sea_orm(string_value = "open")]
    Open,
    #[sea_orm(string_value = "resolved")]
    Resolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
pub enum TotalsKind {
    #[sea_orm(string_value = "expected")]
    Expected,
    #[sea_orm(string_value = "actual")]
    Actual,
}

/// Maps a database enum onto its domain twin, both ways.
macro_rules! mirror_enum {
    ($db:ident, $($core:ident)::+, [$($variant:ident),+ $(,)?]) => {
        impl From<$db> for $($core)::+ {
            fn from(value: $db) -> Self {
                match value {
                    $($db::$variant => Self::$variant,)+
                }
            }
        }

        impl From<$($core)::+> for $db {
            fn from(value: $($core)::+) -> Self {
                match value {
                    $($($core)::+::$variant => Self::$variant,)+
                }
            }
        }
    };
}

mirror_enum!(VoucherStatus, ledger::VoucherStatus, [Draft, Posted]);
mirror_enum!(BeneficiaryType, commission::BeneficiaryType, [Driver, Store, Marketer]);
mirror_enum!(CommissionStatus, commission::CommissionStatus, [Pending, Approved, Paid, Cancelled]);
mirror_enum!(SettlementStatus, settlement::SettlementStatus, [Draft, Approved, Paid]);
mirror_enum!(BatchStatus, payout::BatchStatus, [Created, Approved, Completed]);
mirror_enum!(ItemSource, payout::ItemSource, [Commission, Settlement]);
mirror_enum!(ItemOutcome, payout::ItemOutcome, [Paid, Skipped]);
mirror_enum!(IssueStatus, reconciliation::IssueStatus, [Open, Resolved]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_values_match_domain() {
        for status in CommissionStatus::iter() {
            let domain: commission::CommissionStatus = status.into();
            assert_eq!(status.to_value(), domain.as_str());
            assert_eq!(CommissionStatus::from(domain), status);
        }
        for status in BatchStatus::iter() {
            let domain: payout::BatchStatus = status.into();
            assert_eq!(status.to_value(), domain.as_str());
        }
    }
}
