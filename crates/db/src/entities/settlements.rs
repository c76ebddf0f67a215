//! `SeaORM` Entity for settlements table.

use super::sea_orm_active_enums::{BeneficiaryType, SettlementStatus};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "settlements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub entity_id: Uuid,
    pub entity_model: BeneficiaryType,
    pub period_start: Date,
    pub period_end: Date,
    pub expected_total: i64,
    pub status: SettlementStatus,
    pub voucher_id: Option<Uuid>,
    pub approved_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub version: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::settlement_commissions::Entity")]
    SettlementCommissions,
}

impl Related<super::settlement_commissions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SettlementCommissions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
