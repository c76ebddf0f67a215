//! `SeaORM` Entity for commissions table.

use super::sea_orm_active_enums::{BeneficiaryType, CommissionStatus};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "commissions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub beneficiary_id: Uuid,
    pub beneficiary_type: BeneficiaryType,
    pub amount: i64,
    pub source_order_id: Option<String>,
    pub trigger_name: String,
    pub plan_id: Uuid,
    pub status: CommissionStatus,
    pub created_at: DateTimeUtc,
    pub version: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::commission_plans::Entity",
        from = "Column::PlanId",
        to = "super::commission_plans::Column::Id"
    )]
    CommissionPlans,
}

impl Related<super::commission_plans::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CommissionPlans.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
