//! `SeaORM` Entity for commission_rules table.

use super::sea_orm_active_enums::BeneficiaryType;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "commission_rules")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub plan_id: Uuid,
    pub trigger_name: String,
    pub amount: i64,
    pub beneficiary_type: Option<BeneficiaryType>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::commission_plans::Entity",
        from = "Column::PlanId",
        to = "super::commission_plans::Column::Id",
        on_delete = "Cascade"
    )]
    CommissionPlans,
}

impl Related<super::commission_plans::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CommissionPlans.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
