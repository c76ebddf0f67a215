//! `SeaORM` Entity for commission_plans table.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "commission_plans")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub active: bool,
    pub version: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::commission_rules::Entity")]
    CommissionRules,
}

impl Related<super::commission_rules::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CommissionRules.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
