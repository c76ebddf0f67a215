//! `SeaORM` Entity for reconciliation_totals table.

use super::sea_orm_active_enums::TotalsKind;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "reconciliation_totals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub reconciliation_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub kind: TotalsKind,
    #[sea_orm(primary_key, auto_increment = false)]
    pub category: String,
    pub amount: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::reconciliations::Entity",
        from = "Column::ReconciliationId",
        to = "super::reconciliations::Column::Id"
    )]
    Reconciliations,
}

impl Related<super::reconciliations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reconciliations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
