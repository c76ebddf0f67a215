//! `SeaORM` Entity for reconciliations table.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "reconciliations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub period_start: Date,
    pub period_end: Date,
    pub actuals_recorded_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::reconciliation_totals::Entity")]
    ReconciliationTotals,
    #[sea_orm(has_many = "super::reconciliation_issues::Entity")]
    ReconciliationIssues,
}

impl Related<super::reconciliation_totals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReconciliationTotals.def()
    }
}

impl Related<super::reconciliation_issues::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReconciliationIssues.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
