//! `SeaORM` Entity for reconciliation_issues table.

use super::sea_orm_active_enums::IssueStatus;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "reconciliation_issues")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub reconciliation_id: Uuid,
    pub category: String,
    pub expected: i64,
    pub actual: i64,
    pub difference: i64,
    pub description: String,
    pub status: IssueStatus,
    pub resolution: Option<String>,
    pub resolved_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
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
