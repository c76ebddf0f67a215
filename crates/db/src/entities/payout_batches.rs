//! `SeaORM` Entity for payout_batches table.

use super::sea_orm_active_enums::BatchStatus;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "payout_batches")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub status: BatchStatus,
    pub total: i64,
    pub created_at: DateTimeUtc,
    pub approved_at: Option<DateTimeUtc>,
    pub completed_at: Option<DateTimeUtc>,
    pub version: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::payout_batch_items::Entity")]
    PayoutBatchItems,
}

impl Related<super::payout_batch_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PayoutBatchItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
