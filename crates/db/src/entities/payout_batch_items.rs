//! `SeaORM` Entity for payout_batch_items table.

use super::sea_orm_active_enums::{ItemOutcome, ItemSource};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "payout_batch_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub batch_id: Uuid,
    pub position: i32,
    pub source: ItemSource,
    pub source_id: Uuid,
    pub amount: i64,
    pub paid_at: Option<DateTimeUtc>,
    pub outcome: Option<ItemOutcome>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::payout_batches::Entity",
        from = "Column::BatchId",
        to = "super::payout_batches::Column::Id"
    )]
    PayoutBatches,
}

impl Related<super::payout_batches::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PayoutBatches.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
