//! `SeaORM` Entity for trigger_receipts table.
//!
//! One row per (event, source order, beneficiary) delivery that has been
//! evaluated; the unique index makes redelivery a no-op.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "trigger_receipts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub event_name: String,
    /// Empty when the event has no source order.
    pub source_order_key: String,
    pub beneficiary_id: Uuid,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
