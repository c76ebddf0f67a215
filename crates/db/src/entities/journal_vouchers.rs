//! `SeaORM` Entity for journal_vouchers table.

use super::sea_orm_active_enums::VoucherStatus;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "journal_vouchers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub voucher_number: String,
    pub voucher_date: Date,
    pub description: String,
    pub reference: Option<String>,
    pub status: VoucherStatus,
    #[sea_orm(unique)]
    pub reverses_voucher_id: Option<Uuid>,
    pub settlement_id: Option<Uuid>,
    pub created_at: DateTimeUtc,
    pub posted_at: Option<DateTimeUtc>,
    pub version: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::journal_lines::Entity")]
    JournalLines,
}

impl Related<super::journal_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::JournalLines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
