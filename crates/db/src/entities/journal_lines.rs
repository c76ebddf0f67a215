//! `SeaORM` Entity for journal_lines table.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "journal_lines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub voucher_id: Uuid,
    pub line_no: i32,
    pub account_id: Uuid,
    pub debit: i64,
    pub credit: i64,
    pub currency: String,
    /// Decimal rate kept as text so no backend rounds it.
    pub rate: String,
    pub base_debit: i64,
    pub base_credit: i64,
    pub entity_id: Option<Uuid>,
    pub memo: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::journal_vouchers::Entity",
        from = "Column::VoucherId",
        to = "super::journal_vouchers::Column::Id",
        on_delete = "Cascade"
    )]
    JournalVouchers,
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id"
    )]
    Accounts,
}

impl Related<super::journal_vouchers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::JournalVouchers.def()
    }
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
