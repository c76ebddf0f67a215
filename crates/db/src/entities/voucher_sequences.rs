//! `SeaORM` Entity for voucher_sequences table.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "voucher_sequences")]
pub struct Model {
    /// `YYYYMM`.
    #[sea_orm(primary_key, auto_increment = false)]
    pub period: String,
    pub last_value: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
