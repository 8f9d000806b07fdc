//! `SeaORM` Entity for balance_history table.

use super::sea_orm_active_enums::TransactionKind;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "balance_history")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub balance_id: Uuid,
    pub version: i64,
    #[sea_orm(column_type = "Decimal(Some((20, 3)))")]
    pub prev_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((20, 3)))")]
    pub delta_amount: Decimal,
    pub kind: TransactionKind,
    pub occurred_at: DateTimeWithTimeZone,
    pub invoice_id: Option<Uuid>,
    pub finance_id: Option<Uuid>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::balances::Entity",
        from = "Column::BalanceId",
        to = "super::balances::Column::Id",
        on_delete = "Cascade"
    )]
    Balances,
}

impl Related<super::balances::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Balances.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
