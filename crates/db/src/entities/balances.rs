//! `SeaORM` Entity for balances table.
//!
//! Exactly one of `user_id` and `company_id` is set; at most one of
//! `invoice_id` and `finance_id`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "balances")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub user_id: Option<Uuid>,
    #[sea_orm(unique)]
    pub company_id: Option<Uuid>,
    #[sea_orm(column_type = "Decimal(Some((20, 3)))")]
    pub amount: Decimal,
    pub version: i64,
    pub as_of: DateTimeWithTimeZone,
    pub invoice_id: Option<Uuid>,
    pub finance_id: Option<Uuid>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::balance_history::Entity")]
    BalanceHistory,
}

impl Related<super::balance_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BalanceHistory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
