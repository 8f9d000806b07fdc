//! `SeaORM` Entity for budget_history table.

use super::sea_orm_active_enums::TransactionKind;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "budget_history")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub budget_id: Uuid,
    pub version: i64,
    #[sea_orm(column_type = "Decimal(Some((20, 3)))")]
    pub prev_income: Decimal,
    #[sea_orm(column_type = "Decimal(Some((20, 3)))")]
    pub prev_expense: Decimal,
    #[sea_orm(column_type = "Decimal(Some((20, 3)))")]
    pub prev_profit: Decimal,
    pub kind: TransactionKind,
    #[sea_orm(column_type = "Decimal(Some((20, 3)))")]
    pub amount: Decimal,
    pub occurred_at: DateTimeWithTimeZone,
    pub finance_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::budgets::Entity",
        from = "Column::BudgetId",
        to = "super::budgets::Column::Id",
        on_delete = "Cascade"
    )]
    Budgets,
    #[sea_orm(
        belongs_to = "super::finances::Entity",
        from = "Column::FinanceId",
        to = "super::finances::Column::Id",
        on_delete = "Cascade"
    )]
    Finances,
}

impl Related<super::budgets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Budgets.def()
    }
}

impl Related<super::finances::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Finances.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
