//! `SeaORM` Entity for budgets table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub company_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((20, 3)))")]
    pub income: Decimal,
    #[sea_orm(column_type = "Decimal(Some((20, 3)))")]
    pub expense: Decimal,
    #[sea_orm(column_type = "Decimal(Some((20, 3)))")]
    pub profit: Decimal,
    pub version: i64,
    pub as_of: DateTimeWithTimeZone,
    pub last_finance_id: Option<Uuid>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::companies::Entity",
        from = "Column::CompanyId",
        to = "super::companies::Column::Id",
        on_delete = "Cascade"
    )]
    Companies,
    #[sea_orm(has_many = "super::budget_history::Entity")]
    BudgetHistory,
}

impl Related<super::companies::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Companies.def()
    }
}

impl Related<super::budget_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BudgetHistory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
