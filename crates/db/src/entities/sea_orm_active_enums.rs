//! `SeaORM` active enums mirroring the PostgreSQL enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// `user_role` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "user_role")]
pub enum UserRole {
    /// Company director.
    #[sea_orm(string_value = "DIRECTOR")]
    Director,
    /// Company administrator.
    #[sea_orm(string_value = "ADMIN")]
    Admin,
    /// Branch director.
    #[sea_orm(string_value = "WORKER_DIRECTOR")]
    WorkerDirector,
    /// Branch administrator.
    #[sea_orm(string_value = "WORKER_ADMIN")]
    WorkerAdmin,
    /// Branch sales staff.
    #[sea_orm(string_value = "WORKER_USER")]
    WorkerUser,
    /// Registered buyer.
    #[sea_orm(string_value = "CUSTOMER")]
    Customer,
}

/// `transaction_kind` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transaction_kind")]
pub enum TransactionKind {
    /// Money in.
    #[sea_orm(string_value = "INCOME")]
    Income,
    /// Money out.
    #[sea_orm(string_value = "EXPENSE")]
    Expense,
}

/// `invoice_kind` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "invoice_kind")]
pub enum InvoiceKind {
    /// Company restock.
    #[sea_orm(string_value = "COMPANY_PURCHASE")]
    CompanyPurchase,
    /// Branch sale.
    #[sea_orm(string_value = "USER_SALE")]
    UserSale,
}

/// `unit_of_measure` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "unit_of_measure")]
pub enum UnitOfMeasure {
    /// By weight.
    #[sea_orm(string_value = "KILOGRAM")]
    Kilogram,
    /// By the piece.
    #[sea_orm(string_value = "PIECES")]
    Pieces,
}
