//! `SeaORM` entities, one module per table.

pub mod balance_history;
pub mod balances;
pub mod budget_history;
pub mod budgets;
pub mod companies;
pub mod finances;
pub mod invoice_lines;
pub mod invoices;
pub mod products;
pub mod sea_orm_active_enums;
pub mod users;
pub mod workers;
