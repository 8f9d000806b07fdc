//! Company budget: running income, expense, and profit.

pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use service::BudgetLedger;
pub use types::{Budget, BudgetHistoryEntry, BudgetTotals};
