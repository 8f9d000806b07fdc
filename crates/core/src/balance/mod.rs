//! Money ledger over user and company balances.

pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use service::MoneyLedger;
pub use types::{Balance, BalanceHistoryEntry, BalanceOwner, BalanceScope};
