//! Ledger core for Tally.
//!
//! This crate holds the rules that keep balances, budgets, finance records,
//! inventory, and invoices consistent. It has ZERO web or database
//! dependencies: persistence goes through the [`store::Store`] seam.
//!
//! # Modules
//!
//! - `auth` - Roles, role sets, and the permission guard
//! - `balance` - Money ledger over user and company balances
//! - `budget` - Company profit/loss aggregate and its history
//! - `finance` - Income/expense records feeding the budget
//! - `inventory` - Product stock movements and line totals
//! - `invoice` - Purchase and sale invoices
//! - `engine` - Transactional orchestration of all of the above
//! - `store` - Persistence seam and the in-memory store

pub mod auth;
pub mod balance;
pub mod budget;
pub mod directory;
pub mod engine;
pub mod error;
pub mod finance;
pub mod inventory;
pub mod invoice;
pub mod primitives;
pub mod store;

pub use engine::{LedgerEngine, LedgerPolicy};
pub use error::{ErrorKind, LedgerError, LedgerResult};
pub use primitives::{LedgerLink, TransactionKind};
