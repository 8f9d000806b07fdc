//! Balance data types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{BalanceHistoryId, BalanceId, CompanyId, UserId};

use crate::primitives::{LedgerLink, TransactionKind};

/// Who a balance belongs to. Exactly one owner per balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum BalanceOwner {
    /// A user's personal balance.
    User(UserId),
    /// A company's cash balance.
    Company(CompanyId),
}

impl std::fmt::Display for BalanceOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User(id) => write!(f, "user {id}"),
            Self::Company(id) => write!(f, "company {id}"),
        }
    }
}

/// Which of the caller's balances a query addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceScope {
    /// The caller's own balance.
    User,
    /// The caller's company balance.
    Company,
}

/// A monetary balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// Balance ID.
    pub id: BalanceId,
    /// Owner.
    pub owner: BalanceOwner,
    /// Current amount.
    pub amount: Decimal,
    /// Number of transactions applied so far.
    pub version: i64,
    /// Time of the last mutation.
    pub as_of: DateTime<Utc>,
    /// What caused the last mutation.
    pub last_link: LedgerLink,
}

impl Balance {
    /// Opens an empty balance.
    #[must_use]
    pub fn open(owner: BalanceOwner, at: DateTime<Utc>) -> Self {
        Self {
            id: BalanceId::new(),
            owner,
            amount: Decimal::ZERO,
            version: 0,
            as_of: at,
            last_link: LedgerLink::None,
        }
    }
}

/// One applied transaction. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceHistoryEntry {
    /// Entry ID.
    pub id: BalanceHistoryId,
    /// The balance this entry belongs to.
    pub balance_id: BalanceId,
    /// Balance version after this entry (1 for the first entry).
    pub version: i64,
    /// Amount before the transaction.
    pub prev_amount: Decimal,
    /// Unsigned transaction amount; the direction is `kind`.
    pub delta_amount: Decimal,
    /// Direction.
    pub kind: TransactionKind,
    /// When the transaction happened.
    pub occurred_at: DateTime<Utc>,
    /// What caused it.
    pub link: LedgerLink,
}

impl BalanceHistoryEntry {
    /// The delta with its sign applied.
    #[must_use]
    pub fn signed_delta(&self) -> Decimal {
        match self.kind {
            TransactionKind::Income => self.delta_amount,
            TransactionKind::Expense => -self.delta_amount,
        }
    }
}
