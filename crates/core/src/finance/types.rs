//! Finance data types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{CompanyId, FinanceId};

use crate::budget::{Budget, BudgetHistoryEntry};
use crate::primitives::TransactionKind;

/// One discrete income or expense event of a company. Immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinanceRecord {
    /// Record ID.
    pub id: FinanceId,
    /// Owning company.
    pub company_id: CompanyId,
    /// Strictly positive amount.
    pub amount: Decimal,
    /// Direction.
    pub kind: TransactionKind,
    /// When it happened.
    pub occurred_at: DateTime<Utc>,
}

/// Everything one recording wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    /// The new record.
    pub finance: FinanceRecord,
    /// The budget after applying it.
    pub budget: Budget,
    /// The budget's pre-mutation snapshot.
    pub entry: BudgetHistoryEntry,
}
