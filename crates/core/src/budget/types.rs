//! Budget data types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{BudgetHistoryId, BudgetId, CompanyId, FinanceId};

use crate::error::{LedgerError, LedgerResult};
use crate::primitives::TransactionKind;

/// The three running figures of a budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BudgetTotals {
    /// Total income.
    pub income: Decimal,
    /// Total expense.
    pub expense: Decimal,
    /// `income - expense`.
    pub profit: Decimal,
}

impl BudgetTotals {
    /// All zero.
    pub const ZERO: Self = Self {
        income: Decimal::ZERO,
        expense: Decimal::ZERO,
        profit: Decimal::ZERO,
    };

    /// Returns the totals after one more finance record.
    pub fn apply(self, kind: TransactionKind, amount: Decimal) -> LedgerResult<Self> {
        let overflow = || LedgerError::OutOfRange("budget totals".to_string());
        match kind {
            TransactionKind::Income => Ok(Self {
                income: self.income.checked_add(amount).ok_or_else(overflow)?,
                profit: self.profit.checked_add(amount).ok_or_else(overflow)?,
                ..self
            }),
            TransactionKind::Expense => Ok(Self {
                expense: self.expense.checked_add(amount).ok_or_else(overflow)?,
                profit: self.profit.checked_sub(amount).ok_or_else(overflow)?,
                ..self
            }),
        }
    }

    /// Returns true if `profit == income - expense`.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.income.checked_sub(self.expense) == Some(self.profit)
    }
}

/// A company's budget. One per company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    /// Budget ID.
    pub id: BudgetId,
    /// Owning company.
    pub company_id: CompanyId,
    /// Total income, never decreases.
    pub income: Decimal,
    /// Total expense, never decreases.
    pub expense: Decimal,
    /// `income - expense`.
    pub profit: Decimal,
    /// Number of finance records applied so far.
    pub version: i64,
    /// Time of the last finance record.
    pub as_of: DateTime<Utc>,
    /// The last finance record applied.
    pub last_finance: Option<FinanceId>,
}

impl Budget {
    /// Opens an all-zero budget.
    #[must_use]
    pub fn open(company_id: CompanyId, at: DateTime<Utc>) -> Self {
        Self {
            id: BudgetId::new(),
            company_id,
            income: Decimal::ZERO,
            expense: Decimal::ZERO,
            profit: Decimal::ZERO,
            version: 0,
            as_of: at,
            last_finance: None,
        }
    }

    /// The current running figures.
    #[must_use]
    pub const fn totals(&self) -> BudgetTotals {
        BudgetTotals {
            income: self.income,
            expense: self.expense,
            profit: self.profit,
        }
    }
}

/// Snapshot taken before one finance record was applied. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetHistoryEntry {
    /// Entry ID.
    pub id: BudgetHistoryId,
    /// The budget this entry belongs to.
    pub budget_id: BudgetId,
    /// Budget version after this entry (1 for the first entry).
    pub version: i64,
    /// Income before the record.
    pub prev_income: Decimal,
    /// Expense before the record.
    pub prev_expense: Decimal,
    /// Profit before the record.
    pub prev_profit: Decimal,
    /// Direction of the record.
    pub kind: TransactionKind,
    /// Amount of the record.
    pub amount: Decimal,
    /// When the record happened.
    pub occurred_at: DateTime<Utc>,
    /// The record.
    pub finance_id: FinanceId,
}

impl BudgetHistoryEntry {
    /// The snapshot as totals.
    #[must_use]
    pub const fn prev_totals(&self) -> BudgetTotals {
        BudgetTotals {
            income: self.prev_income,
            expense: self.prev_expense,
            profit: self.prev_profit,
        }
    }
}
