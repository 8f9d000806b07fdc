//! The finance recorder.
//!
//! Creating a finance record and moving the budget are one step: the record
//! is written and the budget updated inside a savepoint, so a failed budget
//! update takes the record with it without ending the caller's transaction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tally_shared::types::{CompanyId, FinanceId};
use tracing::{debug, warn};

use super::types::{FinanceRecord, Recorded};
use crate::budget::{Budget, BudgetHistoryEntry, BudgetLedger};
use crate::error::{LedgerError, LedgerResult};
use crate::primitives::TransactionKind;
use crate::store::{StoreTx, fits_scale};

const SAVEPOINT: &str = "finance_record";

/// Records finance events and applies them to the company budget.
#[derive(Debug, Clone, Copy, Default)]
pub struct FinanceRecorder {
    budget: BudgetLedger,
}

impl FinanceRecorder {
    /// Creates a recorder feeding `budget`.
    #[must_use]
    pub const fn new(budget: BudgetLedger) -> Self {
        Self { budget }
    }

    /// Creates a record for `budget`'s company and applies it.
    pub fn record(
        &self,
        budget: &mut Budget,
        amount: Decimal,
        kind: TransactionKind,
        occurred_at: DateTime<Utc>,
    ) -> LedgerResult<(FinanceRecord, BudgetHistoryEntry)> {
        let finance = new_record(budget.company_id, amount, kind, occurred_at)?;
        let entry = self.budget.apply_finance(budget, &finance)?;
        Ok((finance, entry))
    }

    /// Writes a record and the matching budget change inside `tx`.
    pub async fn record_in<T: StoreTx>(
        &self,
        tx: &mut T,
        company_id: CompanyId,
        amount: Decimal,
        kind: TransactionKind,
        occurred_at: DateTime<Utc>,
    ) -> LedgerResult<Recorded> {
        let finance = new_record(company_id, amount, kind, occurred_at)?;

        tx.savepoint(SAVEPOINT).await?;
        match self.write(tx, finance).await {
            Ok(recorded) => {
                tx.release_savepoint(SAVEPOINT).await?;
                debug!(
                    finance_id = %recorded.finance.id,
                    %company_id,
                    %kind,
                    %amount,
                    "Finance recorded"
                );
                Ok(recorded)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback_to_savepoint(SAVEPOINT).await {
                    warn!(error = %rollback_err, "Failed to roll back finance savepoint");
                }
                Err(err)
            }
        }
    }

    async fn write<T: StoreTx>(&self, tx: &mut T, finance: FinanceRecord) -> LedgerResult<Recorded> {
        tx.insert_finance(&finance).await?;
        let (budget, entry) = self.budget.post(tx, &finance).await?;
        Ok(Recorded {
            finance,
            budget,
            entry,
        })
    }
}

fn new_record(
    company_id: CompanyId,
    amount: Decimal,
    kind: TransactionKind,
    occurred_at: DateTime<Utc>,
) -> LedgerResult<FinanceRecord> {
    if amount <= Decimal::ZERO || !fits_scale(amount) {
        return Err(LedgerError::InvalidAmount(amount));
    }
    Ok(FinanceRecord {
        id: FinanceId::new(),
        company_id,
        amount,
        kind,
        occurred_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_record_links_budget_to_new_finance() {
        let at = Utc.with_ymd_and_hms(2026, 4, 1, 9, 30, 0).unwrap();
        let mut budget = Budget::open(CompanyId::new(), at);

        let (finance, entry) = FinanceRecorder::default()
            .record(&mut budget, dec!(75.25), TransactionKind::Income, at)
            .unwrap();

        assert_eq!(finance.company_id, budget.company_id);
        assert_eq!(entry.finance_id, finance.id);
        assert_eq!(budget.last_finance, Some(finance.id));
        assert_eq!(budget.income, dec!(75.25));
    }

    #[test]
    fn test_record_rejects_non_positive_amount() {
        let at = Utc.with_ymd_and_hms(2026, 4, 1, 9, 30, 0).unwrap();
        let mut budget = Budget::open(CompanyId::new(), at);

        let err = FinanceRecorder::default()
            .record(&mut budget, dec!(0), TransactionKind::Expense, at)
            .unwrap_err();

        assert!(matches!(err, LedgerError::InvalidAmount(_)));
        assert_eq!(budget.version, 0);
    }
}
