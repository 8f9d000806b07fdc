//! The budget ledger.

use rust_decimal::Decimal;
use tally_shared::types::BudgetHistoryId;
use tracing::debug;

use super::types::{Budget, BudgetHistoryEntry, BudgetTotals};
use crate::error::{LedgerError, LedgerResult};
use crate::finance::FinanceRecord;
use crate::primitives::TransactionKind;
use crate::store::{StoreTx, fits_scale};

/// Folds finance records into a company budget.
#[derive(Debug, Clone, Copy)]
pub struct BudgetLedger {
    allow_negative: bool,
}

impl Default for BudgetLedger {
    fn default() -> Self {
        Self::new(true)
    }
}

impl BudgetLedger {
    /// Creates a ledger; with `allow_negative = false` expenses may not take
    /// profit below zero.
    #[must_use]
    pub const fn new(allow_negative: bool) -> Self {
        Self { allow_negative }
    }

    /// Applies `finance` to `budget` and returns the pre-mutation snapshot.
    ///
    /// `budget` is left untouched on error.
    pub fn apply_finance(
        &self,
        budget: &mut Budget,
        finance: &FinanceRecord,
    ) -> LedgerResult<BudgetHistoryEntry> {
        if finance.company_id != budget.company_id {
            return Err(LedgerError::Validation(format!(
                "finance record {} belongs to company {}, not {}",
                finance.id, finance.company_id, budget.company_id
            )));
        }
        if finance.amount <= Decimal::ZERO || !fits_scale(finance.amount) {
            return Err(LedgerError::InvalidAmount(finance.amount));
        }

        let before = budget.totals();
        let after = before.apply(finance.kind, finance.amount)?;
        if !self.allow_negative
            && finance.kind == TransactionKind::Expense
            && after.profit < Decimal::ZERO
        {
            return Err(LedgerError::Deficit {
                budget_id: budget.id,
                profit: before.profit,
                amount: finance.amount,
            });
        }

        budget.income = after.income;
        budget.expense = after.expense;
        budget.profit = after.profit;
        budget.version += 1;
        budget.as_of = finance.occurred_at;
        budget.last_finance = Some(finance.id);

        Ok(BudgetHistoryEntry {
            id: BudgetHistoryId::new(),
            budget_id: budget.id,
            version: budget.version,
            prev_income: before.income,
            prev_expense: before.expense,
            prev_profit: before.profit,
            kind: finance.kind,
            amount: finance.amount,
            occurred_at: finance.occurred_at,
            finance_id: finance.id,
        })
    }

    /// Loads the company budget under lock, applies `finance`, and writes the
    /// budget and its history entry. `finance` must already be stored.
    pub async fn post<T: StoreTx>(
        &self,
        tx: &mut T,
        finance: &FinanceRecord,
    ) -> LedgerResult<(Budget, BudgetHistoryEntry)> {
        let mut budget = tx
            .find_budget_for_update(finance.company_id)
            .await?
            .ok_or(LedgerError::BudgetNotFound(finance.company_id))?;

        let entry = self.apply_finance(&mut budget, finance)?;
        tx.update_budget(&budget).await?;
        tx.insert_budget_history(&entry).await?;

        debug!(
            budget_id = %budget.id,
            finance_id = %finance.id,
            profit = %budget.profit,
            "Budget updated"
        );
        Ok((budget, entry))
    }

    /// Replays `history` (in version order) from the earliest snapshot.
    ///
    /// Returns `None` for an empty history.
    pub fn replay(history: &[BudgetHistoryEntry]) -> LedgerResult<Option<BudgetTotals>> {
        let Some(first) = history.first() else {
            return Ok(None);
        };

        let mut running = first.prev_totals();
        for (position, entry) in history.iter().enumerate() {
            check_snapshot(position, running, entry.prev_totals())?;
            running = running.apply(entry.kind, entry.amount)?;
        }
        Ok(Some(running))
    }

    /// Checks that `budget` is exactly what its full history produces.
    pub fn audit(budget: &Budget, history: &[BudgetHistoryEntry]) -> LedgerResult<()> {
        if let Some(first) = history.first() {
            check_snapshot(0, BudgetTotals::ZERO, first.prev_totals())?;
        }
        let replayed = Self::replay(history)?.unwrap_or(BudgetTotals::ZERO);
        check_snapshot(history.len(), replayed, budget.totals())?;
        if !budget.totals().is_consistent() {
            return Err(LedgerError::HistoryMismatch {
                position: history.len(),
                expected: budget.income.checked_sub(budget.expense).unwrap_or_default(),
                recorded: budget.profit,
            });
        }
        Ok(())
    }
}

fn check_snapshot(
    position: usize,
    expected: BudgetTotals,
    recorded: BudgetTotals,
) -> LedgerResult<()> {
    let pairs = [
        (expected.income, recorded.income),
        (expected.expense, recorded.expense),
        (expected.profit, recorded.profit),
    ];
    match pairs.into_iter().find(|(e, r)| e != r) {
        Some((expected, recorded)) => Err(LedgerError::HistoryMismatch {
            position,
            expected,
            recorded,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use rust_decimal_macros::dec;
    use tally_shared::types::{CompanyId, FinanceId};

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, day, 8, 0, 0).unwrap()
    }

    fn finance(company_id: CompanyId, amount: Decimal, kind: TransactionKind) -> FinanceRecord {
        FinanceRecord {
            id: FinanceId::new(),
            company_id,
            amount,
            kind,
            occurred_at: at(3),
        }
    }

    #[test]
    fn test_income_raises_income_and_profit() {
        let company = CompanyId::new();
        let mut budget = Budget::open(company, at(1));
        let record = finance(company, dec!(120.5), TransactionKind::Income);

        let entry = BudgetLedger::default()
            .apply_finance(&mut budget, &record)
            .unwrap();

        assert_eq!(budget.totals(), BudgetTotals {
            income: dec!(120.5),
            expense: dec!(0),
            profit: dec!(120.5),
        });
        assert_eq!(budget.last_finance, Some(record.id));
        assert_eq!(budget.as_of, at(3));
        assert_eq!(entry.prev_totals(), BudgetTotals::ZERO);
    }

    #[test]
    fn test_expense_raises_expense_and_lowers_profit() {
        let company = CompanyId::new();
        let mut budget = Budget::open(company, at(1));
        let ledger = BudgetLedger::default();
        ledger
            .apply_finance(&mut budget, &finance(company, dec!(50), TransactionKind::Income))
            .unwrap();
        let entry = ledger
            .apply_finance(&mut budget, &finance(company, dec!(80), TransactionKind::Expense))
            .unwrap();

        assert_eq!(budget.expense, dec!(80));
        assert_eq!(budget.profit, dec!(-30));
        assert!(budget.totals().is_consistent());
        assert_eq!(entry.prev_profit, dec!(50));
        assert_eq!(entry.version, 2);
    }

    #[test]
    fn test_deficit_refused_when_negative_disallowed() {
        let company = CompanyId::new();
        let mut budget = Budget::open(company, at(1));
        let err = BudgetLedger::new(false)
            .apply_finance(&mut budget, &finance(company, dec!(1), TransactionKind::Expense))
            .unwrap_err();

        assert!(matches!(err, LedgerError::Deficit { .. }));
        assert_eq!(budget.totals(), BudgetTotals::ZERO);
        assert_eq!(budget.version, 0);
    }

    #[test]
    fn test_finance_of_other_company_is_rejected() {
        let mut budget = Budget::open(CompanyId::new(), at(1));
        let err = BudgetLedger::default()
            .apply_finance(
                &mut budget,
                &finance(CompanyId::new(), dec!(5), TransactionKind::Income),
            )
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn test_replay_of_empty_history_is_none() {
        assert_eq!(BudgetLedger::replay(&[]).unwrap(), None);
    }

    #[test]
    fn test_audit_catches_broken_snapshot() {
        let company = CompanyId::new();
        let mut budget = Budget::open(company, at(1));
        let ledger = BudgetLedger::default();
        let mut history = vec![
            ledger
                .apply_finance(&mut budget, &finance(company, dec!(10), TransactionKind::Income))
                .unwrap(),
            ledger
                .apply_finance(&mut budget, &finance(company, dec!(4), TransactionKind::Expense))
                .unwrap(),
        ];
        assert!(BudgetLedger::audit(&budget, &history).is_ok());

        history[1].prev_income = dec!(9);
        let err = BudgetLedger::audit(&budget, &history).unwrap_err();
        assert!(matches!(err, LedgerError::HistoryMismatch { position: 1, .. }));
    }
}
