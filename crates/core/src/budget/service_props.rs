//! Property-based tests for BudgetLedger.
//!
//! - Budget identity: profit == income - expense after every application
//! - Running totals never decrease
//! - Replaying the history reproduces the budget exactly

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::{CompanyId, FinanceId};

use super::service::BudgetLedger;
use super::types::Budget;
use crate::finance::FinanceRecord;
use crate::primitives::TransactionKind;

fn record() -> impl Strategy<Value = (Decimal, TransactionKind)> {
    (
        (1i64..5_000_000i64).prop_map(|mills| Decimal::new(mills, 3)),
        prop_oneof![Just(TransactionKind::Income), Just(TransactionKind::Expense)],
    )
}

proptest! {
    #[test]
    fn prop_budget_identity_and_replay(
        records in prop::collection::vec(record(), 1..50),
        allow_negative in any::<bool>(),
    ) {
        let ledger = BudgetLedger::new(allow_negative);
        let company_id = CompanyId::new();
        let at = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        let mut budget = Budget::open(company_id, at);
        let mut history = Vec::new();

        for (amount, kind) in records {
            let before = budget.totals();
            let finance = FinanceRecord { id: FinanceId::new(), company_id, amount, kind, occurred_at: at };
            if let Ok(entry) = ledger.apply_finance(&mut budget, &finance) {
                prop_assert_eq!(entry.prev_totals(), before);
                history.push(entry);
            }

            prop_assert!(budget.totals().is_consistent());
            prop_assert!(budget.income >= before.income);
            prop_assert!(budget.expense >= before.expense);
            if !allow_negative {
                prop_assert!(budget.profit >= Decimal::ZERO);
            }
        }

        if let Some(replayed) = BudgetLedger::replay(&history).unwrap() {
            prop_assert_eq!(replayed, budget.totals());
        }
        prop_assert!(BudgetLedger::audit(&budget, &history).is_ok());
    }
}
