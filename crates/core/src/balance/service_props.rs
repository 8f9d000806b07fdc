//! Property-based tests for MoneyLedger.
//!
//! - Conservation: final amount = opening + incomes - expenses
//! - One history entry per successful call
//! - Replay reproduces the balance

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::CompanyId;

use super::service::MoneyLedger;
use super::types::{Balance, BalanceOwner};
use crate::primitives::{LedgerLink, TransactionKind};

/// Strategy to generate amounts from -0.005 to 10,000.000, including invalid ones.
fn amount() -> impl Strategy<Value = Decimal> {
    (-5i64..10_000_000i64).prop_map(|mills| Decimal::new(mills, 3))
}

fn kind() -> impl Strategy<Value = TransactionKind> {
    prop_oneof![Just(TransactionKind::Income), Just(TransactionKind::Expense)]
}

proptest! {
    #[test]
    fn prop_balance_conservation(
        opening in (0i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2)),
        ops in prop::collection::vec((amount(), kind()), 0..40),
        allow_negative in any::<bool>(),
    ) {
        let ledger = MoneyLedger::new(allow_negative);
        let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let mut balance = Balance::open(BalanceOwner::Company(CompanyId::new()), at);
        balance.amount = opening;

        let mut expected = opening;
        let mut history = Vec::new();
        for (amount, kind) in ops {
            if let Ok(entry) = ledger.apply_transaction(&mut balance, amount, kind, at, LedgerLink::None) {
                expected += entry.signed_delta();
                history.push(entry);
            }
            if !allow_negative {
                prop_assert!(balance.amount >= Decimal::ZERO);
            }
        }

        prop_assert_eq!(balance.amount, expected);
        prop_assert_eq!(usize::try_from(balance.version).unwrap(), history.len());
        prop_assert_eq!(MoneyLedger::replay(opening, &history).unwrap(), balance.amount);
    }
}
