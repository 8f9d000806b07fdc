//! The money ledger.
//!
//! The single entry point for changing a balance. Every successful call
//! produces exactly one history entry; a failed call changes nothing.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tally_shared::types::BalanceHistoryId;
use tracing::debug;

use super::types::{Balance, BalanceHistoryEntry, BalanceOwner};
use crate::error::{LedgerError, LedgerResult};
use crate::primitives::{LedgerLink, TransactionKind};
use crate::store::{StoreTx, fits_scale};

/// Applies income and expense transactions to balances.
#[derive(Debug, Clone, Copy)]
pub struct MoneyLedger {
    allow_negative: bool,
}

impl Default for MoneyLedger {
    fn default() -> Self {
        Self::new(true)
    }
}

impl MoneyLedger {
    /// Creates a ledger; with `allow_negative = false` expenses may not take
    /// a balance below zero.
    #[must_use]
    pub const fn new(allow_negative: bool) -> Self {
        Self { allow_negative }
    }

    /// Whether balances may go negative.
    #[must_use]
    pub const fn allows_negative(&self) -> bool {
        self.allow_negative
    }

    /// Applies one transaction to `balance` and returns its history entry.
    ///
    /// `balance` is left untouched on error.
    pub fn apply_transaction(
        &self,
        balance: &mut Balance,
        amount: Decimal,
        kind: TransactionKind,
        occurred_at: DateTime<Utc>,
        link: LedgerLink,
    ) -> LedgerResult<BalanceHistoryEntry> {
        if amount <= Decimal::ZERO || !fits_scale(amount) {
            return Err(LedgerError::InvalidAmount(amount));
        }

        let prev_amount = balance.amount;
        let next = match kind {
            TransactionKind::Income => prev_amount.checked_add(amount),
            TransactionKind::Expense => prev_amount.checked_sub(amount),
        }
        .ok_or_else(|| LedgerError::OutOfRange(format!("balance {} amount", balance.id)))?;

        if !self.allow_negative && kind == TransactionKind::Expense && next < Decimal::ZERO {
            return Err(LedgerError::Overdraft {
                balance_id: balance.id,
                available: prev_amount,
                requested: amount,
            });
        }

        balance.amount = next;
        balance.version += 1;
        balance.as_of = occurred_at;
        balance.last_link = link;

        Ok(BalanceHistoryEntry {
            id: BalanceHistoryId::new(),
            balance_id: balance.id,
            version: balance.version,
            prev_amount,
            delta_amount: amount,
            kind,
            occurred_at,
            link,
        })
    }

    /// Loads the owner's balance under lock, applies the transaction, and
    /// writes both the balance and its history entry.
    pub async fn post<T: StoreTx>(
        &self,
        tx: &mut T,
        owner: BalanceOwner,
        amount: Decimal,
        kind: TransactionKind,
        occurred_at: DateTime<Utc>,
        link: LedgerLink,
    ) -> LedgerResult<(Balance, BalanceHistoryEntry)> {
        let mut balance = tx
            .find_balance_for_update(owner)
            .await?
            .ok_or(LedgerError::BalanceNotFound(owner))?;

        let entry = self.apply_transaction(&mut balance, amount, kind, occurred_at, link)?;
        tx.update_balance(&balance).await?;
        tx.insert_balance_history(&entry).await?;

        debug!(
            balance_id = %balance.id,
            %kind,
            %amount,
            amount_after = %balance.amount,
            "Balance posted"
        );
        Ok((balance, entry))
    }

    /// Re-applies `history` from `opening`, returning the final amount.
    ///
    /// Entries must be in version order. Fails at the first entry whose
    /// recorded `prev_amount` disagrees with the running amount.
    pub fn replay(opening: Decimal, history: &[BalanceHistoryEntry]) -> LedgerResult<Decimal> {
        history
            .iter()
            .enumerate()
            .try_fold(opening, |running, (position, entry)| {
                if entry.prev_amount != running {
                    return Err(LedgerError::HistoryMismatch {
                        position,
                        expected: running,
                        recorded: entry.prev_amount,
                    });
                }
                running
                    .checked_add(entry.signed_delta())
                    .ok_or_else(|| LedgerError::OutOfRange("balance replay".to_string()))
            })
    }

    /// Checks that `balance` is exactly what its full history produces.
    pub fn audit(balance: &Balance, history: &[BalanceHistoryEntry]) -> LedgerResult<()> {
        let replayed = Self::replay(Decimal::ZERO, history)?;
        if replayed != balance.amount {
            return Err(LedgerError::HistoryMismatch {
                position: history.len(),
                expected: replayed,
                recorded: balance.amount,
            });
        }
        if i64::try_from(history.len()).ok() != Some(balance.version) {
            return Err(LedgerError::HistoryMismatch {
                position: history.len(),
                expected: Decimal::from(history.len()),
                recorded: Decimal::from(balance.version),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use tally_shared::types::{CompanyId, InvoiceId, UserId};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, hour, 0, 0).unwrap()
    }

    fn balance_with(amount: Decimal) -> Balance {
        let mut balance = Balance::open(BalanceOwner::User(UserId::new()), at(0));
        balance.amount = amount;
        balance
    }

    #[test]
    fn test_income_increases_balance_and_records_prev_amount() {
        let mut balance = balance_with(dec!(100.00));
        let entry = MoneyLedger::default()
            .apply_transaction(
                &mut balance,
                dec!(30),
                TransactionKind::Income,
                at(9),
                LedgerLink::None,
            )
            .unwrap();

        assert_eq!(balance.amount, dec!(130.00));
        assert_eq!(balance.as_of, at(9));
        assert_eq!(balance.version, 1);
        assert_eq!(entry.prev_amount, dec!(100.00));
        assert_eq!(entry.kind, TransactionKind::Income);
        assert_eq!(entry.version, 1);
    }

    #[test]
    fn test_expense_links_invoice() {
        let mut balance = balance_with(dec!(50));
        let invoice = InvoiceId::new();
        let entry = MoneyLedger::default()
            .apply_transaction(
                &mut balance,
                dec!(20.5),
                TransactionKind::Expense,
                at(10),
                LedgerLink::Invoice(invoice),
            )
            .unwrap();

        assert_eq!(balance.amount, dec!(29.5));
        assert_eq!(balance.last_link, LedgerLink::Invoice(invoice));
        assert_eq!(entry.signed_delta(), dec!(-20.5));
    }

    #[test]
    fn test_non_positive_amount_is_rejected_without_mutation() {
        let mut balance = balance_with(dec!(10));
        let before = balance.clone();
        for amount in [dec!(0), dec!(-1), dec!(0.0004)] {
            let err = MoneyLedger::default()
                .apply_transaction(
                    &mut balance,
                    amount,
                    TransactionKind::Income,
                    at(1),
                    LedgerLink::None,
                )
                .unwrap_err();
            assert!(matches!(err, LedgerError::InvalidAmount(_)));
        }
        assert_eq!(balance, before);
    }

    #[test]
    fn test_negative_balance_allowed_by_default() {
        let mut balance = balance_with(dec!(5));
        MoneyLedger::default()
            .apply_transaction(
                &mut balance,
                dec!(8),
                TransactionKind::Expense,
                at(2),
                LedgerLink::None,
            )
            .unwrap();
        assert_eq!(balance.amount, dec!(-3));
    }

    #[test]
    fn test_overdraft_refused_when_negative_disallowed() {
        let mut balance = Balance::open(BalanceOwner::Company(CompanyId::new()), at(0));
        balance.amount = dec!(5);
        let err = MoneyLedger::new(false)
            .apply_transaction(
                &mut balance,
                dec!(8),
                TransactionKind::Expense,
                at(2),
                LedgerLink::None,
            )
            .unwrap_err();

        assert!(matches!(
            err,
            LedgerError::Overdraft { available, requested, .. }
                if available == dec!(5) && requested == dec!(8)
        ));
        assert_eq!(balance.amount, dec!(5));
        assert_eq!(balance.version, 0);
    }

    #[test]
    fn test_overflow_is_out_of_range() {
        let mut balance = balance_with(Decimal::MAX);
        let err = MoneyLedger::default()
            .apply_transaction(
                &mut balance,
                dec!(1),
                TransactionKind::Income,
                at(3),
                LedgerLink::None,
            )
            .unwrap_err();
        assert!(matches!(err, LedgerError::OutOfRange(_)));
    }

    #[test]
    fn test_replay_detects_tampered_entry() {
        let ledger = MoneyLedger::default();
        let mut balance = balance_with(Decimal::ZERO);
        let mut history = Vec::new();
        for (amount, kind) in [
            (dec!(40), TransactionKind::Income),
            (dec!(15), TransactionKind::Expense),
            (dec!(5), TransactionKind::Income),
        ] {
            history.push(
                ledger
                    .apply_transaction(&mut balance, amount, kind, at(4), LedgerLink::None)
                    .unwrap(),
            );
        }
        assert!(MoneyLedger::audit(&balance, &history).is_ok());

        history[1].prev_amount = dec!(41);
        let err = MoneyLedger::replay(Decimal::ZERO, &history).unwrap_err();
        assert!(matches!(err, LedgerError::HistoryMismatch { position: 1, .. }));
    }

    #[test]
    fn test_audit_detects_aggregate_drift() {
        let ledger = MoneyLedger::default();
        let mut balance = balance_with(Decimal::ZERO);
        let entry = ledger
            .apply_transaction(
                &mut balance,
                dec!(10),
                TransactionKind::Income,
                at(5),
                LedgerLink::None,
            )
            .unwrap();

        balance.amount = dec!(11);
        let err = MoneyLedger::audit(&balance, &[entry]).unwrap_err();
        assert!(matches!(err, LedgerError::HistoryMismatch { position: 1, .. }));
    }
}
