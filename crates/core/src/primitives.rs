//! Small value types shared by every ledger.

use serde::{Deserialize, Serialize};
use tally_shared::types::{FinanceId, InvoiceId};

/// Direction of a monetary movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    /// Money in.
    Income,
    /// Money out.
    Expense,
}

impl TransactionKind {
    /// Returns the database/API representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Income => "INCOME",
            Self::Expense => "EXPENSE",
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What caused a ledger mutation.
///
/// At most one back-reference exists per mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum LedgerLink {
    /// No audit link.
    #[default]
    None,
    /// Settlement of an invoice.
    Invoice(InvoiceId),
    /// A finance record.
    Finance(FinanceId),
}

impl LedgerLink {
    /// Builds a link from the two nullable columns a row stores.
    ///
    /// Returns `None` if both are set.
    #[must_use]
    pub fn from_columns(invoice: Option<InvoiceId>, finance: Option<FinanceId>) -> Option<Self> {
        match (invoice, finance) {
            (None, None) => Some(Self::None),
            (Some(id), None) => Some(Self::Invoice(id)),
            (None, Some(id)) => Some(Self::Finance(id)),
            (Some(_), Some(_)) => None,
        }
    }

    /// The linked invoice, if any.
    #[must_use]
    pub const fn invoice(self) -> Option<InvoiceId> {
        match self {
            Self::Invoice(id) => Some(id),
            _ => None,
        }
    }

    /// The linked finance record, if any.
    #[must_use]
    pub const fn finance(self) -> Option<FinanceId> {
        match self {
            Self::Finance(id) => Some(id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_columns_round_trip() {
        let invoice = InvoiceId::new();
        let link = LedgerLink::from_columns(Some(invoice), None).unwrap();
        assert_eq!(link, LedgerLink::Invoice(invoice));
        assert_eq!(link.invoice(), Some(invoice));
        assert_eq!(link.finance(), None);

        assert_eq!(LedgerLink::from_columns(None, None), Some(LedgerLink::None));
    }

    #[test]
    fn test_link_rejects_both_columns() {
        assert!(LedgerLink::from_columns(Some(InvoiceId::new()), Some(FinanceId::new())).is_none());
    }

    #[test]
    fn test_link_serializes_as_tagged_union() {
        let finance = FinanceId::new();
        let json = serde_json::to_value(LedgerLink::Finance(finance)).unwrap();
        assert_eq!(json["type"], "finance");
        assert_eq!(json["id"], finance.to_string());
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(TransactionKind::Income.to_string(), "INCOME");
        assert_eq!(TransactionKind::Expense.to_string(), "EXPENSE");
    }
}
