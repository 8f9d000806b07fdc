//! Invoice data types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{CompanyId, InvoiceId, ProductId, UserId, WorkerId};

/// What an invoice records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceKind {
    /// The company restocking its inventory.
    CompanyPurchase,
    /// A branch selling to a customer.
    UserSale,
}

impl InvoiceKind {
    /// Returns the database/API representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CompanyPurchase => "COMPANY_PURCHASE",
            Self::UserSale => "USER_SALE",
        }
    }
}

/// One product line, frozen at the time of the invoice.
///
/// `quantity` is the amount bought or sold, not the stock left afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    /// The product.
    pub product_id: ProductId,
    /// Product name at the time.
    pub name: String,
    /// Quantity bought or sold.
    pub quantity: Decimal,
    /// Purchase price for purchases, sale price for sales.
    pub unit_price: Decimal,
    /// `unit_price * quantity`.
    pub amount: Decimal,
}

/// A committed invoice. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    /// Invoice ID.
    pub id: InvoiceId,
    /// Purchase or sale.
    pub kind: InvoiceKind,
    /// Total to pay.
    pub to_pay: Decimal,
    /// When it happened.
    pub occurred_at: DateTime<Utc>,
    /// Issuing company.
    pub company_id: CompanyId,
    /// Named buyer of a sale; `None` for anonymous sales and purchases.
    pub buyer_id: Option<UserId>,
    /// Selling branch.
    pub worker_id: Option<WorkerId>,
    /// Product lines.
    pub lines: Vec<InvoiceLine>,
}
