//! Inventory data types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{CompanyId, ProductId, UserId};

use crate::invoice::InvoiceLine;

/// How a product is counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnitOfMeasure {
    /// Sold by weight.
    Kilogram,
    /// Sold by the piece.
    Pieces,
}

impl UnitOfMeasure {
    /// Returns the database/API representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Kilogram => "KILOGRAM",
            Self::Pieces => "PIECES",
        }
    }
}

/// A stocked product. Names are unique per company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product ID.
    pub id: ProductId,
    /// Owning company.
    pub company_id: CompanyId,
    /// User who first stocked it.
    pub owner_id: UserId,
    /// Name.
    pub name: String,
    /// Last purchase price.
    pub purchase_price: Decimal,
    /// Current sale price.
    pub sale_price: Decimal,
    /// Total stock.
    pub quantity: Decimal,
    /// Portion of `quantity` available for sale.
    pub sale_quantity: Decimal,
    /// Unit.
    pub unit: UnitOfMeasure,
}

impl Product {
    /// Returns true if `0 <= sale_quantity <= quantity`.
    #[must_use]
    pub fn stock_is_consistent(&self) -> bool {
        Decimal::ZERO <= self.sale_quantity && self.sale_quantity <= self.quantity
    }
}

/// One line of a restocking purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestockItem {
    /// Product name; matched against existing products of the company.
    pub name: String,
    /// Price paid per unit.
    pub purchase_price: Decimal,
    /// Price charged per unit.
    pub sale_price: Decimal,
    /// Quantity bought.
    pub quantity: Decimal,
    /// Unit.
    pub unit: UnitOfMeasure,
}

/// One line of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleItem {
    /// The product.
    pub product_id: ProductId,
    /// Quantity sold.
    pub quantity: Decimal,
}

/// Outcome of a restock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Restocked {
    /// Created or updated products, one per line.
    pub products: Vec<Product>,
    /// Line snapshots.
    pub lines: Vec<InvoiceLine>,
    /// Total cost under the configured line-total policy.
    pub total_cost: Decimal,
}

/// Outcome of a sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sold {
    /// Updated products, one per line.
    pub products: Vec<Product>,
    /// Line snapshots with the sold quantities.
    pub lines: Vec<InvoiceLine>,
    /// Total charge under the configured line-total policy.
    pub total_charge: Decimal,
}
