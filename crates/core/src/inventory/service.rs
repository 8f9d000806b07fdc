//! The inventory ledger.

use rust_decimal::Decimal;
use tally_shared::types::{CompanyId, ProductId, UserId, WorkerId};
use tracing::debug;

use super::totals::{LineTotal, line_amount};
use super::types::{Product, RestockItem, Restocked, SaleItem, Sold};
use crate::error::{LedgerError, LedgerResult};
use crate::invoice::InvoiceLine;
use crate::store::{StoreTx, fits_scale};

/// Moves product stock for purchases, sales, and releases.
#[derive(Debug, Clone, Copy, Default)]
pub struct InventoryLedger {
    line_total: LineTotal,
}

impl InventoryLedger {
    /// Creates a ledger totalling invoices with `line_total`.
    #[must_use]
    pub const fn new(line_total: LineTotal) -> Self {
        Self { line_total }
    }

    /// The configured total policy.
    #[must_use]
    pub const fn line_total(&self) -> LineTotal {
        self.line_total
    }

    /// Checks one restock line.
    pub fn validate_restock(item: &RestockItem) -> LedgerResult<()> {
        if item.name.trim().is_empty() {
            return Err(LedgerError::Validation("product name is empty".to_string()));
        }
        if item.quantity <= Decimal::ZERO || !fits_scale(item.quantity) {
            return Err(LedgerError::InvalidQuantity(item.quantity));
        }
        for price in [item.purchase_price, item.sale_price] {
            if price < Decimal::ZERO {
                return Err(LedgerError::NegativePrice(price));
            }
            if !fits_scale(price) {
                return Err(LedgerError::InvalidAmount(price));
            }
        }
        Ok(())
    }

    /// A product first stocked by `item`. Nothing is released for sale yet.
    #[must_use]
    pub fn new_product(company_id: CompanyId, owner_id: UserId, item: &RestockItem) -> Product {
        Product {
            id: ProductId::new(),
            company_id,
            owner_id,
            name: item.name.clone(),
            purchase_price: item.purchase_price,
            sale_price: item.sale_price,
            quantity: item.quantity,
            sale_quantity: Decimal::ZERO,
            unit: item.unit,
        }
    }

    /// Restocks an existing product: prices and unit are overwritten, the
    /// quantity is added to both stock and the sellable portion.
    pub fn apply_restock(product: &mut Product, item: &RestockItem) -> LedgerResult<()> {
        let overflow = || LedgerError::OutOfRange(format!("stock of {}", product.name));
        let quantity = product.quantity.checked_add(item.quantity).ok_or_else(overflow)?;
        let sale_quantity = product
            .sale_quantity
            .checked_add(item.quantity)
            .ok_or_else(overflow)?;

        product.purchase_price = item.purchase_price;
        product.sale_price = item.sale_price;
        product.unit = item.unit;
        product.quantity = quantity;
        product.sale_quantity = sale_quantity;
        Ok(())
    }

    /// Takes `quantity` out of the sellable stock and returns the sold line.
    ///
    /// `product` is left untouched on error.
    pub fn take_for_sale(product: &mut Product, quantity: Decimal) -> LedgerResult<InvoiceLine> {
        if quantity <= Decimal::ZERO || !fits_scale(quantity) {
            return Err(LedgerError::InvalidQuantity(quantity));
        }
        if product.sale_quantity <= Decimal::ZERO {
            return Err(LedgerError::OutOfStock {
                product: product.name.clone(),
            });
        }
        if product.sale_quantity < quantity {
            return Err(LedgerError::InsufficientStock {
                product: product.name.clone(),
                requested: quantity,
                available: product.sale_quantity,
            });
        }

        let amount = line_amount(product.sale_price, quantity)?;
        product.quantity -= quantity;
        product.sale_quantity -= quantity;

        Ok(InvoiceLine {
            product_id: product.id,
            name: product.name.clone(),
            quantity,
            unit_price: product.sale_price,
            amount,
        })
    }

    /// Moves `quantity` of stock into the sellable portion.
    pub fn release(product: &mut Product, quantity: Decimal) -> LedgerResult<()> {
        if quantity <= Decimal::ZERO || !fits_scale(quantity) {
            return Err(LedgerError::InvalidQuantity(quantity));
        }
        let unreleased = product.quantity - product.sale_quantity;
        if unreleased < quantity {
            return Err(LedgerError::InsufficientStock {
                product: product.name.clone(),
                requested: quantity,
                available: unreleased,
            });
        }
        product.sale_quantity += quantity;
        Ok(())
    }

    /// Creates or restocks one product per item for `company_id`.
    pub async fn restock<T: StoreTx>(
        &self,
        tx: &mut T,
        company_id: CompanyId,
        owner_id: UserId,
        items: &[RestockItem],
    ) -> LedgerResult<Restocked> {
        if items.is_empty() {
            return Err(LedgerError::EmptyInvoice);
        }
        items.iter().try_for_each(Self::validate_restock)?;

        let mut products = Vec::with_capacity(items.len());
        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            let product = match tx.find_product_by_name_for_update(company_id, &item.name).await? {
                Some(mut existing) => {
                    Self::apply_restock(&mut existing, item)?;
                    tx.update_product(&existing).await?;
                    existing
                }
                None => {
                    let created = Self::new_product(company_id, owner_id, item);
                    tx.insert_product(&created).await?;
                    created
                }
            };
            debug!(
                product_id = %product.id,
                quantity = %item.quantity,
                stock = %product.quantity,
                "Product restocked"
            );

            lines.push(InvoiceLine {
                product_id: product.id,
                name: product.name.clone(),
                quantity: item.quantity,
                unit_price: item.purchase_price,
                amount: line_amount(item.purchase_price, item.quantity)?,
            });
            products.push(product);
        }

        let total_cost = self.line_total.total(&lines)?;
        Ok(Restocked {
            products,
            lines,
            total_cost,
        })
    }

    /// Sells each item from `company_id`'s stock.
    ///
    /// Products of other companies are reported as not found.
    pub async fn sell<T: StoreTx>(
        &self,
        tx: &mut T,
        company_id: CompanyId,
        worker_id: WorkerId,
        items: &[SaleItem],
    ) -> LedgerResult<Sold> {
        if items.is_empty() {
            return Err(LedgerError::EmptyInvoice);
        }

        let mut products = Vec::with_capacity(items.len());
        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            let mut product = load_owned(tx, company_id, item.product_id).await?;
            let line = Self::take_for_sale(&mut product, item.quantity)?;
            tx.update_product(&product).await?;
            debug!(
                product_id = %product.id,
                %worker_id,
                sold = %item.quantity,
                remaining = %product.sale_quantity,
                "Product sold"
            );
            lines.push(line);
            products.push(product);
        }

        let total_charge = self.line_total.total(&lines)?;
        Ok(Sold {
            products,
            lines,
            total_charge,
        })
    }

    /// Releases `quantity` of a product's stock for sale.
    pub async fn release_for_sale<T: StoreTx>(
        &self,
        tx: &mut T,
        company_id: CompanyId,
        product_id: ProductId,
        quantity: Decimal,
    ) -> LedgerResult<Product> {
        let mut product = load_owned(tx, company_id, product_id).await?;
        Self::release(&mut product, quantity)?;
        tx.update_product(&product).await?;
        Ok(product)
    }
}

async fn load_owned<T: StoreTx>(
    tx: &mut T,
    company_id: CompanyId,
    product_id: ProductId,
) -> LedgerResult<Product> {
    tx.find_product_for_update(product_id)
        .await?
        .filter(|product| product.company_id == company_id)
        .ok_or(LedgerError::ProductNotFound(product_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::UnitOfMeasure;
    use rust_decimal_macros::dec;

    fn product(quantity: Decimal, sale_quantity: Decimal, sale_price: Decimal) -> Product {
        Product {
            id: ProductId::new(),
            company_id: CompanyId::new(),
            owner_id: UserId::new(),
            name: "Widget".to_string(),
            purchase_price: dec!(3.00),
            sale_price,
            quantity,
            sale_quantity,
            unit: UnitOfMeasure::Pieces,
        }
    }

    fn restock_item(name: &str, quantity: Decimal) -> RestockItem {
        RestockItem {
            name: name.to_string(),
            purchase_price: dec!(2.50),
            sale_price: dec!(4.00),
            quantity,
            unit: UnitOfMeasure::Kilogram,
        }
    }

    #[test]
    fn test_sale_decrements_both_quantities() {
        let mut widget = product(dec!(10), dec!(10), dec!(5.00));
        let line = InventoryLedger::take_for_sale(&mut widget, dec!(4)).unwrap();

        assert_eq!(widget.quantity, dec!(6));
        assert_eq!(widget.sale_quantity, dec!(6));
        assert_eq!(line.quantity, dec!(4));
        assert_eq!(line.amount, dec!(20.00));
    }

    #[test]
    fn test_sale_beyond_available_is_insufficient() {
        let mut widget = product(dec!(10), dec!(3), dec!(5.00));
        let before = widget.clone();
        let err = InventoryLedger::take_for_sale(&mut widget, dec!(4)).unwrap_err();

        assert!(matches!(
            err,
            LedgerError::InsufficientStock { ref product, requested, available }
                if product == "Widget" && requested == dec!(4) && available == dec!(3)
        ));
        assert_eq!(widget, before);
    }

    #[test]
    fn test_sale_with_nothing_released_is_out_of_stock() {
        let mut widget = product(dec!(10), dec!(0), dec!(5.00));
        let err = InventoryLedger::take_for_sale(&mut widget, dec!(1)).unwrap_err();
        assert!(matches!(err, LedgerError::OutOfStock { .. }));
    }

    #[test]
    fn test_new_product_starts_unreleased() {
        let item = restock_item("Flour", dec!(25));
        let created = InventoryLedger::new_product(CompanyId::new(), UserId::new(), &item);
        assert_eq!(created.quantity, dec!(25));
        assert_eq!(created.sale_quantity, dec!(0));
    }

    #[test]
    fn test_restock_adds_to_both_quantities_and_overwrites_prices() {
        let mut widget = product(dec!(6), dec!(2), dec!(5.00));
        InventoryLedger::apply_restock(&mut widget, &restock_item("Widget", dec!(4))).unwrap();

        assert_eq!(widget.quantity, dec!(10));
        assert_eq!(widget.sale_quantity, dec!(6));
        assert_eq!(widget.sale_price, dec!(4.00));
        assert_eq!(widget.unit, UnitOfMeasure::Kilogram);
    }

    #[test]
    fn test_release_is_bounded_by_stock() {
        let mut widget = product(dec!(10), dec!(7), dec!(1));
        InventoryLedger::release(&mut widget, dec!(3)).unwrap();
        assert_eq!(widget.sale_quantity, dec!(10));

        let err = InventoryLedger::release(&mut widget, dec!(0.5)).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientStock { .. }));
    }

    #[test]
    fn test_restock_validation() {
        assert!(matches!(
            InventoryLedger::validate_restock(&restock_item("  ", dec!(1))),
            Err(LedgerError::Validation(_))
        ));
        assert!(matches!(
            InventoryLedger::validate_restock(&restock_item("Salt", dec!(0))),
            Err(LedgerError::InvalidQuantity(_))
        ));
        let mut negative = restock_item("Salt", dec!(1));
        negative.sale_price = dec!(-1);
        assert!(matches!(
            InventoryLedger::validate_restock(&negative),
            Err(LedgerError::NegativePrice(_))
        ));
    }

    #[test]
    fn test_values_finer_than_stored_scale_are_rejected() {
        assert!(matches!(
            InventoryLedger::validate_restock(&restock_item("Salt", dec!(1.0005))),
            Err(LedgerError::InvalidQuantity(_))
        ));
        let mut fine_price = restock_item("Salt", dec!(1));
        fine_price.purchase_price = dec!(0.1234);
        assert!(matches!(
            InventoryLedger::validate_restock(&fine_price),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert!(InventoryLedger::validate_restock(&restock_item("Salt", dec!(1.5000))).is_ok());

        let mut widget = product(dec!(10), dec!(10), dec!(5.00));
        let before = widget.clone();
        assert!(matches!(
            InventoryLedger::take_for_sale(&mut widget, dec!(0.0004)),
            Err(LedgerError::InvalidQuantity(_))
        ));
        assert!(matches!(
            InventoryLedger::release(&mut widget, dec!(0.0001)),
            Err(LedgerError::InvalidQuantity(_))
        ));
        assert_eq!(widget, before);
    }
}
