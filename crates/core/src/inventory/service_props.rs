//! Property-based tests for InventoryLedger.
//!
//! - Stock bound: 0 <= sale_quantity <= quantity after any movement
//! - Failed movements leave the product untouched

use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::{CompanyId, ProductId, UserId};

use super::service::InventoryLedger;
use super::types::{Product, RestockItem, UnitOfMeasure};

#[derive(Debug, Clone)]
enum Movement {
    Restock(Decimal),
    Sell(Decimal),
    Release(Decimal),
}

fn quantity() -> impl Strategy<Value = Decimal> {
    (-10i64..20_000i64).prop_map(|mills| Decimal::new(mills, 3))
}

fn movement() -> impl Strategy<Value = Movement> {
    prop_oneof![
        quantity().prop_map(Movement::Restock),
        quantity().prop_map(Movement::Sell),
        quantity().prop_map(Movement::Release),
    ]
}

proptest! {
    #[test]
    fn prop_stock_bound_holds(movements in prop::collection::vec(movement(), 1..60)) {
        let mut product = Product {
            id: ProductId::new(),
            company_id: CompanyId::new(),
            owner_id: UserId::new(),
            name: "Rice".to_string(),
            purchase_price: Decimal::ONE,
            sale_price: Decimal::TWO,
            quantity: Decimal::ZERO,
            sale_quantity: Decimal::ZERO,
            unit: UnitOfMeasure::Kilogram,
        };

        for movement in movements {
            let before = product.clone();
            let result = match movement {
                Movement::Restock(quantity) => {
                    let item = RestockItem {
                        name: "Rice".to_string(),
                        purchase_price: Decimal::ONE,
                        sale_price: Decimal::TWO,
                        quantity,
                        unit: UnitOfMeasure::Kilogram,
                    };
                    InventoryLedger::validate_restock(&item)
                        .and_then(|()| InventoryLedger::apply_restock(&mut product, &item))
                }
                Movement::Sell(quantity) => {
                    InventoryLedger::take_for_sale(&mut product, quantity).map(|_| ())
                }
                Movement::Release(quantity) => InventoryLedger::release(&mut product, quantity),
            };

            if result.is_err() {
                prop_assert_eq!(&product, &before);
            }
            prop_assert!(product.stock_is_consistent());
        }
    }
}
