//! Product stock movements.
//!
//! Restocking adds to stock; selling takes from the portion released for
//! sale. Every movement keeps `0 <= sale_quantity <= quantity`.

pub mod service;
pub mod totals;
pub mod types;

#[cfg(test)]
mod service_props;

pub use service::InventoryLedger;
pub use totals::LineTotal;
pub use types::{Product, RestockItem, Restocked, SaleItem, Sold, UnitOfMeasure};
