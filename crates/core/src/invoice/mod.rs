//! Purchase and sale invoices.

pub mod types;

pub use types::{Invoice, InvoiceKind, InvoiceLine};
