//! Income and expense records.

pub mod service;
pub mod types;

pub use service::FinanceRecorder;
pub use types::{FinanceRecord, Recorded};
