//! Persistence seam.
//!
//! The engine only talks to storage through [`Store`] and [`StoreTx`]. A
//! transaction is all-or-nothing: dropping it without [`StoreTx::commit`]
//! discards every write. Savepoints nest units of work inside it.
//!
//! Loads ending in `_for_update` lock the row until the transaction ends.
//! Updates of balances and budgets are conditional on the previous `version`
//! and fail with [`StoreError::Conflict`] when another writer got there first.

mod error;
pub mod memory;

pub use error::StoreError;
pub use memory::MemoryStore;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tally_shared::types::{BalanceId, BudgetId, CompanyId, InvoiceId, ProductId, UserId, WorkerId};
use tally_shared::types::Period;

use crate::balance::{Balance, BalanceHistoryEntry, BalanceOwner};
use crate::budget::{Budget, BudgetHistoryEntry};
use crate::directory::{Company, User, Worker};
use crate::finance::FinanceRecord;
use crate::inventory::Product;
use crate::invoice::Invoice;

/// Largest magnitude (exclusive) a stored amount or quantity may have.
///
/// Columns are `NUMERIC(20,3)`: 17 integer digits.
pub const NUMERIC_LIMIT: Decimal = Decimal::from_parts(1_569_325_056, 23_283_064, 0, false, 0);

/// Decimal places a stored amount or quantity keeps.
pub const NUMERIC_SCALE: u32 = 3;

/// Whether `value` needs no more than [`NUMERIC_SCALE`] decimal places.
///
/// Trailing zeros do not count: `1.5000` fits.
#[must_use]
pub fn fits_scale(value: Decimal) -> bool {
    value.normalize().scale() <= NUMERIC_SCALE
}

/// Fails with [`StoreError::OutOfRange`] if `value` does not fit a column,
/// either by magnitude or by decimal places.
pub fn ensure_fits(column: &str, value: Decimal) -> Result<(), StoreError> {
    if value.abs() >= NUMERIC_LIMIT {
        return Err(StoreError::OutOfRange(column.to_string()));
    }
    if !fits_scale(value) {
        return Err(StoreError::OutOfRange(format!(
            "{column} has more than {NUMERIC_SCALE} decimal places"
        )));
    }
    Ok(())
}

/// A transactional store.
#[async_trait]
pub trait Store: Send + Sync {
    /// The transaction type.
    type Tx: StoreTx;

    /// Starts a transaction.
    async fn begin(&self) -> Result<Self::Tx, StoreError>;
}

/// An open transaction with typed per-entity access.
#[async_trait]
pub trait StoreTx: Send + Sized {
    // ========== Unit of Work ==========
    /// Persists every write.
    async fn commit(self) -> Result<(), StoreError>;

    /// Discards every write.
    async fn rollback(self) -> Result<(), StoreError>;

    /// Opens a nested unit of work.
    async fn savepoint(&mut self, name: &str) -> Result<(), StoreError>;

    /// Keeps the writes since `name` and closes the savepoint.
    async fn release_savepoint(&mut self, name: &str) -> Result<(), StoreError>;

    /// Discards the writes since `name`. The savepoint stays open.
    async fn rollback_to_savepoint(&mut self, name: &str) -> Result<(), StoreError>;

    // ========== Directory ==========
    /// Loads a user.
    async fn find_user(&mut self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Inserts a user.
    async fn insert_user(&mut self, user: &User) -> Result<(), StoreError>;

    /// Overwrites a user.
    async fn update_user(&mut self, user: &User) -> Result<(), StoreError>;

    /// Loads a company.
    async fn find_company(&mut self, id: CompanyId) -> Result<Option<Company>, StoreError>;

    /// Inserts a company.
    async fn insert_company(&mut self, company: &Company) -> Result<(), StoreError>;

    /// Loads a worker.
    async fn find_worker(&mut self, id: WorkerId) -> Result<Option<Worker>, StoreError>;

    /// Inserts a worker.
    async fn insert_worker(&mut self, worker: &Worker) -> Result<(), StoreError>;

    // ========== Balances ==========
    /// Loads and locks the owner's balance.
    async fn find_balance_for_update(
        &mut self,
        owner: BalanceOwner,
    ) -> Result<Option<Balance>, StoreError>;

    /// Inserts a balance.
    async fn insert_balance(&mut self, balance: &Balance) -> Result<(), StoreError>;

    /// Writes `balance` if the stored version is `balance.version - 1`.
    async fn update_balance(&mut self, balance: &Balance) -> Result<(), StoreError>;

    /// Appends a history entry.
    async fn insert_balance_history(
        &mut self,
        entry: &BalanceHistoryEntry,
    ) -> Result<(), StoreError>;

    /// Lists a balance's history in version order, optionally limited to
    /// entries occurring within `period`.
    async fn list_balance_history(
        &mut self,
        balance_id: BalanceId,
        period: Option<Period>,
    ) -> Result<Vec<BalanceHistoryEntry>, StoreError>;

    // ========== Budgets ==========
    /// Loads and locks the company's budget.
    async fn find_budget_for_update(
        &mut self,
        company_id: CompanyId,
    ) -> Result<Option<Budget>, StoreError>;

    /// Inserts a budget.
    async fn insert_budget(&mut self, budget: &Budget) -> Result<(), StoreError>;

    /// Writes `budget` if the stored version is `budget.version - 1`.
    async fn update_budget(&mut self, budget: &Budget) -> Result<(), StoreError>;

    /// Appends a history entry.
    async fn insert_budget_history(&mut self, entry: &BudgetHistoryEntry)
    -> Result<(), StoreError>;

    /// Lists a budget's history in version order, optionally limited to
    /// entries occurring within `period`.
    async fn list_budget_history(
        &mut self,
        budget_id: BudgetId,
        period: Option<Period>,
    ) -> Result<Vec<BudgetHistoryEntry>, StoreError>;

    // ========== Finances ==========
    /// Inserts a finance record.
    async fn insert_finance(&mut self, finance: &FinanceRecord) -> Result<(), StoreError>;

    /// Lists a company's finance records occurring within `period`, oldest
    /// first.
    async fn list_finances(
        &mut self,
        company_id: CompanyId,
        period: Period,
    ) -> Result<Vec<FinanceRecord>, StoreError>;

    // ========== Products ==========
    /// Loads and locks a product.
    async fn find_product_for_update(
        &mut self,
        id: ProductId,
    ) -> Result<Option<Product>, StoreError>;

    /// Loads and locks a company's product by name.
    async fn find_product_by_name_for_update(
        &mut self,
        company_id: CompanyId,
        name: &str,
    ) -> Result<Option<Product>, StoreError>;

    /// Inserts a product.
    async fn insert_product(&mut self, product: &Product) -> Result<(), StoreError>;

    /// Overwrites a product.
    async fn update_product(&mut self, product: &Product) -> Result<(), StoreError>;

    /// Lists a company's products with stock left, by name.
    async fn list_products_in_stock(
        &mut self,
        company_id: CompanyId,
    ) -> Result<Vec<Product>, StoreError>;

    // ========== Invoices ==========
    /// Inserts an invoice with its lines.
    async fn insert_invoice(&mut self, invoice: &Invoice) -> Result<(), StoreError>;

    /// Loads an invoice with its lines.
    async fn find_invoice(&mut self, id: InvoiceId) -> Result<Option<Invoice>, StoreError>;

    /// Lists a company's invoices, newest first.
    async fn list_company_invoices(
        &mut self,
        company_id: CompanyId,
    ) -> Result<Vec<Invoice>, StoreError>;

    /// Lists invoices bought by `buyer_id`, newest first.
    async fn list_buyer_invoices(&mut self, buyer_id: UserId) -> Result<Vec<Invoice>, StoreError>;
}
