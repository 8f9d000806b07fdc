//! In-memory store.
//!
//! Transactions are serialized: [`MemoryStore::begin`] takes the store's
//! lock and holds it until the transaction is committed, rolled back, or
//! dropped. Each transaction works on a private copy of the tables, so
//! dropping it discards every write.
//!
//! The unique, foreign-key, and numeric-range constraints of the relational
//! schema are enforced here too, and every committed write is journaled so
//! tests can count them.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tally_shared::types::{
    BalanceId, BudgetId, CompanyId, FinanceId, InvoiceId, Period, ProductId, UserId, WorkerId,
};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{Store, StoreError, StoreTx, ensure_fits};
use crate::balance::{Balance, BalanceHistoryEntry, BalanceOwner};
use crate::budget::{Budget, BudgetHistoryEntry};
use crate::directory::{Company, User, Worker};
use crate::finance::FinanceRecord;
use crate::inventory::Product;
use crate::invoice::Invoice;
use crate::primitives::LedgerLink;

/// A table of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    /// Users.
    Users,
    /// Companies.
    Companies,
    /// Workers.
    Workers,
    /// Balances.
    Balances,
    /// Balance history.
    BalanceHistory,
    /// Budgets.
    Budgets,
    /// Budget history.
    BudgetHistory,
    /// Finance records.
    Finances,
    /// Products.
    Products,
    /// Invoices, lines included.
    Invoices,
}

/// One journaled write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Write {
    /// A row was inserted.
    Insert(Table),
    /// A row was updated.
    Update(Table),
}

#[derive(Debug, Clone, Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    companies: BTreeMap<CompanyId, Company>,
    workers: BTreeMap<WorkerId, Worker>,
    balances: BTreeMap<BalanceId, Balance>,
    balance_history: Vec<BalanceHistoryEntry>,
    budgets: BTreeMap<BudgetId, Budget>,
    budget_history: Vec<BudgetHistoryEntry>,
    finances: BTreeMap<FinanceId, FinanceRecord>,
    products: BTreeMap<ProductId, Product>,
    invoices: BTreeMap<InvoiceId, Invoice>,
}

#[derive(Debug, Default)]
struct State {
    tables: Tables,
    journal: Vec<Vec<Write>>,
}

/// A [`Store`] keeping everything in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The writes of every committed transaction, oldest first.
    ///
    /// Waits for any open transaction to finish.
    pub async fn journal(&self) -> Vec<Vec<Write>> {
        self.state.lock().await.journal.clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx, StoreError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.tables.clone();
        Ok(MemoryTx {
            guard,
            working,
            writes: Vec::new(),
            savepoints: Vec::new(),
        })
    }
}

#[derive(Debug)]
struct Savepoint {
    name: String,
    tables: Tables,
    writes: usize,
}

/// A transaction of a [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryTx {
    guard: OwnedMutexGuard<State>,
    working: Tables,
    writes: Vec<Write>,
    savepoints: Vec<Savepoint>,
}

fn duplicate(constraint: &str) -> StoreError {
    StoreError::DuplicateKey(constraint.to_string())
}

fn dangling(constraint: &str) -> StoreError {
    StoreError::DanglingReference(constraint.to_string())
}

fn missing_row(table: &str) -> StoreError {
    StoreError::Backend(format!("no such row in {table}"))
}

impl MemoryTx {
    fn savepoint_index(&self, name: &str) -> Result<usize, StoreError> {
        self.savepoints
            .iter()
            .rposition(|savepoint| savepoint.name == name)
            .ok_or_else(|| StoreError::Backend(format!("savepoint \"{name}\" does not exist")))
    }

    fn check_user(&self, user: &User) -> Result<(), StoreError> {
        let clash = |other: &&User| other.id != user.id;
        if self
            .working
            .users
            .values()
            .filter(clash)
            .any(|other| other.username == user.username)
        {
            return Err(duplicate("users_username_key"));
        }
        if self
            .working
            .users
            .values()
            .filter(clash)
            .any(|other| other.email == user.email)
        {
            return Err(duplicate("users_email_key"));
        }
        if let Some(company_id) = user.company_id {
            if !self.working.companies.contains_key(&company_id) {
                return Err(dangling("users_company_id_fkey"));
            }
        }
        if let Some(worker_id) = user.worker_id {
            if !self.working.workers.contains_key(&worker_id) {
                return Err(dangling("users_worker_id_fkey"));
            }
        }
        Ok(())
    }

    fn check_balance_owner(&self, owner: BalanceOwner) -> Result<(), StoreError> {
        match owner {
            BalanceOwner::User(id) if !self.working.users.contains_key(&id) => {
                Err(dangling("balances_user_id_fkey"))
            }
            BalanceOwner::Company(id) if !self.working.companies.contains_key(&id) => {
                Err(dangling("balances_company_id_fkey"))
            }
            _ => Ok(()),
        }
    }

    fn check_link(&self, table: &str, link: LedgerLink) -> Result<(), StoreError> {
        match link {
            LedgerLink::Invoice(id) if !self.working.invoices.contains_key(&id) => {
                Err(dangling(&format!("{table}_invoice_id_fkey")))
            }
            LedgerLink::Finance(id) if !self.working.finances.contains_key(&id) => {
                Err(dangling(&format!("{table}_finance_id_fkey")))
            }
            _ => Ok(()),
        }
    }

    fn check_product(&self, product: &Product) -> Result<(), StoreError> {
        if self.working.products.values().any(|other| {
            other.id != product.id
                && other.company_id == product.company_id
                && other.name == product.name
        }) {
            return Err(duplicate("products_company_id_name_key"));
        }
        if !self.working.companies.contains_key(&product.company_id) {
            return Err(dangling("products_company_id_fkey"));
        }
        if !self.working.users.contains_key(&product.owner_id) {
            return Err(dangling("products_owner_id_fkey"));
        }
        ensure_fits("products.purchase_price", product.purchase_price)?;
        ensure_fits("products.sale_price", product.sale_price)?;
        ensure_fits("products.quantity", product.quantity)?;
        ensure_fits("products.sale_quantity", product.sale_quantity)
    }

    fn check_budget_figures(budget: &Budget) -> Result<(), StoreError> {
        ensure_fits("budgets.income", budget.income)?;
        ensure_fits("budgets.expense", budget.expense)?;
        ensure_fits("budgets.profit", budget.profit)
    }
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn commit(mut self) -> Result<(), StoreError> {
        self.guard.tables = self.working;
        self.guard.journal.push(self.writes);
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn savepoint(&mut self, name: &str) -> Result<(), StoreError> {
        self.savepoints.push(Savepoint {
            name: name.to_string(),
            tables: self.working.clone(),
            writes: self.writes.len(),
        });
        Ok(())
    }

    async fn release_savepoint(&mut self, name: &str) -> Result<(), StoreError> {
        let index = self.savepoint_index(name)?;
        self.savepoints.truncate(index);
        Ok(())
    }

    async fn rollback_to_savepoint(&mut self, name: &str) -> Result<(), StoreError> {
        let index = self.savepoint_index(name)?;
        self.savepoints.truncate(index + 1);
        let savepoint = &self.savepoints[index];
        self.working = savepoint.tables.clone();
        self.writes.truncate(savepoint.writes);
        Ok(())
    }

    async fn find_user(&mut self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.working.users.get(&id).cloned())
    }

    async fn insert_user(&mut self, user: &User) -> Result<(), StoreError> {
        if self.working.users.contains_key(&user.id) {
            return Err(duplicate("users_pkey"));
        }
        self.check_user(user)?;
        self.working.users.insert(user.id, user.clone());
        self.writes.push(Write::Insert(Table::Users));
        Ok(())
    }

    async fn update_user(&mut self, user: &User) -> Result<(), StoreError> {
        if !self.working.users.contains_key(&user.id) {
            return Err(missing_row("users"));
        }
        self.check_user(user)?;
        self.working.users.insert(user.id, user.clone());
        self.writes.push(Write::Update(Table::Users));
        Ok(())
    }

    async fn find_company(&mut self, id: CompanyId) -> Result<Option<Company>, StoreError> {
        Ok(self.working.companies.get(&id).cloned())
    }

    async fn insert_company(&mut self, company: &Company) -> Result<(), StoreError> {
        if self.working.companies.contains_key(&company.id) {
            return Err(duplicate("companies_pkey"));
        }
        if self
            .working
            .companies
            .values()
            .any(|other| other.name == company.name)
        {
            return Err(duplicate("companies_name_key"));
        }
        self.working.companies.insert(company.id, company.clone());
        self.writes.push(Write::Insert(Table::Companies));
        Ok(())
    }

    async fn find_worker(&mut self, id: WorkerId) -> Result<Option<Worker>, StoreError> {
        Ok(self.working.workers.get(&id).cloned())
    }

    async fn insert_worker(&mut self, worker: &Worker) -> Result<(), StoreError> {
        if self.working.workers.contains_key(&worker.id) {
            return Err(duplicate("workers_pkey"));
        }
        if !self.working.companies.contains_key(&worker.company_id) {
            return Err(dangling("workers_company_id_fkey"));
        }
        if let Some(user_id) = worker.user_id {
            if !self.working.users.contains_key(&user_id) {
                return Err(dangling("workers_user_id_fkey"));
            }
        }
        self.working.workers.insert(worker.id, worker.clone());
        self.writes.push(Write::Insert(Table::Workers));
        Ok(())
    }

    async fn find_balance_for_update(
        &mut self,
        owner: BalanceOwner,
    ) -> Result<Option<Balance>, StoreError> {
        Ok(self
            .working
            .balances
            .values()
            .find(|balance| balance.owner == owner)
            .cloned())
    }

    async fn insert_balance(&mut self, balance: &Balance) -> Result<(), StoreError> {
        if self.working.balances.contains_key(&balance.id) {
            return Err(duplicate("balances_pkey"));
        }
        if self
            .working
            .balances
            .values()
            .any(|other| other.owner == balance.owner)
        {
            return Err(duplicate(match balance.owner {
                BalanceOwner::User(_) => "balances_user_id_key",
                BalanceOwner::Company(_) => "balances_company_id_key",
            }));
        }
        self.check_balance_owner(balance.owner)?;
        self.check_link("balances", balance.last_link)?;
        ensure_fits("balances.amount", balance.amount)?;
        self.working.balances.insert(balance.id, balance.clone());
        self.writes.push(Write::Insert(Table::Balances));
        Ok(())
    }

    async fn update_balance(&mut self, balance: &Balance) -> Result<(), StoreError> {
        let stored = self
            .working
            .balances
            .get(&balance.id)
            .ok_or_else(|| missing_row("balances"))?;
        if stored.version != balance.version - 1 {
            return Err(StoreError::Conflict(format!(
                "balance {} is at version {}, expected {}",
                balance.id,
                stored.version,
                balance.version - 1
            )));
        }
        self.check_link("balances", balance.last_link)?;
        ensure_fits("balances.amount", balance.amount)?;
        self.working.balances.insert(balance.id, balance.clone());
        self.writes.push(Write::Update(Table::Balances));
        Ok(())
    }

    async fn insert_balance_history(
        &mut self,
        entry: &BalanceHistoryEntry,
    ) -> Result<(), StoreError> {
        if !self.working.balances.contains_key(&entry.balance_id) {
            return Err(dangling("balance_history_balance_id_fkey"));
        }
        if self
            .working
            .balance_history
            .iter()
            .any(|other| other.balance_id == entry.balance_id && other.version == entry.version)
        {
            return Err(duplicate("balance_history_balance_id_version_key"));
        }
        self.check_link("balance_history", entry.link)?;
        ensure_fits("balance_history.prev_amount", entry.prev_amount)?;
        ensure_fits("balance_history.delta_amount", entry.delta_amount)?;
        self.working.balance_history.push(entry.clone());
        self.writes.push(Write::Insert(Table::BalanceHistory));
        Ok(())
    }

    async fn list_balance_history(
        &mut self,
        balance_id: BalanceId,
        period: Option<Period>,
    ) -> Result<Vec<BalanceHistoryEntry>, StoreError> {
        let mut entries: Vec<_> = self
            .working
            .balance_history
            .iter()
            .filter(|entry| entry.balance_id == balance_id)
            .filter(|entry| period.is_none_or(|period| period.contains(entry.occurred_at)))
            .cloned()
            .collect();
        entries.sort_by_key(|entry| entry.version);
        Ok(entries)
    }

    async fn find_budget_for_update(
        &mut self,
        company_id: CompanyId,
    ) -> Result<Option<Budget>, StoreError> {
        Ok(self
            .working
            .budgets
            .values()
            .find(|budget| budget.company_id == company_id)
            .cloned())
    }

    async fn insert_budget(&mut self, budget: &Budget) -> Result<(), StoreError> {
        if self.working.budgets.contains_key(&budget.id) {
            return Err(duplicate("budgets_pkey"));
        }
        if self
            .working
            .budgets
            .values()
            .any(|other| other.company_id == budget.company_id)
        {
            return Err(duplicate("budgets_company_id_key"));
        }
        if !self.working.companies.contains_key(&budget.company_id) {
            return Err(dangling("budgets_company_id_fkey"));
        }
        Self::check_budget_figures(budget)?;
        self.working.budgets.insert(budget.id, budget.clone());
        self.writes.push(Write::Insert(Table::Budgets));
        Ok(())
    }

    async fn update_budget(&mut self, budget: &Budget) -> Result<(), StoreError> {
        let stored = self
            .working
            .budgets
            .get(&budget.id)
            .ok_or_else(|| missing_row("budgets"))?;
        if stored.version != budget.version - 1 {
            return Err(StoreError::Conflict(format!(
                "budget {} is at version {}, expected {}",
                budget.id,
                stored.version,
                budget.version - 1
            )));
        }
        if let Some(finance_id) = budget.last_finance {
            if !self.working.finances.contains_key(&finance_id) {
                return Err(dangling("budgets_last_finance_id_fkey"));
            }
        }
        Self::check_budget_figures(budget)?;
        self.working.budgets.insert(budget.id, budget.clone());
        self.writes.push(Write::Update(Table::Budgets));
        Ok(())
    }

    async fn insert_budget_history(
        &mut self,
        entry: &BudgetHistoryEntry,
    ) -> Result<(), StoreError> {
        if !self.working.budgets.contains_key(&entry.budget_id) {
            return Err(dangling("budget_history_budget_id_fkey"));
        }
        if !self.working.finances.contains_key(&entry.finance_id) {
            return Err(dangling("budget_history_finance_id_fkey"));
        }
        ensure_fits("budget_history.prev_income", entry.prev_income)?;
        ensure_fits("budget_history.prev_expense", entry.prev_expense)?;
        ensure_fits("budget_history.prev_profit", entry.prev_profit)?;
        ensure_fits("budget_history.amount", entry.amount)?;
        self.working.budget_history.push(entry.clone());
        self.writes.push(Write::Insert(Table::BudgetHistory));
        Ok(())
    }

    async fn list_budget_history(
        &mut self,
        budget_id: BudgetId,
        period: Option<Period>,
    ) -> Result<Vec<BudgetHistoryEntry>, StoreError> {
        let mut entries: Vec<_> = self
            .working
            .budget_history
            .iter()
            .filter(|entry| entry.budget_id == budget_id)
            .filter(|entry| period.is_none_or(|period| period.contains(entry.occurred_at)))
            .cloned()
            .collect();
        entries.sort_by_key(|entry| entry.version);
        Ok(entries)
    }

    async fn insert_finance(&mut self, finance: &FinanceRecord) -> Result<(), StoreError> {
        if self.working.finances.contains_key(&finance.id) {
            return Err(duplicate("finances_pkey"));
        }
        if !self.working.companies.contains_key(&finance.company_id) {
            return Err(dangling("finances_company_id_fkey"));
        }
        ensure_fits("finances.amount", finance.amount)?;
        self.working.finances.insert(finance.id, finance.clone());
        self.writes.push(Write::Insert(Table::Finances));
        Ok(())
    }

    async fn list_finances(
        &mut self,
        company_id: CompanyId,
        period: Period,
    ) -> Result<Vec<FinanceRecord>, StoreError> {
        let mut records: Vec<_> = self
            .working
            .finances
            .values()
            .filter(|finance| finance.company_id == company_id)
            .filter(|finance| period.contains(finance.occurred_at))
            .cloned()
            .collect();
        records.sort_by_key(|finance| (finance.occurred_at, finance.id));
        Ok(records)
    }

    async fn find_product_for_update(
        &mut self,
        id: ProductId,
    ) -> Result<Option<Product>, StoreError> {
        Ok(self.working.products.get(&id).cloned())
    }

    async fn find_product_by_name_for_update(
        &mut self,
        company_id: CompanyId,
        name: &str,
    ) -> Result<Option<Product>, StoreError> {
        Ok(self
            .working
            .products
            .values()
            .find(|product| product.company_id == company_id && product.name == name)
            .cloned())
    }

    async fn insert_product(&mut self, product: &Product) -> Result<(), StoreError> {
        if self.working.products.contains_key(&product.id) {
            return Err(duplicate("products_pkey"));
        }
        self.check_product(product)?;
        self.working.products.insert(product.id, product.clone());
        self.writes.push(Write::Insert(Table::Products));
        Ok(())
    }

    async fn update_product(&mut self, product: &Product) -> Result<(), StoreError> {
        if !self.working.products.contains_key(&product.id) {
            return Err(missing_row("products"));
        }
        self.check_product(product)?;
        self.working.products.insert(product.id, product.clone());
        self.writes.push(Write::Update(Table::Products));
        Ok(())
    }

    async fn list_products_in_stock(
        &mut self,
        company_id: CompanyId,
    ) -> Result<Vec<Product>, StoreError> {
        let mut products: Vec<_> = self
            .working
            .products
            .values()
            .filter(|product| product.company_id == company_id && product.quantity > Decimal::ZERO)
            .cloned()
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    async fn insert_invoice(&mut self, invoice: &Invoice) -> Result<(), StoreError> {
        if self.working.invoices.contains_key(&invoice.id) {
            return Err(duplicate("invoices_pkey"));
        }
        if !self.working.companies.contains_key(&invoice.company_id) {
            return Err(dangling("invoices_company_id_fkey"));
        }
        if let Some(buyer_id) = invoice.buyer_id {
            if !self.working.users.contains_key(&buyer_id) {
                return Err(dangling("invoices_buyer_id_fkey"));
            }
        }
        if let Some(worker_id) = invoice.worker_id {
            if !self.working.workers.contains_key(&worker_id) {
                return Err(dangling("invoices_worker_id_fkey"));
            }
        }
        ensure_fits("invoices.to_pay", invoice.to_pay)?;
        for line in &invoice.lines {
            if !self.working.products.contains_key(&line.product_id) {
                return Err(dangling("invoice_lines_product_id_fkey"));
            }
            ensure_fits("invoice_lines.quantity", line.quantity)?;
            ensure_fits("invoice_lines.unit_price", line.unit_price)?;
            ensure_fits("invoice_lines.amount", line.amount)?;
        }
        self.working.invoices.insert(invoice.id, invoice.clone());
        self.writes.push(Write::Insert(Table::Invoices));
        Ok(())
    }

    async fn find_invoice(&mut self, id: InvoiceId) -> Result<Option<Invoice>, StoreError> {
        Ok(self.working.invoices.get(&id).cloned())
    }

    async fn list_company_invoices(
        &mut self,
        company_id: CompanyId,
    ) -> Result<Vec<Invoice>, StoreError> {
        Ok(newest_first(
            self.working
                .invoices
                .values()
                .filter(|invoice| invoice.company_id == company_id),
        ))
    }

    async fn list_buyer_invoices(&mut self, buyer_id: UserId) -> Result<Vec<Invoice>, StoreError> {
        Ok(newest_first(
            self.working
                .invoices
                .values()
                .filter(|invoice| invoice.buyer_id == Some(buyer_id)),
        ))
    }
}

fn newest_first<'a>(invoices: impl Iterator<Item = &'a Invoice>) -> Vec<Invoice> {
    let mut invoices: Vec<_> = invoices.cloned().collect();
    invoices.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at).then(b.id.cmp(&a.id)));
    invoices
}
