//! PostgreSQL implementation of the ledger store.
//!
//! [`SeaTx`] wraps one database transaction. Rows loaded for mutation are
//! locked with `SELECT ... FOR UPDATE`; balance and budget updates are also
//! conditional on the previous version, so a lost race surfaces as
//! [`StoreError::Conflict`] instead of a silent overwrite.

mod convert;
mod error;

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use tally_core::balance::{Balance, BalanceHistoryEntry, BalanceOwner};
use tally_core::budget::{Budget, BudgetHistoryEntry};
use tally_core::directory::{Company, User, Worker};
use tally_core::finance::FinanceRecord;
use tally_core::inventory::Product;
use tally_core::invoice::Invoice;
use tally_core::store::{Store, StoreError, StoreTx};
use tally_shared::types::{
    BalanceId, BudgetId, CompanyId, InvoiceId, Period, ProductId, UserId, WorkerId,
};
use uuid::Uuid;

use self::convert::{
    balance_from, balance_history_from, balance_history_model, balance_model,
    budget_history_model, budget_model, company_model, finance_model, invoice_from,
    invoice_model, line_models, link_columns, product_model, stamp, user_model, worker_model,
};
use self::error::store_err;
use crate::entities::{
    balance_history, balances, budget_history, budgets, companies, finances, invoice_lines,
    invoices, products, users, workers,
};

/// A [`Store`] backed by a PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct SeaStore {
    db: DatabaseConnection,
}

impl SeaStore {
    /// Wraps an open connection pool.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The underlying connection pool.
    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl Store for SeaStore {
    type Tx = SeaTx;

    async fn begin(&self) -> Result<SeaTx, StoreError> {
        let txn = self.db.begin().await.map_err(store_err)?;
        Ok(SeaTx { txn })
    }
}

/// One database transaction.
pub struct SeaTx {
    txn: DatabaseTransaction,
}

impl SeaTx {
    async fn execute_savepoint(&self, statement: &str, name: &str) -> Result<(), StoreError> {
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(StoreError::Backend(format!(
                "invalid savepoint name \"{name}\""
            )));
        }
        self.txn
            .execute_unprepared(&format!("{statement} {name}"))
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn lines_of(
        &self,
        models: Vec<invoices::Model>,
    ) -> Result<Vec<Invoice>, StoreError> {
        let ids: Vec<Uuid> = models.iter().map(|invoice| invoice.id).collect();
        let mut lines: HashMap<Uuid, Vec<invoice_lines::Model>> = HashMap::new();
        for line in invoice_lines::Entity::find()
            .filter(invoice_lines::Column::InvoiceId.is_in(ids))
            .order_by_asc(invoice_lines::Column::InvoiceId)
            .order_by_asc(invoice_lines::Column::Position)
            .all(&self.txn)
            .await
            .map_err(store_err)?
        {
            lines.entry(line.invoice_id).or_default().push(line);
        }

        Ok(models
            .into_iter()
            .map(|invoice| {
                let invoice_lines = lines.remove(&invoice.id).unwrap_or_default();
                invoice_from(invoice, invoice_lines)
            })
            .collect())
    }
}

fn stale(what: &str, id: impl std::fmt::Display, version: i64) -> StoreError {
    StoreError::Conflict(format!("{what} {id} is no longer at version {}", version - 1))
}

#[async_trait]
impl StoreTx for SeaTx {
    async fn commit(self) -> Result<(), StoreError> {
        self.txn.commit().await.map_err(store_err)
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.txn.rollback().await.map_err(store_err)
    }

    async fn savepoint(&mut self, name: &str) -> Result<(), StoreError> {
        self.execute_savepoint("SAVEPOINT", name).await
    }

    async fn release_savepoint(&mut self, name: &str) -> Result<(), StoreError> {
        self.execute_savepoint("RELEASE SAVEPOINT", name).await
    }

    async fn rollback_to_savepoint(&mut self, name: &str) -> Result<(), StoreError> {
        self.execute_savepoint("ROLLBACK TO SAVEPOINT", name).await
    }

    // ========== Directory ==========

    async fn find_user(&mut self, id: UserId) -> Result<Option<User>, StoreError> {
        let model = users::Entity::find_by_id(Uuid::from(id))
            .one(&self.txn)
            .await
            .map_err(store_err)?;
        Ok(model.map(User::from))
    }

    async fn insert_user(&mut self, user: &User) -> Result<(), StoreError> {
        user_model(user).insert(&self.txn).await.map_err(store_err)?;
        Ok(())
    }

    async fn update_user(&mut self, user: &User) -> Result<(), StoreError> {
        user_model(user).update(&self.txn).await.map_err(store_err)?;
        Ok(())
    }

    async fn find_company(&mut self, id: CompanyId) -> Result<Option<Company>, StoreError> {
        let model = companies::Entity::find_by_id(Uuid::from(id))
            .one(&self.txn)
            .await
            .map_err(store_err)?;
        Ok(model.map(Company::from))
    }

    async fn insert_company(&mut self, company: &Company) -> Result<(), StoreError> {
        company_model(company)
            .insert(&self.txn)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn find_worker(&mut self, id: WorkerId) -> Result<Option<Worker>, StoreError> {
        let model = workers::Entity::find_by_id(Uuid::from(id))
            .one(&self.txn)
            .await
            .map_err(store_err)?;
        Ok(model.map(Worker::from))
    }

    async fn insert_worker(&mut self, worker: &Worker) -> Result<(), StoreError> {
        worker_model(worker)
            .insert(&self.txn)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    // ========== Balances ==========

    async fn find_balance_for_update(
        &mut self,
        owner: BalanceOwner,
    ) -> Result<Option<Balance>, StoreError> {
        let query = match owner {
            BalanceOwner::User(id) => {
                balances::Entity::find().filter(balances::Column::UserId.eq(Uuid::from(id)))
            }
            BalanceOwner::Company(id) => {
                balances::Entity::find().filter(balances::Column::CompanyId.eq(Uuid::from(id)))
            }
        };
        query
            .lock_exclusive()
            .one(&self.txn)
            .await
            .map_err(store_err)?
            .map(balance_from)
            .transpose()
    }

    async fn insert_balance(&mut self, balance: &Balance) -> Result<(), StoreError> {
        balance_model(balance)
            .insert(&self.txn)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn update_balance(&mut self, balance: &Balance) -> Result<(), StoreError> {
        let (invoice_id, finance_id) = link_columns(balance.last_link);
        let result = balances::Entity::update_many()
            .col_expr(balances::Column::Amount, Expr::value(balance.amount))
            .col_expr(balances::Column::Version, Expr::value(balance.version))
            .col_expr(balances::Column::AsOf, Expr::value(stamp(balance.as_of)))
            .col_expr(balances::Column::InvoiceId, Expr::value(invoice_id))
            .col_expr(balances::Column::FinanceId, Expr::value(finance_id))
            .filter(balances::Column::Id.eq(Uuid::from(balance.id)))
            .filter(balances::Column::Version.eq(balance.version - 1))
            .exec(&self.txn)
            .await
            .map_err(store_err)?;

        if result.rows_affected == 0 {
            return Err(stale("balance", balance.id, balance.version));
        }
        Ok(())
    }

    async fn insert_balance_history(
        &mut self,
        entry: &BalanceHistoryEntry,
    ) -> Result<(), StoreError> {
        balance_history_model(entry)
            .insert(&self.txn)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn list_balance_history(
        &mut self,
        balance_id: BalanceId,
        period: Option<Period>,
    ) -> Result<Vec<BalanceHistoryEntry>, StoreError> {
        let mut query = balance_history::Entity::find()
            .filter(balance_history::Column::BalanceId.eq(Uuid::from(balance_id)));
        if let Some(period) = period {
            query = query
                .filter(balance_history::Column::OccurredAt.gte(period.from()))
                .filter(balance_history::Column::OccurredAt.lt(period.to()));
        }
        query
            .order_by_asc(balance_history::Column::Version)
            .all(&self.txn)
            .await
            .map_err(store_err)?
            .into_iter()
            .map(balance_history_from)
            .collect()
    }

    // ========== Budgets ==========

    async fn find_budget_for_update(
        &mut self,
        company_id: CompanyId,
    ) -> Result<Option<Budget>, StoreError> {
        let model = budgets::Entity::find()
            .filter(budgets::Column::CompanyId.eq(Uuid::from(company_id)))
            .lock_exclusive()
            .one(&self.txn)
            .await
            .map_err(store_err)?;
        Ok(model.map(Budget::from))
    }

    async fn insert_budget(&mut self, budget: &Budget) -> Result<(), StoreError> {
        budget_model(budget)
            .insert(&self.txn)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn update_budget(&mut self, budget: &Budget) -> Result<(), StoreError> {
        let result = budgets::Entity::update_many()
            .col_expr(budgets::Column::Income, Expr::value(budget.income))
            .col_expr(budgets::Column::Expense, Expr::value(budget.expense))
            .col_expr(budgets::Column::Profit, Expr::value(budget.profit))
            .col_expr(budgets::Column::Version, Expr::value(budget.version))
            .col_expr(budgets::Column::AsOf, Expr::value(stamp(budget.as_of)))
            .col_expr(
                budgets::Column::LastFinanceId,
                Expr::value(budget.last_finance.map(Uuid::from)),
            )
            .filter(budgets::Column::Id.eq(Uuid::from(budget.id)))
            .filter(budgets::Column::Version.eq(budget.version - 1))
            .exec(&self.txn)
            .await
            .map_err(store_err)?;

        if result.rows_affected == 0 {
            return Err(stale("budget", budget.id, budget.version));
        }
        Ok(())
    }

    async fn insert_budget_history(
        &mut self,
        entry: &BudgetHistoryEntry,
    ) -> Result<(), StoreError> {
        budget_history_model(entry)
            .insert(&self.txn)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn list_budget_history(
        &mut self,
        budget_id: BudgetId,
        period: Option<Period>,
    ) -> Result<Vec<BudgetHistoryEntry>, StoreError> {
        let mut query = budget_history::Entity::find()
            .filter(budget_history::Column::BudgetId.eq(Uuid::from(budget_id)));
        if let Some(period) = period {
            query = query
                .filter(budget_history::Column::OccurredAt.gte(period.from()))
                .filter(budget_history::Column::OccurredAt.lt(period.to()));
        }
        let models = query
            .order_by_asc(budget_history::Column::Version)
            .all(&self.txn)
            .await
            .map_err(store_err)?;
        Ok(models.into_iter().map(BudgetHistoryEntry::from).collect())
    }

    // ========== Finances ==========

    async fn insert_finance(&mut self, finance: &FinanceRecord) -> Result<(), StoreError> {
        finance_model(finance)
            .insert(&self.txn)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn list_finances(
        &mut self,
        company_id: CompanyId,
        period: Period,
    ) -> Result<Vec<FinanceRecord>, StoreError> {
        let models = finances::Entity::find()
            .filter(finances::Column::CompanyId.eq(Uuid::from(company_id)))
            .filter(finances::Column::OccurredAt.gte(period.from()))
            .filter(finances::Column::OccurredAt.lt(period.to()))
            .order_by_asc(finances::Column::OccurredAt)
            .order_by_asc(finances::Column::Id)
            .all(&self.txn)
            .await
            .map_err(store_err)?;
        Ok(models.into_iter().map(FinanceRecord::from).collect())
    }

    // ========== Products ==========

    async fn find_product_for_update(
        &mut self,
        id: ProductId,
    ) -> Result<Option<Product>, StoreError> {
        let model = products::Entity::find_by_id(Uuid::from(id))
            .lock_exclusive()
            .one(&self.txn)
            .await
            .map_err(store_err)?;
        Ok(model.map(Product::from))
    }

    async fn find_product_by_name_for_update(
        &mut self,
        company_id: CompanyId,
        name: &str,
    ) -> Result<Option<Product>, StoreError> {
        let model = products::Entity::find()
            .filter(products::Column::CompanyId.eq(Uuid::from(company_id)))
            .filter(products::Column::Name.eq(name))
            .lock_exclusive()
            .one(&self.txn)
            .await
            .map_err(store_err)?;
        Ok(model.map(Product::from))
    }

    async fn insert_product(&mut self, product: &Product) -> Result<(), StoreError> {
        product_model(product)
            .insert(&self.txn)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn update_product(&mut self, product: &Product) -> Result<(), StoreError> {
        product_model(product)
            .update(&self.txn)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn list_products_in_stock(
        &mut self,
        company_id: CompanyId,
    ) -> Result<Vec<Product>, StoreError> {
        let models = products::Entity::find()
            .filter(products::Column::CompanyId.eq(Uuid::from(company_id)))
            .filter(products::Column::Quantity.gt(Decimal::ZERO))
            .order_by_asc(products::Column::Name)
            .all(&self.txn)
            .await
            .map_err(store_err)?;
        Ok(models.into_iter().map(Product::from).collect())
    }

    // ========== Invoices ==========

    async fn insert_invoice(&mut self, invoice: &Invoice) -> Result<(), StoreError> {
        invoice_model(invoice)
            .insert(&self.txn)
            .await
            .map_err(store_err)?;

        let lines = line_models(invoice)?;
        if !lines.is_empty() {
            invoice_lines::Entity::insert_many(lines)
                .exec(&self.txn)
                .await
                .map_err(store_err)?;
        }
        Ok(())
    }

    async fn find_invoice(&mut self, id: InvoiceId) -> Result<Option<Invoice>, StoreError> {
        let Some(model) = invoices::Entity::find_by_id(Uuid::from(id))
            .one(&self.txn)
            .await
            .map_err(store_err)?
        else {
            return Ok(None);
        };
        Ok(self.lines_of(vec![model]).await?.pop())
    }

    async fn list_company_invoices(
        &mut self,
        company_id: CompanyId,
    ) -> Result<Vec<Invoice>, StoreError> {
        let models = invoices::Entity::find()
            .filter(invoices::Column::CompanyId.eq(Uuid::from(company_id)))
            .order_by_desc(invoices::Column::OccurredAt)
            .order_by_desc(invoices::Column::Id)
            .all(&self.txn)
            .await
            .map_err(store_err)?;
        self.lines_of(models).await
    }

    async fn list_buyer_invoices(&mut self, buyer_id: UserId) -> Result<Vec<Invoice>, StoreError> {
        let models = invoices::Entity::find()
            .filter(invoices::Column::BuyerId.eq(Uuid::from(buyer_id)))
            .order_by_desc(invoices::Column::OccurredAt)
            .order_by_desc(invoices::Column::Id)
            .all(&self.txn)
            .await
            .map_err(store_err)?;
        self.lines_of(models).await
    }
}
