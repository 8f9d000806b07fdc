//! Transactional orchestration.
//!
//! [`LedgerEngine`] is the only entry point the outside world calls. Every
//! operation runs in one store transaction: it resolves and authorizes the
//! caller, drives the ledgers, and commits. Any failure rolls the whole
//! transaction back and is returned unchanged.

mod policy;


pub use policy::LedgerPolicy;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tally_shared::types::{CompanyId, InvoiceId, Period, ProductId, UserId};
use tracing::{info, instrument, warn};

use crate::auth::{PermissionGuard, Role, RoleSet};
use crate::balance::{Balance, BalanceHistoryEntry, BalanceOwner, BalanceScope, MoneyLedger};
use crate::budget::{Budget, BudgetHistoryEntry, BudgetLedger};
use crate::directory::Company;
use crate::error::{LedgerError, LedgerResult};
use crate::finance::{FinanceRecord, FinanceRecorder, Recorded};
use crate::inventory::{InventoryLedger, Product, RestockItem, SaleItem};
use crate::invoice::{Invoice, InvoiceKind};
use crate::primitives::{LedgerLink, TransactionKind};
use crate::store::{Store, StoreTx};

/// Outcome of a balance replenishment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replenishment {
    /// The finance record and the budget change it caused.
    pub finance: Recorded,
    /// The company balance after the change.
    pub balance: Balance,
    /// The balance history entry.
    pub entry: BalanceHistoryEntry,
}

/// Runs ledger operations against a [`Store`].
#[derive(Debug, Clone)]
pub struct LedgerEngine<S> {
    store: S,
    guard: PermissionGuard,
    money: MoneyLedger,
    finance: FinanceRecorder,
    inventory: InventoryLedger,
}

impl<S: Store> LedgerEngine<S> {
    /// Creates an engine over `store` following `policy`.
    pub fn new(store: S, policy: LedgerPolicy) -> Self {
        Self {
            store,
            guard: PermissionGuard,
            money: MoneyLedger::new(policy.allow_negative_balance),
            finance: FinanceRecorder::new(BudgetLedger::new(policy.allow_negative_profit)),
            inventory: InventoryLedger::new(policy.line_total),
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs `op` in a fresh transaction, committing on success.
    async fn run<T>(&self, op: impl AsyncFnOnce(&mut S::Tx) -> LedgerResult<T>) -> LedgerResult<T> {
        let mut tx = self.store.begin().await?;
        match op(&mut tx).await {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Failed to roll back transaction");
                }
                Err(err)
            }
        }
    }

    // ========== Invoices ==========

    /// Buys `items` into the caller's company stock.
    ///
    /// Creates or restocks one product per item, writes the purchase invoice,
    /// and debits the company balance by its total.
    #[instrument(skip(self, items), fields(lines = items.len()), err)]
    pub async fn create_company_invoice(
        &self,
        caller: UserId,
        items: &[RestockItem],
        at: DateTime<Utc>,
    ) -> LedgerResult<Invoice> {
        let invoice = self
            .run(async |tx| {
                let auth = self.guard.require(tx, caller, RoleSet::MANAGEMENT).await?;
                let restocked = self
                    .inventory
                    .restock(tx, auth.company_id, auth.user_id, items)
                    .await?;

                let invoice = Invoice {
                    id: InvoiceId::new(),
                    kind: InvoiceKind::CompanyPurchase,
                    to_pay: restocked.total_cost,
                    occurred_at: at,
                    company_id: auth.company_id,
                    buyer_id: None,
                    worker_id: None,
                    lines: restocked.lines,
                };
                tx.insert_invoice(&invoice).await?;

                // A zero total moves no money and records no finance.
                if invoice.to_pay > Decimal::ZERO {
                    self.money
                        .post(
                            tx,
                            BalanceOwner::Company(auth.company_id),
                            invoice.to_pay,
                            TransactionKind::Expense,
                            at,
                            LedgerLink::Invoice(invoice.id),
                        )
                        .await?;
                }
                Ok(invoice)
            })
            .await?;

        info!(
            invoice_id = %invoice.id,
            company_id = %invoice.company_id,
            to_pay = %invoice.to_pay,
            "Company purchase invoice committed"
        );
        Ok(invoice)
    }

    /// Sells `items` from the caller's company stock, optionally to a named
    /// buyer.
    ///
    /// A named buyer's balance is debited; anonymous sales only record the
    /// company income.
    #[instrument(skip(self, items), fields(lines = items.len()), err)]
    pub async fn create_user_invoice(
        &self,
        caller: UserId,
        buyer: Option<UserId>,
        items: &[SaleItem],
        at: DateTime<Utc>,
    ) -> LedgerResult<Invoice> {
        let invoice = self
            .run(async |tx| {
                let auth = self.guard.require(tx, caller, RoleSet::SALES).await?;
                let worker_id = auth.worker()?;
                let worker = tx
                    .find_worker(worker_id)
                    .await?
                    .ok_or(LedgerError::NoWorkerAffiliation(caller))?;
                if worker.company_id != auth.company_id {
                    warn!(
                        user_id = %caller,
                        worker_id = %worker_id,
                        company_id = %auth.company_id,
                        "Seller's worker belongs to another company"
                    );
                    return Err(LedgerError::NoWorkerAffiliation(caller));
                }
                if let Some(buyer_id) = buyer {
                    tx.find_user(buyer_id)
                        .await?
                        .ok_or(LedgerError::UserNotFound(buyer_id))?;
                }

                let sold = self
                    .inventory
                    .sell(tx, auth.company_id, worker_id, items)
                    .await?;

                let invoice = Invoice {
                    id: InvoiceId::new(),
                    kind: InvoiceKind::UserSale,
                    to_pay: sold.total_charge,
                    occurred_at: at,
                    company_id: auth.company_id,
                    buyer_id: buyer,
                    worker_id: Some(worker_id),
                    lines: sold.lines,
                };
                tx.insert_invoice(&invoice).await?;

                // Finance amounts are strictly positive.
                if invoice.to_pay > Decimal::ZERO {
                    if let Some(buyer_id) = buyer {
                        self.money
                            .post(
                                tx,
                                BalanceOwner::User(buyer_id),
                                invoice.to_pay,
                                TransactionKind::Expense,
                                at,
                                LedgerLink::Invoice(invoice.id),
                            )
                            .await?;
                    }
                    self.finance
                        .record_in(
                            tx,
                            auth.company_id,
                            invoice.to_pay,
                            TransactionKind::Income,
                            at,
                        )
                        .await?;
                }
                Ok(invoice)
            })
            .await?;

        info!(
            invoice_id = %invoice.id,
            company_id = %invoice.company_id,
            buyer_id = ?invoice.buyer_id,
            to_pay = %invoice.to_pay,
            "Sale invoice committed"
        );
        Ok(invoice)
    }

    // ========== Money ==========

    /// Moves the company balance by `amount` and records the matching
    /// finance event.
    #[instrument(skip(self), err)]
    pub async fn replenish_balance(
        &self,
        caller: UserId,
        amount: Decimal,
        kind: TransactionKind,
        at: DateTime<Utc>,
    ) -> LedgerResult<Replenishment> {
        let replenishment = self
            .run(async |tx| {
                let auth = self.guard.require(tx, caller, RoleSet::MANAGEMENT).await?;
                let finance = self
                    .finance
                    .record_in(tx, auth.company_id, amount, kind, at)
                    .await?;
                let (balance, entry) = self
                    .money
                    .post(
                        tx,
                        BalanceOwner::Company(auth.company_id),
                        amount,
                        kind,
                        at,
                        LedgerLink::Finance(finance.finance.id),
                    )
                    .await?;
                Ok(Replenishment {
                    finance,
                    balance,
                    entry,
                })
            })
            .await?;

        info!(
            balance_id = %replenishment.balance.id,
            finance_id = %replenishment.finance.finance.id,
            amount_after = %replenishment.balance.amount,
            "Company balance replenished"
        );
        Ok(replenishment)
    }

    /// Records a finance event against the caller's company budget.
    #[instrument(skip(self), err)]
    pub async fn record_finance(
        &self,
        caller: UserId,
        amount: Decimal,
        kind: TransactionKind,
        at: DateTime<Utc>,
    ) -> LedgerResult<Recorded> {
        let recorded = self
            .run(async |tx| {
                let auth = self.guard.require(tx, caller, RoleSet::MANAGEMENT).await?;
                self.finance
                    .record_in(tx, auth.company_id, amount, kind, at)
                    .await
            })
            .await?;

        info!(
            finance_id = %recorded.finance.id,
            profit = %recorded.budget.profit,
            "Finance committed"
        );
        Ok(recorded)
    }

    // ========== Provisioning ==========

    /// Creates a company directed by the caller, with a zero balance and a
    /// zero budget.
    #[instrument(skip(self), err)]
    pub async fn provision_company(
        &self,
        caller: UserId,
        name: &str,
        at: DateTime<Utc>,
    ) -> LedgerResult<Company> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::Validation(
                "company name must not be empty".to_string(),
            ));
        }

        let company = self
            .run(async |tx| {
                let mut user = tx
                    .find_user(caller)
                    .await?
                    .ok_or(LedgerError::UserNotFound(caller))?;
                if user.company_id.is_some() {
                    return Err(LedgerError::AlreadyAffiliated(caller));
                }

                let company = Company {
                    id: CompanyId::new(),
                    name: name.to_string(),
                    created_at: at,
                };
                tx.insert_company(&company).await?;

                user.company_id = Some(company.id);
                user.role = Some(Role::Director);
                tx.update_user(&user).await?;

                tx.insert_balance(&Balance::open(BalanceOwner::Company(company.id), at))
                    .await?;
                tx.insert_budget(&Budget::open(company.id, at)).await?;
                Ok(company)
            })
            .await?;

        info!(company_id = %company.id, director = %caller, "Company provisioned");
        Ok(company)
    }

    /// Opens the caller's personal balance at zero.
    #[instrument(skip(self), err)]
    pub async fn open_user_balance(
        &self,
        caller: UserId,
        at: DateTime<Utc>,
    ) -> LedgerResult<Balance> {
        self.run(async |tx| {
            self.guard.resolve(tx, caller).await?;
            let balance = Balance::open(BalanceOwner::User(caller), at);
            tx.insert_balance(&balance).await?;
            Ok(balance)
        })
        .await
    }

    // ========== Inventory ==========

    /// Makes `quantity` more of a product's stock sellable.
    #[instrument(skip(self), err)]
    pub async fn release_for_sale(
        &self,
        caller: UserId,
        product_id: ProductId,
        quantity: Decimal,
    ) -> LedgerResult<Product> {
        self.run(async |tx| {
            let auth = self.guard.require(tx, caller, RoleSet::MANAGEMENT).await?;
            self.inventory
                .release_for_sale(tx, auth.company_id, product_id, quantity)
                .await
        })
        .await
    }

    /// The caller's company products with stock left.
    #[instrument(skip(self), err)]
    pub async fn products_in_stock(&self, caller: UserId) -> LedgerResult<Vec<Product>> {
        self.run(async |tx| {
            let auth = self.guard.require(tx, caller, RoleSet::STAFF).await?;
            Ok(tx.list_products_in_stock(auth.company_id).await?)
        })
        .await
    }

    // ========== Queries ==========

    /// The caller's own or company balance.
    #[instrument(skip(self), err)]
    pub async fn balance(&self, caller: UserId, scope: BalanceScope) -> LedgerResult<Balance> {
        self.run(async |tx| {
            let owner = self.owner(tx, caller, scope).await?;
            load_balance(tx, owner).await
        })
        .await
    }

    /// Balance history entries occurring within `period`, in version order.
    #[instrument(skip(self), err)]
    pub async fn balance_history(
        &self,
        caller: UserId,
        scope: BalanceScope,
        period: Period,
    ) -> LedgerResult<Vec<BalanceHistoryEntry>> {
        self.run(async |tx| {
            let owner = self.owner(tx, caller, scope).await?;
            let balance = load_balance(tx, owner).await?;
            Ok(tx.list_balance_history(balance.id, Some(period)).await?)
        })
        .await
    }

    /// The caller's company budget.
    #[instrument(skip(self), err)]
    pub async fn budget(&self, caller: UserId) -> LedgerResult<Budget> {
        self.run(async |tx| {
            let auth = self.guard.require(tx, caller, RoleSet::MANAGEMENT).await?;
            load_budget(tx, auth.company_id).await
        })
        .await
    }

    /// Budget history entries occurring within `period`, in version order.
    #[instrument(skip(self), err)]
    pub async fn budget_history(
        &self,
        caller: UserId,
        period: Period,
    ) -> LedgerResult<Vec<BudgetHistoryEntry>> {
        self.run(async |tx| {
            let auth = self.guard.require(tx, caller, RoleSet::MANAGEMENT).await?;
            let budget = load_budget(tx, auth.company_id).await?;
            Ok(tx.list_budget_history(budget.id, Some(period)).await?)
        })
        .await
    }

    /// The caller's company finance records occurring within `period`.
    #[instrument(skip(self), err)]
    pub async fn finances(
        &self,
        caller: UserId,
        period: Period,
    ) -> LedgerResult<Vec<FinanceRecord>> {
        self.run(async |tx| {
            let auth = self.guard.require(tx, caller, RoleSet::MANAGEMENT).await?;
            Ok(tx.list_finances(auth.company_id, period).await?)
        })
        .await
    }

    /// Every invoice of the caller's company, newest first.
    #[instrument(skip(self), err)]
    pub async fn company_invoices(&self, caller: UserId) -> LedgerResult<Vec<Invoice>> {
        self.run(async |tx| {
            let auth = self
                .guard
                .require(tx, caller, RoleSet::INVOICE_READERS)
                .await?;
            Ok(tx.list_company_invoices(auth.company_id).await?)
        })
        .await
    }

    /// One invoice of the caller's company.
    ///
    /// Invoices of other companies are reported as not found.
    #[instrument(skip(self), err)]
    pub async fn company_invoice(&self, caller: UserId, id: InvoiceId) -> LedgerResult<Invoice> {
        self.run(async |tx| {
            let auth = self
                .guard
                .require(tx, caller, RoleSet::INVOICE_READERS)
                .await?;
            tx.find_invoice(id)
                .await?
                .filter(|invoice| invoice.company_id == auth.company_id)
                .ok_or(LedgerError::InvoiceNotFound(id))
        })
        .await
    }

    /// Invoices the caller bought, newest first.
    #[instrument(skip(self), err)]
    pub async fn customer_invoices(&self, caller: UserId) -> LedgerResult<Vec<Invoice>> {
        self.run(async |tx| {
            self.guard.resolve(tx, caller).await?;
            Ok(tx.list_buyer_invoices(caller).await?)
        })
        .await
    }

    // ========== Audits ==========

    /// Replays a balance's full history and checks it against the stored
    /// amount.
    #[instrument(skip(self), err)]
    pub async fn audit_balance(&self, caller: UserId, scope: BalanceScope) -> LedgerResult<Balance> {
        self.run(async |tx| {
            let owner = self.owner(tx, caller, scope).await?;
            let balance = load_balance(tx, owner).await?;
            let history = tx.list_balance_history(balance.id, None).await?;
            MoneyLedger::audit(&balance, &history)?;
            Ok(balance)
        })
        .await
    }

    /// Replays the company budget's full history and checks it against the
    /// stored totals.
    #[instrument(skip(self), err)]
    pub async fn audit_budget(&self, caller: UserId) -> LedgerResult<Budget> {
        self.run(async |tx| {
            let auth = self.guard.require(tx, caller, RoleSet::MANAGEMENT).await?;
            let budget = load_budget(tx, auth.company_id).await?;
            let history = tx.list_budget_history(budget.id, None).await?;
            BudgetLedger::audit(&budget, &history)?;
            Ok(budget)
        })
        .await
    }

    async fn owner<T: StoreTx>(
        &self,
        tx: &mut T,
        caller: UserId,
        scope: BalanceScope,
    ) -> LedgerResult<BalanceOwner> {
        match scope {
            BalanceScope::User => {
                self.guard.resolve(tx, caller).await?;
                Ok(BalanceOwner::User(caller))
            }
            BalanceScope::Company => {
                let auth = self.guard.require(tx, caller, RoleSet::MANAGEMENT).await?;
                Ok(BalanceOwner::Company(auth.company_id))
            }
        }
    }
}

async fn load_balance<T: StoreTx>(tx: &mut T, owner: BalanceOwner) -> LedgerResult<Balance> {
    tx.find_balance_for_update(owner)
        .await?
        .ok_or(LedgerError::BalanceNotFound(owner))
}

async fn load_budget<T: StoreTx>(tx: &mut T, company_id: CompanyId) -> LedgerResult<Budget> {
    tx.find_budget_for_update(company_id)
        .await?
        .ok_or(LedgerError::BudgetNotFound(company_id))
}
