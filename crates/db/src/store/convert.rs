//! Conversions between ledger values and database rows.

use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::prelude::{DateTimeWithTimeZone, Uuid};
use tally_core::auth::Role;
use tally_core::balance::{Balance, BalanceHistoryEntry, BalanceOwner};
use tally_core::budget::{Budget, BudgetHistoryEntry};
use tally_core::directory::{Company, User, Worker};
use tally_core::finance::FinanceRecord;
use tally_core::inventory::{Product, UnitOfMeasure};
use tally_core::invoice::{Invoice, InvoiceKind, InvoiceLine};
use tally_core::store::StoreError;
use tally_core::{LedgerLink, TransactionKind};

use crate::entities::sea_orm_active_enums as db_enum;
use crate::entities::{
    balance_history, balances, budget_history, budgets, companies, finances, invoice_lines,
    invoices, products, users, workers,
};

fn utc(at: DateTimeWithTimeZone) -> DateTime<Utc> {
    at.with_timezone(&Utc)
}

pub(crate) fn stamp(at: DateTime<Utc>) -> DateTimeWithTimeZone {
    at.into()
}

// ========== Enums ==========

impl From<Role> for db_enum::UserRole {
    fn from(role: Role) -> Self {
        match role {
            Role::Director => Self::Director,
            Role::Admin => Self::Admin,
            Role::WorkerDirector => Self::WorkerDirector,
            Role::WorkerAdmin => Self::WorkerAdmin,
            Role::WorkerUser => Self::WorkerUser,
            Role::Customer => Self::Customer,
        }
    }
}

impl From<db_enum::UserRole> for Role {
    fn from(role: db_enum::UserRole) -> Self {
        match role {
            db_enum::UserRole::Director => Self::Director,
            db_enum::UserRole::Admin => Self::Admin,
            db_enum::UserRole::WorkerDirector => Self::WorkerDirector,
            db_enum::UserRole::WorkerAdmin => Self::WorkerAdmin,
            db_enum::UserRole::WorkerUser => Self::WorkerUser,
            db_enum::UserRole::Customer => Self::Customer,
        }
    }
}

impl From<TransactionKind> for db_enum::TransactionKind {
    fn from(kind: TransactionKind) -> Self {
        match kind {
            TransactionKind::Income => Self::Income,
            TransactionKind::Expense => Self::Expense,
        }
    }
}

impl From<db_enum::TransactionKind> for TransactionKind {
    fn from(kind: db_enum::TransactionKind) -> Self {
        match kind {
            db_enum::TransactionKind::Income => Self::Income,
            db_enum::TransactionKind::Expense => Self::Expense,
        }
    }
}

impl From<InvoiceKind> for db_enum::InvoiceKind {
    fn from(kind: InvoiceKind) -> Self {
        match kind {
            InvoiceKind::CompanyPurchase => Self::CompanyPurchase,
            InvoiceKind::UserSale => Self::UserSale,
        }
    }
}

impl From<db_enum::InvoiceKind> for InvoiceKind {
    fn from(kind: db_enum::InvoiceKind) -> Self {
        match kind {
            db_enum::InvoiceKind::CompanyPurchase => Self::CompanyPurchase,
            db_enum::InvoiceKind::UserSale => Self::UserSale,
        }
    }
}

impl From<UnitOfMeasure> for db_enum::UnitOfMeasure {
    fn from(unit: UnitOfMeasure) -> Self {
        match unit {
            UnitOfMeasure::Kilogram => Self::Kilogram,
            UnitOfMeasure::Pieces => Self::Pieces,
        }
    }
}

impl From<db_enum::UnitOfMeasure> for UnitOfMeasure {
    fn from(unit: db_enum::UnitOfMeasure) -> Self {
        match unit {
            db_enum::UnitOfMeasure::Kilogram => Self::Kilogram,
            db_enum::UnitOfMeasure::Pieces => Self::Pieces,
        }
    }
}

// ========== Links and owners ==========

pub(crate) fn link_columns(link: LedgerLink) -> (Option<Uuid>, Option<Uuid>) {
    (link.invoice().map(Uuid::from), link.finance().map(Uuid::from))
}

fn link_from(invoice_id: Option<Uuid>, finance_id: Option<Uuid>) -> Result<LedgerLink, StoreError> {
    LedgerLink::from_columns(invoice_id.map(Into::into), finance_id.map(Into::into))
        .ok_or_else(|| StoreError::Backend("row links both an invoice and a finance".to_string()))
}

fn owner_columns(owner: BalanceOwner) -> (Option<Uuid>, Option<Uuid>) {
    match owner {
        BalanceOwner::User(id) => (Some(id.into()), None),
        BalanceOwner::Company(id) => (None, Some(id.into())),
    }
}

fn owner_from(user_id: Option<Uuid>, company_id: Option<Uuid>) -> Result<BalanceOwner, StoreError> {
    match (user_id, company_id) {
        (Some(id), None) => Ok(BalanceOwner::User(id.into())),
        (None, Some(id)) => Ok(BalanceOwner::Company(id.into())),
        _ => Err(StoreError::Backend(
            "balance row must have exactly one owner".to_string(),
        )),
    }
}

// ========== Directory ==========

pub(crate) fn user_model(user: &User) -> users::ActiveModel {
    users::ActiveModel {
        id: Set(user.id.into()),
        username: Set(user.username.clone()),
        email: Set(user.email.clone()),
        first_name: Set(user.first_name.clone()),
        last_name: Set(user.last_name.clone()),
        role: Set(user.role.map(Into::into)),
        company_id: Set(user.company_id.map(Into::into)),
        worker_id: Set(user.worker_id.map(Into::into)),
    }
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id.into(),
            username: model.username,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            role: model.role.map(Into::into),
            company_id: model.company_id.map(Into::into),
            worker_id: model.worker_id.map(Into::into),
        }
    }
}

pub(crate) fn company_model(company: &Company) -> companies::ActiveModel {
    companies::ActiveModel {
        id: Set(company.id.into()),
        name: Set(company.name.clone()),
        created_at: Set(stamp(company.created_at)),
    }
}

impl From<companies::Model> for Company {
    fn from(model: companies::Model) -> Self {
        Self {
            id: model.id.into(),
            name: model.name,
            created_at: utc(model.created_at),
        }
    }
}

pub(crate) fn worker_model(worker: &Worker) -> workers::ActiveModel {
    workers::ActiveModel {
        id: Set(worker.id.into()),
        name: Set(worker.name.clone()),
        company_id: Set(worker.company_id.into()),
        user_id: Set(worker.user_id.map(Into::into)),
    }
}

impl From<workers::Model> for Worker {
    fn from(model: workers::Model) -> Self {
        Self {
            id: model.id.into(),
            name: model.name,
            company_id: model.company_id.into(),
            user_id: model.user_id.map(Into::into),
        }
    }
}

// ========== Balances ==========

pub(crate) fn balance_model(balance: &Balance) -> balances::ActiveModel {
    let (user_id, company_id) = owner_columns(balance.owner);
    let (invoice_id, finance_id) = link_columns(balance.last_link);
    balances::ActiveModel {
        id: Set(balance.id.into()),
        user_id: Set(user_id),
        company_id: Set(company_id),
        amount: Set(balance.amount),
        version: Set(balance.version),
        as_of: Set(stamp(balance.as_of)),
        invoice_id: Set(invoice_id),
        finance_id: Set(finance_id),
    }
}

pub(crate) fn balance_from(model: balances::Model) -> Result<Balance, StoreError> {
    Ok(Balance {
        id: model.id.into(),
        owner: owner_from(model.user_id, model.company_id)?,
        amount: model.amount,
        version: model.version,
        as_of: utc(model.as_of),
        last_link: link_from(model.invoice_id, model.finance_id)?,
    })
}

pub(crate) fn balance_history_model(entry: &BalanceHistoryEntry) -> balance_history::ActiveModel {
    let (invoice_id, finance_id) = link_columns(entry.link);
    balance_history::ActiveModel {
        id: Set(entry.id.into()),
        balance_id: Set(entry.balance_id.into()),
        version: Set(entry.version),
        prev_amount: Set(entry.prev_amount),
        delta_amount: Set(entry.delta_amount),
        kind: Set(entry.kind.into()),
        occurred_at: Set(stamp(entry.occurred_at)),
        invoice_id: Set(invoice_id),
        finance_id: Set(finance_id),
    }
}

pub(crate) fn balance_history_from(
    model: balance_history::Model,
) -> Result<BalanceHistoryEntry, StoreError> {
    Ok(BalanceHistoryEntry {
        id: model.id.into(),
        balance_id: model.balance_id.into(),
        version: model.version,
        prev_amount: model.prev_amount,
        delta_amount: model.delta_amount,
        kind: model.kind.into(),
        occurred_at: utc(model.occurred_at),
        link: link_from(model.invoice_id, model.finance_id)?,
    })
}

// ========== Budgets and finances ==========

pub(crate) fn budget_model(budget: &Budget) -> budgets::ActiveModel {
    budgets::ActiveModel {
        id: Set(budget.id.into()),
        company_id: Set(budget.company_id.into()),
        income: Set(budget.income),
        expense: Set(budget.expense),
        profit: Set(budget.profit),
        version: Set(budget.version),
        as_of: Set(stamp(budget.as_of)),
        last_finance_id: Set(budget.last_finance.map(Into::into)),
    }
}

impl From<budgets::Model> for Budget {
    fn from(model: budgets::Model) -> Self {
        Self {
            id: model.id.into(),
            company_id: model.company_id.into(),
            income: model.income,
            expense: model.expense,
            profit: model.profit,
            version: model.version,
            as_of: utc(model.as_of),
            last_finance: model.last_finance_id.map(Into::into),
        }
    }
}

pub(crate) fn budget_history_model(entry: &BudgetHistoryEntry) -> budget_history::ActiveModel {
    budget_history::ActiveModel {
        id: Set(entry.id.into()),
        budget_id: Set(entry.budget_id.into()),
        version: Set(entry.version),
        prev_income: Set(entry.prev_income),
        prev_expense: Set(entry.prev_expense),
        prev_profit: Set(entry.prev_profit),
        kind: Set(entry.kind.into()),
        amount: Set(entry.amount),
        occurred_at: Set(stamp(entry.occurred_at)),
        finance_id: Set(entry.finance_id.into()),
    }
}

impl From<budget_history::Model> for BudgetHistoryEntry {
    fn from(model: budget_history::Model) -> Self {
        Self {
            id: model.id.into(),
            budget_id: model.budget_id.into(),
            version: model.version,
            prev_income: model.prev_income,
            prev_expense: model.prev_expense,
            prev_profit: model.prev_profit,
            kind: model.kind.into(),
            amount: model.amount,
            occurred_at: utc(model.occurred_at),
            finance_id: model.finance_id.into(),
        }
    }
}

pub(crate) fn finance_model(finance: &FinanceRecord) -> finances::ActiveModel {
    finances::ActiveModel {
        id: Set(finance.id.into()),
        company_id: Set(finance.company_id.into()),
        amount: Set(finance.amount),
        kind: Set(finance.kind.into()),
        occurred_at: Set(stamp(finance.occurred_at)),
    }
}

impl From<finances::Model> for FinanceRecord {
    fn from(model: finances::Model) -> Self {
        Self {
            id: model.id.into(),
            company_id: model.company_id.into(),
            amount: model.amount,
            kind: model.kind.into(),
            occurred_at: utc(model.occurred_at),
        }
    }
}

// ========== Products and invoices ==========

pub(crate) fn product_model(product: &Product) -> products::ActiveModel {
    products::ActiveModel {
        id: Set(product.id.into()),
        company_id: Set(product.company_id.into()),
        owner_id: Set(product.owner_id.into()),
        name: Set(product.name.clone()),
        purchase_price: Set(product.purchase_price),
        sale_price: Set(product.sale_price),
        quantity: Set(product.quantity),
        sale_quantity: Set(product.sale_quantity),
        unit: Set(product.unit.into()),
    }
}

impl From<products::Model> for Product {
    fn from(model: products::Model) -> Self {
        Self {
            id: model.id.into(),
            company_id: model.company_id.into(),
            owner_id: model.owner_id.into(),
            name: model.name,
            purchase_price: model.purchase_price,
            sale_price: model.sale_price,
            quantity: model.quantity,
            sale_quantity: model.sale_quantity,
            unit: model.unit.into(),
        }
    }
}

pub(crate) fn invoice_model(invoice: &Invoice) -> invoices::ActiveModel {
    invoices::ActiveModel {
        id: Set(invoice.id.into()),
        kind: Set(invoice.kind.into()),
        to_pay: Set(invoice.to_pay),
        occurred_at: Set(stamp(invoice.occurred_at)),
        company_id: Set(invoice.company_id.into()),
        buyer_id: Set(invoice.buyer_id.map(Into::into)),
        worker_id: Set(invoice.worker_id.map(Into::into)),
    }
}

pub(crate) fn line_models(invoice: &Invoice) -> Result<Vec<invoice_lines::ActiveModel>, StoreError> {
    invoice
        .lines
        .iter()
        .enumerate()
        .map(|(position, line)| {
            let position = i32::try_from(position)
                .map_err(|_| StoreError::OutOfRange("invoice_lines.position".to_string()))?;
            Ok(invoice_lines::ActiveModel {
                invoice_id: Set(invoice.id.into()),
                position: Set(position),
                product_id: Set(line.product_id.into()),
                name: Set(line.name.clone()),
                quantity: Set(line.quantity),
                unit_price: Set(line.unit_price),
                amount: Set(line.amount),
            })
        })
        .collect()
}

impl From<invoice_lines::Model> for InvoiceLine {
    fn from(model: invoice_lines::Model) -> Self {
        Self {
            product_id: model.product_id.into(),
            name: model.name,
            quantity: model.quantity,
            unit_price: model.unit_price,
            amount: model.amount,
        }
    }
}

/// Assembles an invoice; `lines` must be in position order.
pub(crate) fn invoice_from(model: invoices::Model, lines: Vec<invoice_lines::Model>) -> Invoice {
    Invoice {
        id: model.id.into(),
        kind: model.kind.into(),
        to_pay: model.to_pay,
        occurred_at: utc(model.occurred_at),
        company_id: model.company_id.into(),
        buyer_id: model.buyer_id.map(Into::into),
        worker_id: model.worker_id.map(Into::into),
        lines: lines.into_iter().map(InvoiceLine::from).collect(),
    }
}
