//! Ledger schema.
//!
//! Creates the enums and tables for companies, users, workers, balances,
//! budgets, finance records, products, and invoices.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: DIRECTORY
        // ============================================================
        db.execute_unprepared(COMPANIES_SQL).await?;
        db.execute_unprepared(USERS_SQL).await?;
        db.execute_unprepared(WORKERS_SQL).await?;

        // ============================================================
        // PART 3: FINANCES & BUDGETS
        // ============================================================
        db.execute_unprepared(FINANCES_SQL).await?;
        db.execute_unprepared(BUDGETS_SQL).await?;
        db.execute_unprepared(BUDGET_HISTORY_SQL).await?;

        // ============================================================
        // PART 4: INVENTORY & INVOICES
        // ============================================================
        db.execute_unprepared(PRODUCTS_SQL).await?;
        db.execute_unprepared(INVOICES_SQL).await?;
        db.execute_unprepared(INVOICE_LINES_SQL).await?;

        // ============================================================
        // PART 5: BALANCES
        // ============================================================
        db.execute_unprepared(BALANCES_SQL).await?;
        db.execute_unprepared(BALANCE_HISTORY_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
CREATE TYPE user_role AS ENUM (
    'DIRECTOR',
    'ADMIN',
    'WORKER_DIRECTOR',
    'WORKER_ADMIN',
    'WORKER_USER',
    'CUSTOMER'
);

CREATE TYPE transaction_kind AS ENUM ('INCOME', 'EXPENSE');

CREATE TYPE invoice_kind AS ENUM ('COMPANY_PURCHASE', 'USER_SALE');

CREATE TYPE unit_of_measure AS ENUM ('KILOGRAM', 'PIECES');
";

const COMPANIES_SQL: &str = r"
CREATE TABLE companies (
    id          UUID PRIMARY KEY,
    name        VARCHAR(255) NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT companies_name_key UNIQUE (name)
);
";

// workers.user_id and users.worker_id reference each other; the second
// foreign key is added once both tables exist.
const USERS_SQL: &str = r"
CREATE TABLE users (
    id          UUID PRIMARY KEY,
    username    VARCHAR(150) NOT NULL,
    email       VARCHAR(255) NOT NULL,
    first_name  VARCHAR(150),
    last_name   VARCHAR(150),
    role        user_role,
    company_id  UUID REFERENCES companies(id) ON DELETE SET NULL,
    worker_id   UUID,

    CONSTRAINT users_username_key UNIQUE (username),
    CONSTRAINT users_email_key UNIQUE (email)
);

CREATE INDEX idx_users_company ON users(company_id);
";

const WORKERS_SQL: &str = r"
CREATE TABLE workers (
    id          UUID PRIMARY KEY,
    name        VARCHAR(255) NOT NULL,
    company_id  UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    user_id     UUID REFERENCES users(id) ON DELETE SET NULL
);

CREATE INDEX idx_workers_company ON workers(company_id);

ALTER TABLE users
    ADD CONSTRAINT users_worker_id_fkey
    FOREIGN KEY (worker_id) REFERENCES workers(id) ON DELETE SET NULL;
";

const FINANCES_SQL: &str = r"
CREATE TABLE finances (
    id          UUID PRIMARY KEY,
    company_id  UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    amount      NUMERIC(20, 3) NOT NULL,
    kind        transaction_kind NOT NULL,
    occurred_at TIMESTAMPTZ NOT NULL,

    CONSTRAINT finances_amount_positive CHECK (amount > 0)
);

CREATE INDEX idx_finances_company_time ON finances(company_id, occurred_at);
";

const BUDGETS_SQL: &str = r"
CREATE TABLE budgets (
    id              UUID PRIMARY KEY,
    company_id      UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    income          NUMERIC(20, 3) NOT NULL DEFAULT 0,
    expense         NUMERIC(20, 3) NOT NULL DEFAULT 0,
    profit          NUMERIC(20, 3) NOT NULL DEFAULT 0,
    version         BIGINT NOT NULL DEFAULT 0,
    as_of           TIMESTAMPTZ NOT NULL,
    last_finance_id UUID REFERENCES finances(id) ON DELETE SET NULL,

    CONSTRAINT budgets_company_id_key UNIQUE (company_id),
    CONSTRAINT budgets_profit_identity CHECK (profit = income - expense)
);
";

const BUDGET_HISTORY_SQL: &str = r"
CREATE TABLE budget_history (
    id              UUID PRIMARY KEY,
    budget_id       UUID NOT NULL REFERENCES budgets(id) ON DELETE CASCADE,
    version         BIGINT NOT NULL,
    prev_income     NUMERIC(20, 3) NOT NULL,
    prev_expense    NUMERIC(20, 3) NOT NULL,
    prev_profit     NUMERIC(20, 3) NOT NULL,
    kind            transaction_kind NOT NULL,
    amount          NUMERIC(20, 3) NOT NULL,
    occurred_at     TIMESTAMPTZ NOT NULL,
    finance_id      UUID NOT NULL REFERENCES finances(id) ON DELETE CASCADE,

    CONSTRAINT budget_history_budget_id_version_key UNIQUE (budget_id, version)
);
";

const PRODUCTS_SQL: &str = r"
CREATE TABLE products (
    id              UUID PRIMARY KEY,
    company_id      UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    owner_id        UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    name            VARCHAR(255) NOT NULL,
    purchase_price  NUMERIC(20, 3) NOT NULL,
    sale_price      NUMERIC(20, 3) NOT NULL,
    quantity        NUMERIC(20, 3) NOT NULL DEFAULT 0,
    sale_quantity   NUMERIC(20, 3) NOT NULL DEFAULT 0,
    unit            unit_of_measure NOT NULL,

    CONSTRAINT products_company_id_name_key UNIQUE (company_id, name),
    CONSTRAINT products_prices_non_negative CHECK (purchase_price >= 0 AND sale_price >= 0),
    CONSTRAINT products_stock_bound CHECK (0 <= sale_quantity AND sale_quantity <= quantity)
);
";

const INVOICES_SQL: &str = r"
CREATE TABLE invoices (
    id          UUID PRIMARY KEY,
    kind        invoice_kind NOT NULL,
    to_pay      NUMERIC(20, 3) NOT NULL,
    occurred_at TIMESTAMPTZ NOT NULL,
    company_id  UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    buyer_id    UUID REFERENCES users(id) ON DELETE SET NULL,
    worker_id   UUID REFERENCES workers(id) ON DELETE SET NULL
);

CREATE INDEX idx_invoices_company_time ON invoices(company_id, occurred_at DESC);
CREATE INDEX idx_invoices_buyer ON invoices(buyer_id) WHERE buyer_id IS NOT NULL;
";

const INVOICE_LINES_SQL: &str = r"
CREATE TABLE invoice_lines (
    invoice_id  UUID NOT NULL REFERENCES invoices(id) ON DELETE CASCADE,
    position    INTEGER NOT NULL,
    product_id  UUID NOT NULL REFERENCES products(id),
    name        VARCHAR(255) NOT NULL,
    quantity    NUMERIC(20, 3) NOT NULL,
    unit_price  NUMERIC(20, 3) NOT NULL,
    amount      NUMERIC(20, 3) NOT NULL,

    PRIMARY KEY (invoice_id, position)
);
";

const BALANCES_SQL: &str = r"
CREATE TABLE balances (
    id          UUID PRIMARY KEY,
    user_id     UUID REFERENCES users(id) ON DELETE CASCADE,
    company_id  UUID REFERENCES companies(id) ON DELETE CASCADE,
    amount      NUMERIC(20, 3) NOT NULL DEFAULT 0,
    version     BIGINT NOT NULL DEFAULT 0,
    as_of       TIMESTAMPTZ NOT NULL,
    invoice_id  UUID REFERENCES invoices(id) ON DELETE SET NULL,
    finance_id  UUID REFERENCES finances(id) ON DELETE SET NULL,

    CONSTRAINT balances_user_id_key UNIQUE (user_id),
    CONSTRAINT balances_company_id_key UNIQUE (company_id),
    CONSTRAINT balances_one_owner CHECK (num_nonnulls(user_id, company_id) = 1),
    CONSTRAINT balances_one_link CHECK (num_nonnulls(invoice_id, finance_id) <= 1)
);
";

const BALANCE_HISTORY_SQL: &str = r"
CREATE TABLE balance_history (
    id              UUID PRIMARY KEY,
    balance_id      UUID NOT NULL REFERENCES balances(id) ON DELETE CASCADE,
    version         BIGINT NOT NULL,
    prev_amount     NUMERIC(20, 3) NOT NULL,
    delta_amount    NUMERIC(20, 3) NOT NULL,
    kind            transaction_kind NOT NULL,
    occurred_at     TIMESTAMPTZ NOT NULL,
    invoice_id      UUID REFERENCES invoices(id) ON DELETE CASCADE,
    finance_id      UUID REFERENCES finances(id) ON DELETE CASCADE,

    CONSTRAINT balance_history_balance_id_version_key UNIQUE (balance_id, version),
    CONSTRAINT balance_history_delta_positive CHECK (delta_amount > 0),
    CONSTRAINT balance_history_one_link CHECK (num_nonnulls(invoice_id, finance_id) <= 1)
);

CREATE INDEX idx_balance_history_time ON balance_history(balance_id, occurred_at);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS balance_history CASCADE;
DROP TABLE IF EXISTS balances CASCADE;
DROP TABLE IF EXISTS invoice_lines CASCADE;
DROP TABLE IF EXISTS invoices CASCADE;
DROP TABLE IF EXISTS products CASCADE;
DROP TABLE IF EXISTS budget_history CASCADE;
DROP TABLE IF EXISTS budgets CASCADE;
DROP TABLE IF EXISTS finances CASCADE;
DROP TABLE IF EXISTS workers CASCADE;
DROP TABLE IF EXISTS users CASCADE;
DROP TABLE IF EXISTS companies CASCADE;

DROP TYPE IF EXISTS unit_of_measure;
DROP TYPE IF EXISTS invoice_kind;
DROP TYPE IF EXISTS transaction_kind;
DROP TYPE IF EXISTS user_role;
";
