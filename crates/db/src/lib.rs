//! Database layer with `SeaORM` entities and the PostgreSQL ledger store.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - The ledger schema migration
//! - [`SeaStore`], the relational implementation of the ledger store

pub mod entities;
pub mod migration;
pub mod store;

pub use migration::Migrator;
pub use store::{SeaStore, SeaTx};

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use tally_shared::config::DatabaseConfig;

/// Establishes a connection pool sized by `config`.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .sqlx_logging(false);
    Database::connect(options).await
}
