//! Database migration runner for Tally.
//!
//! Usage:
//!   migrator up      - Run all pending migrations
//!   migrator down    - Rollback last migration
//!   migrator status  - Show migration status
//!   migrator fresh   - Drop all tables and re-run migrations
//!
//! The connection comes from the same `config/` files and `TALLY__*`
//! variables the rest of the workspace reads.

use anyhow::{Context, bail};
use sea_orm_migration::MigratorTrait;
use tally_db::Migrator;
use tally_shared::config::AppConfig;
use tally_shared::telemetry;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    telemetry::init_tracing(&config.logging).context("Failed to initialise tracing")?;

    let command = std::env::args().nth(1).unwrap_or_else(|| "up".to_string());
    let db = tally_db::connect(&config.database)
        .await
        .context("Failed to connect to database")?;

    match command.as_str() {
        "up" => Migrator::up(&db, None).await?,
        "down" => Migrator::down(&db, Some(1)).await?,
        "status" => Migrator::status(&db).await?,
        "fresh" => Migrator::fresh(&db).await?,
        other => bail!("Unknown command '{other}', expected up, down, status or fresh"),
    }

    info!(command = %command, "Migration command finished");
    Ok(())
}
