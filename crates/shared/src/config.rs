//! Application configuration management.
//!
//! Values are layered from `config/default`, `config/{RUN_MODE}`, and
//! `TALLY__*` environment variables, later sources winning.

use serde::Deserialize;

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "TALLY";

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Ledger policy configuration.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// How invoice totals are aggregated across lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineTotalMode {
    /// Sum every line.
    #[default]
    RunningSum,
    /// Keep only the last line's amount.
    LastLine,
}

/// Ledger policy switches.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Whether balances may go below zero.
    #[serde(default = "default_true")]
    pub allow_negative_balance: bool,
    /// Whether company budgets may run a deficit.
    #[serde(default = "default_true")]
    pub allow_negative_profit: bool,
    /// Invoice total aggregation.
    #[serde(default)]
    pub line_total: LineTotalMode,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            allow_negative_balance: true,
            allow_negative_profit: true,
            line_total: LineTotalMode::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

fn default_log_filter() -> String {
    "tally=info,sea_orm=warn".to_string()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()
    }
}
