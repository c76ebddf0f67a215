//! Application configuration management.

use serde::Deserialize;

use crate::types::Currency;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Ledger configuration.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Accounts used when an approved settlement is posted.
    #[serde(default)]
    pub settlement: SettlementConfig,
    /// Log output configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL (`postgres://…` or `sqlite:…`).
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Run pending migrations when the server starts.
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

/// Ledger configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Reporting currency every line is converted into for balance checks.
    #[serde(default = "default_base_currency")]
    pub base_currency: Currency,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            base_currency: default_base_currency(),
        }
    }
}

fn default_base_currency() -> Currency {
    Currency::Yer
}

/// Expense/payable account pair for one beneficiary type.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PostingAccountsConfig {
    /// Account debited on approval.
    pub expense_code: String,
    /// Account credited on approval.
    pub payable_code: String,
}

impl PostingAccountsConfig {
    fn pair(expense_code: &str, payable_code: &str) -> Self {
        Self {
            expense_code: expense_code.to_string(),
            payable_code: payable_code.to_string(),
        }
    }
}

/// Settlement posting accounts per beneficiary type.
#[derive(Debug, Clone, Deserialize)]
pub struct SettlementConfig {
    /// Driver settlements.
    #[serde(default = "default_driver_accounts")]
    pub driver: PostingAccountsConfig,
    /// Store settlements.
    #[serde(default = "default_store_accounts")]
    pub store: PostingAccountsConfig,
    /// Marketer settlements.
    #[serde(default = "default_marketer_accounts")]
    pub marketer: PostingAccountsConfig,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            driver: default_driver_accounts(),
            store: default_store_accounts(),
            marketer: default_marketer_accounts(),
        }
    }
}

fn default_driver_accounts() -> PostingAccountsConfig {
    PostingAccountsConfig::pair("4-1", "2-1")
}

fn default_store_accounts() -> PostingAccountsConfig {
    PostingAccountsConfig::pair("4-2", "2-2")
}

fn default_marketer_accounts() -> PostingAccountsConfig {
    PostingAccountsConfig::pair("4-3", "2-3")
}

/// Log output configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, later ones winning: `config/default`, `config/{RUN_MODE}`,
    /// then `MIZAN__SECTION__KEY` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("MIZAN").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
