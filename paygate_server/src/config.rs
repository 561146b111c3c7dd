use std::{env, fmt::Display, str::FromStr, time::Duration};

use log::*;
use paygate_common::{
    helpers::{parse_boolean_flag, parse_env},
    Secret,
};
use paygate_engine::OrderFlowConfig;
use rail_clients::{BotApiConfig, LedgerApiConfig};

const DEFAULT_PG_HOST: &str = "127.0.0.1";
const DEFAULT_PG_PORT: u16 = 8460;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/paygate.db";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Settings for the order lifecycle itself
    pub order_flow: OrderFlowConfig,
    pub jobs: JobConfig,
    pub rails: RailConfig,
    pub ledger_api: LedgerApiConfig,
    pub bot_api: BotApiConfig,
    pub access: AccessConfig,
}

/// Periodic job settings
#[derive(Clone, Debug)]
pub struct JobConfig {
    pub ledger_interval: Duration,
    /// How far back each periodic reconciliation looks
    pub ledger_window: chrono::Duration,
    /// How far back the reconciliation at startup looks
    pub ledger_backfill: chrono::Duration,
    pub ledger_page_size: usize,
    pub expiry_interval: Duration,
    /// Skip the expiry sweep and the ledger backfill at startup
    pub skip_startup_jobs: bool,
}

#[derive(Clone, Debug)]
pub struct RailConfig {
    pub receiving_address: String,
    /// The stablecoin token contract. No stablecoin rail is offered without it.
    pub stablecoin_master: Option<String>,
    pub native_code: String,
    pub credit_code: String,
    pub stablecoin_code: String,
}

#[derive(Clone, Debug, Default)]
pub struct AccessConfig {
    /// Checked against the `X-Telegram-Bot-Api-Secret-Token` header of webhook calls. Empty disables the check.
    pub webhook_secret: Secret<String>,
    /// Required in the `X-Admin-Token` header of admin calls. Empty disables the admin routes.
    pub admin_token: Secret<String>,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            ledger_interval: Duration::from_secs(60),
            ledger_window: chrono::Duration::minutes(60),
            ledger_backfill: chrono::Duration::days(30),
            ledger_page_size: 1000,
            expiry_interval: Duration::from_secs(1800),
            skip_startup_jobs: false,
        }
    }
}

impl Default for RailConfig {
    fn default() -> Self {
        Self {
            receiving_address: String::default(),
            stablecoin_master: None,
            native_code: "TON".to_string(),
            credit_code: "XTR".to_string(),
            stablecoin_code: "USDT".to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_PG_HOST.to_string(),
            port: DEFAULT_PG_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            order_flow: OrderFlowConfig::default(),
            jobs: JobConfig::default(),
            rails: RailConfig::default(),
            ledger_api: LedgerApiConfig::default(),
            bot_api: BotApiConfig::default(),
            access: AccessConfig::default(),
        }
    }
}

/// Reads `name`, logging and falling back to `default` if it is missing or malformed.
fn env_or<T>(name: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    parse_env::<T>(name).unwrap_or_else(|e| {
        if env::var(name).is_ok() {
            error!("🪛️ {e} Using the default, {default}, instead.");
        } else {
            debug!("🪛️ {name} is not set. Using the default, {default}.");
        }
        default
    })
}

fn secret_from_env(name: &str) -> Secret<String> {
    Secret::new(env::var(name).unwrap_or_default())
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("PG_HOST").ok().unwrap_or_else(|| DEFAULT_PG_HOST.into());
        let port = env_or("PG_PORT", DEFAULT_PG_PORT);
        let database_url = env::var("PG_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ PG_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.into()
        });
        let order_flow = OrderFlowConfig {
            order_expiry: chrono::Duration::minutes(env_or("PG_ORDER_EXPIRY_MINS", 60)),
            max_open_orders: env_or("PG_MAX_PENDING_ORDERS", 10),
            max_quantity: env_or("PG_MAX_QUANTITY", 100),
            lock_ttl: Duration::from_secs(env_or("PG_LOCK_TTL_SECS", 30)),
            rate_valid_seconds: env_or("PG_RATE_VALID_SECS", 900),
            ..Default::default()
        };
        let jobs = JobConfig::from_env_or_default();
        let rails = RailConfig::from_env_or_default();
        let access = AccessConfig {
            webhook_secret: secret_from_env("PG_WEBHOOK_SECRET"),
            admin_token: secret_from_env("PG_ADMIN_TOKEN"),
        };
        if access.webhook_secret.is_empty() {
            warn!("🚨️ PG_WEBHOOK_SECRET is not set. Anyone who can reach the server can answer checkouts.");
        }
        if access.admin_token.is_empty() {
            info!("🪛️ PG_ADMIN_TOKEN is not set. The admin routes are disabled.");
        }
        Self {
            host,
            port,
            database_url,
            order_flow,
            jobs,
            rails,
            ledger_api: LedgerApiConfig::new_from_env_or_default(),
            bot_api: BotApiConfig::new_from_env_or_default(),
            access,
        }
    }
}

impl JobConfig {
    pub fn from_env_or_default() -> Self {
        let defaults = Self::default();
        Self {
            ledger_interval: Duration::from_secs(env_or("PG_LEDGER_INTERVAL_SECS", 60)),
            ledger_window: chrono::Duration::minutes(env_or("PG_LEDGER_WINDOW_MINS", 60)),
            ledger_backfill: chrono::Duration::days(env_or("PG_LEDGER_BACKFILL_DAYS", 30)),
            ledger_page_size: env_or("PG_LEDGER_PAGE_SIZE", defaults.ledger_page_size),
            expiry_interval: Duration::from_secs(env_or("PG_EXPIRY_INTERVAL_SECS", 1800)),
            skip_startup_jobs: parse_boolean_flag(env::var("PG_SKIP_STARTUP_JOBS").ok(), false),
        }
    }
}

impl RailConfig {
    pub fn from_env_or_default() -> Self {
        let defaults = Self::default();
        let receiving_address = env::var("PG_RECEIVING_ADDRESS").unwrap_or_else(|_| {
            error!("🪛️ PG_RECEIVING_ADDRESS is not set. On-chain payment links will be useless.");
            String::default()
        });
        let stablecoin_master = env::var("PG_STABLECOIN_MASTER").ok().filter(|s| !s.trim().is_empty());
        if stablecoin_master.is_none() {
            info!("🪛️ PG_STABLECOIN_MASTER is not set. Stablecoin payments are disabled.");
        }
        Self {
            receiving_address,
            stablecoin_master,
            native_code: env::var("PG_NATIVE_TOKEN_CODE").unwrap_or(defaults.native_code),
            credit_code: env::var("PG_CREDIT_CODE").unwrap_or(defaults.credit_code),
            stablecoin_code: env::var("PG_STABLECOIN_CODE").unwrap_or(defaults.stablecoin_code),
        }
    }
}
