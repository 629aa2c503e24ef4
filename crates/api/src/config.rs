use std::path::PathBuf;
use std::str::FromStr;

use goldipuppy_core::deposit::DEFAULT_GRACE_PERIOD_DAYS;
use goldipuppy_core::types::Money;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// JWT token configuration (secret, expiry durations).
    pub jwt: JwtConfig,
    /// Storefront business settings.
    pub store: StoreConfig,
    /// Uploaded image storage.
    pub storage: StorageConfig,
    /// Deposit expiry sweep interval in seconds; `0` disables the sweep.
    pub deposit_sweep_interval_secs: u64,
    /// Outbox dispatcher poll interval in seconds.
    pub outbox_poll_interval_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default                 |
    /// |-------------------------------|-------------------------|
    /// | `HOST`                        | `0.0.0.0`               |
    /// | `PORT`                        | `3000`                  |
    /// | `CORS_ORIGINS`                | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`        | `30`                    |
    /// | `DEPOSIT_SWEEP_INTERVAL_SECS` | `300`                   |
    /// | `OUTBOX_POLL_INTERVAL_SECS`   | `10`                    |
    ///
    /// See [`JwtConfig::from_env`], [`StoreConfig::from_env`] and
    /// [`StorageConfig::from_env`] for the remaining variables.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            host,
            port: parse_env("PORT", 3000),
            cors_origins,
            request_timeout_secs: parse_env("REQUEST_TIMEOUT_SECS", 30),
            jwt: JwtConfig::from_env(),
            store: StoreConfig::from_env(),
            storage: StorageConfig::from_env(),
            deposit_sweep_interval_secs: parse_env("DEPOSIT_SWEEP_INTERVAL_SECS", 300),
            outbox_poll_interval_secs: parse_env("OUTBOX_POLL_INTERVAL_SECS", 10),
        }
    }
}

/// Bank transfer details quoted in reservation confirmations.
#[derive(Debug, Clone, Default)]
pub struct BankDetails {
    pub account_holder: String,
    pub iban: String,
    pub bic: String,
    pub bank_name: String,
}

/// Storefront business settings.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// ISO-4217 code applied to new listings that do not name one.
    pub currency: String,
    /// Deposit amount quoted to customers.
    pub deposit_amount: Money,
    /// Days a customer has to pay the deposit after reserving.
    pub grace_days: i64,
    pub bank: BankDetails,
    /// Receives operator alerts and contact-form messages.
    pub operator_email: String,
}

impl StoreConfig {
    /// | Env Var               | Default                  |
    /// |-----------------------|--------------------------|
    /// | `STORE_CURRENCY`      | `EUR`                    |
    /// | `DEPOSIT_AMOUNT`      | `300`                    |
    /// | `DEPOSIT_GRACE_DAYS`  | `2`                      |
    /// | `BANK_ACCOUNT_HOLDER` | empty                    |
    /// | `BANK_IBAN`           | empty                    |
    /// | `BANK_BIC`            | empty                    |
    /// | `BANK_NAME`           | empty                    |
    /// | `OPERATOR_EMAIL`      | `admin@goldipuppy.local` |
    pub fn from_env() -> Self {
        let text = |name: &str| std::env::var(name).unwrap_or_default();
        Self {
            currency: std::env::var("STORE_CURRENCY")
                .unwrap_or_else(|_| "EUR".into())
                .to_ascii_uppercase(),
            deposit_amount: parse_env("DEPOSIT_AMOUNT", Money::from(300)),
            grace_days: parse_env("DEPOSIT_GRACE_DAYS", DEFAULT_GRACE_PERIOD_DAYS),
            bank: BankDetails {
                account_holder: text("BANK_ACCOUNT_HOLDER"),
                iban: text("BANK_IBAN"),
                bic: text("BANK_BIC"),
                bank_name: text("BANK_NAME"),
            },
            operator_email: std::env::var("OPERATOR_EMAIL")
                .unwrap_or_else(|_| "admin@goldipuppy.local".into()),
        }
    }
}

/// Where uploaded images are written and how they are addressed.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory holding one subdirectory per bucket.
    pub root: PathBuf,
    /// Public URL prefix; image URLs are `{base}/{bucket}/{path}`.
    pub public_base_url: String,
    pub bucket: String,
}

impl StorageConfig {
    /// | Env Var                 | Default                                          |
    /// |-------------------------|--------------------------------------------------|
    /// | `IMAGE_STORAGE_ROOT`    | `./storage`                                      |
    /// | `IMAGE_PUBLIC_BASE_URL` | `http://localhost:3000/storage/v1/object/public` |
    /// | `IMAGE_BUCKET`          | `puppy-images`                                   |
    pub fn from_env() -> Self {
        Self {
            root: std::env::var("IMAGE_STORAGE_ROOT")
                .unwrap_or_else(|_| "./storage".into())
                .into(),
            public_base_url: std::env::var("IMAGE_PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000/storage/v1/object/public".into()),
            bucket: std::env::var("IMAGE_BUCKET").unwrap_or_else(|_| "puppy-images".into()),
        }
    }
}

/// Parse an optional env var, panicking on a malformed value.
fn parse_env<T>(name: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{name} must be a valid value: {e}")),
        Err(_) => default,
    }
}
