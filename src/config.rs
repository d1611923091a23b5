//! Configuration.
//!
//! Non-secret settings come from an optional TOML file; credentials and
//! account identifiers come from the environment (a `.env` file is honoured
//! by the binaries). A missing required variable is a startup error.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono_tz::Tz;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::duration::{deserialize_days, serialize_days};
use crate::token_store::TokenStoreConfig;

pub const ENV_BANK_CLIENT_ID: &str = "BANK_CLIENT_ID";
pub const ENV_BANK_CLIENT_SECRET: &str = "BANK_CLIENT_SECRET";
pub const ENV_BANK_ACCOUNT_KEY: &str = "BANK_ACCOUNT_KEY";
pub const ENV_YNAB_TOKEN: &str = "YNAB_TOKEN";
pub const ENV_YNAB_BUDGET_ID: &str = "YNAB_BUDGET_ID";
pub const ENV_YNAB_ACCOUNT_ID: &str = "YNAB_ACCOUNT_ID";
pub const ENV_YNAB_CSV_ACCOUNT_ID: &str = "YNAB_CREDIT_CARD_ACCOUNT_ID";
pub const ENV_BASIC_AUTH_USER: &str = "BASIC_AUTH_USER";
pub const ENV_BASIC_AUTH_PASSWORD: &str = "BASIC_AUTH_PASSWORD";
pub const ENV_KV_REST_API_URL: &str = "KV_REST_API_URL";
pub const ENV_KV_REST_API_TOKEN: &str = "KV_REST_API_TOKEN";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing env variable: {0}")]
    MissingEnv(&'static str),
    #[error("Unknown time zone {0:?}")]
    UnknownTimeZone(String),
}

fn default_timezone() -> String {
    "Europe/Oslo".to_string()
}

fn default_lookback_days() -> u32 {
    5
}

/// Where a sync starts fetching bank transactions from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchFrom {
    /// The stored `lastSyncDate`, or today when none is stored yet.
    LastSyncDate,
    /// The date of the newest transaction already in the ledger account.
    #[default]
    LatestLedgerDate,
}

/// Bank API endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BankConfig {
    pub auth_url: String,
    pub api_url: String,
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            auth_url: "https://api-auth.sparebank1.no".to_string(),
            api_url: "https://api.sparebank1.no".to_string(),
        }
    }
}

/// Ledger API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub api_url: String,

    /// How far back to look for ledger entries a booked transaction could
    /// clear, e.g. "5d" or "1w".
    #[serde(
        default = "default_lookback_days",
        deserialize_with = "deserialize_days",
        serialize_with = "serialize_days"
    )]
    pub lookback_days: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.ynab.com/v1".to_string(),
            lookback_days: default_lookback_days(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// IANA zone used to turn bank timestamps into calendar days and to
    /// decide what "today" is.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    #[serde(default)]
    pub fetch_from: FetchFrom,

    #[serde(default)]
    pub bank: BankConfig,

    #[serde(default)]
    pub ledger: LedgerConfig,

    #[serde(default)]
    pub token_store: TokenStoreConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            fetch_from: FetchFrom::default(),
            bank: BankConfig::default(),
            ledger: LedgerConfig::default(),
            token_store: TokenStoreConfig::default(),
        }
    }
}

impl Config {
    /// Load config from a TOML file. Relative paths inside it are resolved
    /// against the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        if let Some(dir) = path.parent() {
            config.token_store = config.token_store.resolve_relative_to(dir);
        }
        config.time_zone()?;

        Ok(config)
    }

    /// Load config from a file, or return default config if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn time_zone(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::UnknownTimeZone(self.timezone.clone()))
    }
}

/// Returns the default config file path.
///
/// `./banksync.toml` if it exists, otherwise
/// `~/.local/share/banksync/banksync.toml`.
pub fn default_config_path() -> PathBuf {
    let local_config = PathBuf::from("banksync.toml");
    if local_config.exists() {
        return local_config;
    }

    if let Some(data_dir) = dirs::data_dir() {
        return data_dir.join("banksync").join("banksync.toml");
    }

    local_config
}

fn require(lookup: &impl Fn(&str) -> Option<String>, key: &'static str) -> Result<String, ConfigError> {
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingEnv(key))
}

fn optional(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// OAuth client and account for the bank API.
#[derive(Debug, Clone)]
pub struct BankCredentials {
    pub client_id: String,
    pub client_secret: SecretString,
    pub account_key: String,
}

impl BankCredentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            client_id: require(&lookup, ENV_BANK_CLIENT_ID)?,
            client_secret: SecretString::from(require(&lookup, ENV_BANK_CLIENT_SECRET)?),
            account_key: require(&lookup, ENV_BANK_ACCOUNT_KEY)?,
        })
    }
}

/// Personal access token, budget and target accounts in the ledger.
#[derive(Debug, Clone)]
pub struct LedgerCredentials {
    pub token: SecretString,
    pub budget_id: String,
    /// Account bank transactions are synced into.
    pub account_id: String,
    /// Account CSV uploads are imported into; defaults to `account_id`.
    pub csv_account_id: String,
}

impl LedgerCredentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let account_id = require(&lookup, ENV_YNAB_ACCOUNT_ID)?;
        let csv_account_id =
            optional(&lookup, ENV_YNAB_CSV_ACCOUNT_ID).unwrap_or_else(|| account_id.clone());
        Ok(Self {
            token: SecretString::from(require(&lookup, ENV_YNAB_TOKEN)?),
            budget_id: require(&lookup, ENV_YNAB_BUDGET_ID)?,
            account_id,
            csv_account_id,
        })
    }
}

/// Username/password guarding the CSV upload endpoint.
#[derive(Debug, Clone)]
pub struct BasicAuthCredentials {
    pub username: String,
    pub password: SecretString,
}

impl BasicAuthCredentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            username: require(&lookup, ENV_BASIC_AUTH_USER)?,
            password: SecretString::from(require(&lookup, ENV_BASIC_AUTH_PASSWORD)?),
        })
    }
}

/// Endpoint and token for the KV REST token store.
#[derive(Debug, Clone)]
pub struct KvCredentials {
    pub url: String,
    pub token: SecretString,
}

impl KvCredentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            url: require(&lookup, ENV_KV_REST_API_URL)?,
            token: SecretString::from(require(&lookup, ENV_KV_REST_API_TOKEN)?),
        })
    }
}
