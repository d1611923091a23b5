//! Persistence for the sync state that survives between runs.
//!
//! Two values live here: the bank refresh token (rotated on every sync, the
//! old one stops working as soon as a new one is issued) and the date of the
//! last successful sync. Backends only need plain get/set by key:
//!
//! ```toml
//! [token_store]
//! backend = "file"
//! path = "/var/lib/banksync/state.json"
//! ```

mod config;
mod file;
mod kv_rest;
mod memory;

pub use config::TokenStoreConfig;
pub use file::JsonFileTokenStore;
pub use kv_rest::KvRestTokenStore;
pub use memory::MemoryTokenStore;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use secrecy::{ExposeSecret, SecretString};

/// A string key-value store.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Returns `Ok(None)` if the key doesn't exist.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Keys the sync state is stored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStateKey {
    RefreshToken,
    LastSyncDate,
}

impl SyncStateKey {
    pub fn as_str(self) -> &'static str {
        match self {
            SyncStateKey::RefreshToken => "refreshToken",
            SyncStateKey::LastSyncDate => "lastSyncDate",
        }
    }
}

/// Typed view over a [`TokenStore`].
pub struct SyncState<'a> {
    store: &'a dyn TokenStore,
}

impl<'a> SyncState<'a> {
    pub fn new(store: &'a dyn TokenStore) -> Self {
        Self { store }
    }

    pub async fn refresh_token(&self) -> Result<Option<SecretString>> {
        let value = self.store.get(SyncStateKey::RefreshToken.as_str()).await?;
        Ok(value
            .filter(|v| !v.trim().is_empty())
            .map(SecretString::from))
    }

    pub async fn set_refresh_token(&self, token: &SecretString) -> Result<()> {
        self.store
            .set(SyncStateKey::RefreshToken.as_str(), token.expose_secret())
            .await
            .context("Failed to persist refresh token")
    }

    pub async fn last_sync_date(&self) -> Result<Option<NaiveDate>> {
        let Some(value) = self.store.get(SyncStateKey::LastSyncDate.as_str()).await? else {
            return Ok(None);
        };
        let value = value.trim();
        if value.is_empty() {
            return Ok(None);
        }
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(Some)
            .with_context(|| format!("Stored lastSyncDate is not a date: {value:?}"))
    }

    pub async fn set_last_sync_date(&self, date: NaiveDate) -> Result<()> {
        self.store
            .set(
                SyncStateKey::LastSyncDate.as_str(),
                &date.format("%Y-%m-%d").to_string(),
            )
            .await
            .context("Failed to persist last sync date")
    }
}
