//! Token store backend selection.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::{JsonFileTokenStore, KvRestTokenStore, MemoryTokenStore, TokenStore};
use crate::config::KvCredentials;

/// Which backend holds the sync state.
///
/// ```toml
/// [token_store]
/// backend = "kv"
/// ```
///
/// The `kv` backend reads its endpoint and token from `KV_REST_API_URL` and
/// `KV_REST_API_TOKEN`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum TokenStoreConfig {
    /// JSON file on local disk. Defaults to the user data directory.
    File {
        #[serde(default)]
        path: Option<PathBuf>,
    },
    /// Redis-over-REST service.
    Kv,
    /// Process memory; nothing survives a restart.
    Memory,
}

impl Default for TokenStoreConfig {
    fn default() -> Self {
        TokenStoreConfig::File { path: None }
    }
}

impl TokenStoreConfig {
    /// Anchor a relative file path at `dir`.
    pub fn resolve_relative_to(self, dir: &Path) -> Self {
        match self {
            TokenStoreConfig::File { path: Some(path) } if path.is_relative() => {
                TokenStoreConfig::File {
                    path: Some(dir.join(path)),
                }
            }
            other => other,
        }
    }

    /// Build the configured store. `kv` is only consulted by the kv backend.
    pub fn build(
        &self,
        kv: impl FnOnce() -> Result<KvCredentials>,
    ) -> Result<Box<dyn TokenStore>> {
        match self {
            TokenStoreConfig::File { path } => {
                let path = match path {
                    Some(path) => path.clone(),
                    None => JsonFileTokenStore::default_path()?,
                };
                Ok(Box::new(JsonFileTokenStore::new(path)))
            }
            TokenStoreConfig::Kv => {
                let creds = kv().context("The kv token store needs KV REST credentials")?;
                Ok(Box::new(KvRestTokenStore::new(creds.url, creds.token)))
            }
            TokenStoreConfig::Memory => Ok(Box::new(MemoryTokenStore::new())),
        }
    }
}
