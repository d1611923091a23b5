//! Token store backed by a single JSON object on disk.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use tokio::sync::Mutex;

use super::TokenStore;

/// Stores all keys in one JSON file:
///
/// ```json
/// { "lastSyncDate": "2025-01-31", "refreshToken": "..." }
/// ```
///
/// Writes go to a sibling temp file that is then renamed over the original.
pub struct JsonFileTokenStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileTokenStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    /// `<data dir>/banksync/sync-state.json`, e.g. `~/.local/share/banksync/`.
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::data_dir().context("Could not find data directory")?;
        Ok(dir.join("banksync").join("sync-state.json"))
    }

    async fn read_all(&self) -> Result<BTreeMap<String, String>> {
        match fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse token store {}", self.path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to read token store {}", self.path.display())),
        }
    }

    async fn write_all(&self, values: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }
        let content = serde_json::to_string_pretty(values).context("Failed to serialize JSON")?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl TokenStore for JsonFileTokenStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut values = self.read_all().await?;
        values.insert(key.to_string(), value.to_string());
        self.write_all(&values).await
    }
}
