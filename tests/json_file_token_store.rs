use anyhow::Result;
use banksync::token_store::{JsonFileTokenStore, SyncState, TokenStore};
use chrono::NaiveDate;
use secrecy::{ExposeSecret, SecretString};
use tempfile::TempDir;

#[tokio::test]
async fn missing_file_reads_as_empty() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("state.json");
    let store = JsonFileTokenStore::new(&path);

    assert_eq!(store.get("refreshToken").await?, None);
    assert!(!path.exists());
    Ok(())
}

#[tokio::test]
async fn values_survive_a_new_store_instance() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("nested").join("state.json");

    {
        let store = JsonFileTokenStore::new(&path);
        let state = SyncState::new(&store);
        state
            .set_refresh_token(&SecretString::from("rt-1".to_string()))
            .await?;
        state
            .set_last_sync_date(NaiveDate::from_ymd_opt(2025, 1, 20).unwrap())
            .await?;
    }

    let store = JsonFileTokenStore::new(&path);
    let state = SyncState::new(&store);
    assert_eq!(
        state.refresh_token().await?.map(|t| t.expose_secret().to_string()),
        Some("rt-1".to_string())
    );
    assert_eq!(
        state.last_sync_date().await?,
        Some(NaiveDate::from_ymd_opt(2025, 1, 20).unwrap())
    );

    let on_disk: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
    assert_eq!(on_disk["lastSyncDate"], "2025-01-20");
    assert!(!path.with_extension("json.tmp").exists());
    Ok(())
}

#[tokio::test]
async fn set_keeps_other_keys() -> Result<()> {
    let dir = TempDir::new()?;
    let store = JsonFileTokenStore::new(dir.path().join("state.json"));

    store.set("refreshToken", "rt-1").await?;
    store.set("lastSyncDate", "2025-01-20").await?;
    store.set("refreshToken", "rt-2").await?;

    assert_eq!(store.get("refreshToken").await?.as_deref(), Some("rt-2"));
    assert_eq!(store.get("lastSyncDate").await?.as_deref(), Some("2025-01-20"));
    Ok(())
}

#[tokio::test]
async fn corrupt_file_is_an_error() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("state.json");
    std::fs::write(&path, "{not json")?;

    let store = JsonFileTokenStore::new(&path);
    assert!(store.get("refreshToken").await.is_err());
    Ok(())
}
