//! Redis-over-REST token store (Upstash / Vercel KV style API).
//!
//! `GET {url}/get/{key}` answers `{"result": "value"}` or `{"result": null}`;
//! `POST {url}/set/{key}` takes the raw value as the request body.

use anyhow::{Context, Result};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::TokenStore;

pub struct KvRestTokenStore {
    base_url: String,
    token: SecretString,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct KvResponse {
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

impl KvRestTokenStore {
    pub fn new(base_url: impl Into<String>, token: SecretString) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            client: Client::new(),
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder, what: &str) -> Result<KvResponse> {
        let response = request
            .bearer_auth(self.token.expose_secret())
            .send()
            .await
            .with_context(|| format!("KV {what} request failed"))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read KV response body")?;

        if !status.is_success() {
            anyhow::bail!("KV {what} failed ({status}): {body}");
        }

        let parsed: KvResponse =
            serde_json::from_str(&body).context("Failed to parse KV response")?;
        if let Some(error) = parsed.error {
            anyhow::bail!("KV {what} failed: {error}");
        }
        Ok(parsed)
    }
}

#[async_trait::async_trait]
impl TokenStore for KvRestTokenStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let url = format!("{}/get/{key}", self.base_url);
        let response = self.send(self.client.get(&url), "get").await?;

        match response.result {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(serde_json::Value::String(value)) => Ok(Some(value)),
            // Values written by other clients may come back as JSON scalars.
            Some(other) => Ok(Some(other.to_string())),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let url = format!("{}/set/{key}", self.base_url);
        self.send(self.client.post(&url).body(value.to_string()), "set")
            .await?;
        Ok(())
    }
}
