//! SpareBank 1 personal banking API client.
//!
//! Authentication is OAuth2 with a long-lived refresh token. Each refresh
//! returns a new refresh token and revokes the one that was used.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::{AccessGrant, BankApi};
use crate::config::{BankConfig, BankCredentials};
use crate::models::RawBankTransaction;

const TRANSACTIONS_ACCEPT: &str = "application/vnd.sparebank1.v1+json;charset=utf-8";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
}

#[derive(Debug, Deserialize)]
struct TransactionsResponse {
    #[serde(default)]
    transactions: Vec<RawBankTransaction>,
}

pub struct SpareBank1Client {
    auth_url: String,
    api_url: String,
    client_id: String,
    client_secret: SecretString,
    client: Client,
}

impl SpareBank1Client {
    pub fn new(client_id: impl Into<String>, client_secret: SecretString) -> Self {
        let defaults = BankConfig::default();
        Self {
            auth_url: defaults.auth_url,
            api_url: defaults.api_url,
            client_id: client_id.into(),
            client_secret,
            client: Client::new(),
        }
    }

    pub fn from_config(config: &BankConfig, credentials: &BankCredentials) -> Self {
        Self::new(
            credentials.client_id.clone(),
            credentials.client_secret.clone(),
        )
        .with_auth_url(config.auth_url.clone())
        .with_api_url(config.api_url.clone())
    }

    pub fn with_auth_url(mut self, url: impl Into<String>) -> Self {
        self.auth_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Point both the auth and data endpoints at one server (tests).
    pub fn with_base_url(self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.with_auth_url(url.clone()).with_api_url(url)
    }
}

async fn read_success_body(response: reqwest::Response, what: &str) -> Result<String> {
    let status = response.status();
    let body = response
        .text()
        .await
        .with_context(|| format!("Failed to read {what} response body"))?;

    if !status.is_success() {
        tracing::error!(%status, body = %body, "{what} failed");
        anyhow::bail!("{what} failed ({status}): {body}");
    }
    Ok(body)
}

#[async_trait::async_trait]
impl BankApi for SpareBank1Client {
    async fn refresh(&self, refresh_token: &SecretString) -> Result<AccessGrant> {
        tracing::debug!("Refreshing bank access token");
        let url = format!("{}/oauth/token", self.auth_url);
        let form = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret()),
            ("refresh_token", refresh_token.expose_secret()),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .client
            .post(&url)
            .form(&form)
            .send()
            .await
            .context("Token refresh request failed")?;
        let body = read_success_body(response, "Token refresh").await?;

        let token: TokenResponse =
            serde_json::from_str(&body).context("Failed to parse token response")?;
        Ok(AccessGrant {
            access_token: SecretString::from(token.access_token),
            refresh_token: SecretString::from(token.refresh_token),
        })
    }

    async fn fetch_transactions(
        &self,
        access_token: &SecretString,
        account_key: &str,
        from: NaiveDate,
    ) -> Result<Vec<RawBankTransaction>> {
        let url = format!("{}/personal/banking/transactions", self.api_url);
        let from_date = from.format("%Y-%m-%d").to_string();
        tracing::debug!(%url, from_date = %from_date, "Fetching bank transactions");

        let response = self
            .client
            .get(&url)
            .query(&[("accountKey", account_key), ("fromDate", from_date.as_str())])
            .bearer_auth(access_token.expose_secret())
            .header(reqwest::header::ACCEPT, TRANSACTIONS_ACCEPT)
            .send()
            .await
            .context("Bank transactions request failed")?;
        let body = read_success_body(response, "Bank transactions request").await?;

        let parsed: TransactionsResponse =
            serde_json::from_str(&body).context("Failed to parse bank API response")?;
        Ok(parsed.transactions)
    }
}
