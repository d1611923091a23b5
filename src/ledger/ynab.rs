//! YNAB v1 REST client.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{CreateOutcome, Ledger};
use crate::config::{LedgerConfig, LedgerCredentials};
use crate::models::{ClearedStatus, LedgerTransaction, NewLedgerTransaction};

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct TransactionsData {
    transactions: Vec<LedgerTransaction>,
}

#[derive(Debug, Deserialize)]
struct CreateData {
    #[serde(default)]
    transaction_ids: Vec<String>,
    #[serde(default)]
    duplicate_import_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
struct TransactionsBody<T: Serialize> {
    transactions: T,
}

#[derive(Debug, Serialize)]
struct ClearedPatch<'a> {
    id: &'a str,
    cleared: ClearedStatus,
}

pub struct YnabClient {
    base_url: String,
    token: SecretString,
    budget_id: String,
    client: Client,
}

impl YnabClient {
    pub fn new(token: SecretString, budget_id: impl Into<String>) -> Self {
        Self {
            base_url: LedgerConfig::default().api_url,
            token,
            budget_id: budget_id.into(),
            client: Client::new(),
        }
    }

    pub fn from_config(config: &LedgerConfig, credentials: &LedgerCredentials) -> Self {
        Self::new(credentials.token.clone(), credentials.budget_id.clone())
            .with_base_url(config.api_url.clone())
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn budget_url(&self, path: &str) -> String {
        format!("{}/budgets/{}{path}", self.base_url, self.budget_id)
    }

    async fn send(&self, request: reqwest::RequestBuilder, what: &str) -> Result<String> {
        let response = request
            .bearer_auth(self.token.expose_secret())
            .send()
            .await
            .with_context(|| format!("YNAB {what} request failed"))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read YNAB response body")?;

        if !status.is_success() {
            tracing::error!(%status, body = %body, "YNAB {what} failed");
            anyhow::bail!("YNAB {what} failed ({status}): {body}");
        }
        Ok(body)
    }
}

#[async_trait::async_trait]
impl Ledger for YnabClient {
    async fn transactions(
        &self,
        account_id: &str,
        since: Option<NaiveDate>,
    ) -> Result<Vec<LedgerTransaction>> {
        let url = self.budget_url(&format!("/accounts/{account_id}/transactions"));
        let mut request = self.client.get(&url);
        if let Some(since) = since {
            request = request.query(&[("since_date", since.format("%Y-%m-%d").to_string())]);
        }

        let body = self.send(request, "transactions").await?;
        let parsed: Envelope<TransactionsData> =
            serde_json::from_str(&body).context("Failed to parse YNAB transactions")?;
        Ok(parsed.data.transactions)
    }

    async fn create_transactions(
        &self,
        transactions: &[NewLedgerTransaction],
    ) -> Result<CreateOutcome> {
        let body = TransactionsBody { transactions };
        let request = self.client.post(self.budget_url("/transactions")).json(&body);

        let body = self.send(request, "create").await?;
        let parsed: Envelope<CreateData> =
            serde_json::from_str(&body).context("Failed to parse YNAB create response")?;
        Ok(CreateOutcome {
            created: parsed.data.transaction_ids,
            duplicate_import_ids: parsed.data.duplicate_import_ids,
        })
    }

    async fn update_transactions(&self, transactions: &[LedgerTransaction]) -> Result<()> {
        let patches: Vec<ClearedPatch<'_>> = transactions
            .iter()
            .map(|tx| ClearedPatch {
                id: &tx.id,
                cleared: tx.cleared,
            })
            .collect();
        let body = TransactionsBody {
            transactions: patches,
        };
        let request = self.client.patch(self.budget_url("/transactions")).json(&body);

        self.send(request, "update").await?;
        Ok(())
    }
}
