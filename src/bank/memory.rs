//! In-memory bank for testing.

use anyhow::Result;
use chrono::NaiveDate;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;

use super::{AccessGrant, BankApi};
use crate::models::RawBankTransaction;

struct State {
    valid_refresh_token: String,
    rotations: u32,
    fetches: Vec<(String, NaiveDate)>,
}

/// Serves a fixed set of transactions and rotates refresh tokens like the real
/// bank: each refresh issues `refresh-{n}` and revokes the token it was given.
pub struct MemoryBank {
    transactions: Vec<RawBankTransaction>,
    state: Mutex<State>,
}

impl MemoryBank {
    pub fn new(refresh_token: impl Into<String>, transactions: Vec<RawBankTransaction>) -> Self {
        Self {
            transactions,
            state: Mutex::new(State {
                valid_refresh_token: refresh_token.into(),
                rotations: 0,
                fetches: Vec::new(),
            }),
        }
    }

    /// The refresh token the bank currently accepts.
    pub async fn valid_refresh_token(&self) -> String {
        self.state.lock().await.valid_refresh_token.clone()
    }

    /// `(account_key, from)` of every fetch, in call order.
    pub async fn fetches(&self) -> Vec<(String, NaiveDate)> {
        self.state.lock().await.fetches.clone()
    }
}

#[async_trait::async_trait]
impl BankApi for MemoryBank {
    async fn refresh(&self, refresh_token: &SecretString) -> Result<AccessGrant> {
        let mut state = self.state.lock().await;
        if refresh_token.expose_secret() != state.valid_refresh_token {
            anyhow::bail!("Token refresh failed (400 Bad Request): invalid_grant");
        }
        state.rotations += 1;
        state.valid_refresh_token = format!("refresh-{}", state.rotations);
        Ok(AccessGrant {
            access_token: SecretString::from(format!("access-{}", state.rotations)),
            refresh_token: SecretString::from(state.valid_refresh_token.clone()),
        })
    }

    async fn fetch_transactions(
        &self,
        access_token: &SecretString,
        account_key: &str,
        from: NaiveDate,
    ) -> Result<Vec<RawBankTransaction>> {
        let mut state = self.state.lock().await;
        if !access_token.expose_secret().starts_with("access-") {
            anyhow::bail!("Bank transactions request failed (401 Unauthorized)");
        }
        state.fetches.push((account_key.to_string(), from));
        Ok(self.transactions.clone())
    }
}
