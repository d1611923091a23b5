mod memory;
pub mod sparebank1;

pub use memory::MemoryBank;
pub use sparebank1::SpareBank1Client;

use anyhow::Result;
use chrono::NaiveDate;
use secrecy::SecretString;

use crate::models::RawBankTransaction;

/// Tokens issued by a refresh. The bank invalidates the refresh token it was
/// given, so `refresh_token` must be persisted before anything else happens.
#[derive(Debug, Clone)]
pub struct AccessGrant {
    pub access_token: SecretString,
    pub refresh_token: SecretString,
}

/// Bank transaction API.
#[async_trait::async_trait]
pub trait BankApi: Send + Sync {
    /// Exchange a refresh token for a fresh access/refresh token pair.
    async fn refresh(&self, refresh_token: &SecretString) -> Result<AccessGrant>;

    /// Transactions on `account_key` from `from` (inclusive) onward, as the
    /// bank returns them.
    async fn fetch_transactions(
        &self,
        access_token: &SecretString,
        account_key: &str,
        from: NaiveDate,
    ) -> Result<Vec<RawBankTransaction>>;
}
