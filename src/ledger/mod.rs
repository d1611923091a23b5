mod memory;
pub mod ynab;

pub use memory::MemoryLedger;
pub use ynab::YnabClient;

use anyhow::Result;
use chrono::NaiveDate;

use crate::models::{LedgerTransaction, NewLedgerTransaction};

/// What the ledger reported back from a batch create.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateOutcome {
    /// Ids of the entries that were actually created.
    pub created: Vec<String>,
    /// Import ids the ledger had already seen; those candidates were dropped.
    pub duplicate_import_ids: Vec<String>,
}

/// Budgeting ledger holding the synced accounts.
#[async_trait::async_trait]
pub trait Ledger: Send + Sync {
    /// Entries on `account_id`, restricted to `since` and later when given.
    async fn transactions(
        &self,
        account_id: &str,
        since: Option<NaiveDate>,
    ) -> Result<Vec<LedgerTransaction>>;

    async fn create_transactions(
        &self,
        transactions: &[NewLedgerTransaction],
    ) -> Result<CreateOutcome>;

    /// Write back the cleared flag of existing entries.
    async fn update_transactions(&self, transactions: &[LedgerTransaction]) -> Result<()>;

    /// Date of the newest entry on `account_id`, not counting transfers.
    async fn latest_transaction_date(&self, account_id: &str) -> Result<Option<NaiveDate>> {
        let entries = self.transactions(account_id, None).await?;
        Ok(latest_non_transfer_date(&entries))
    }
}

/// Newest date among live, non-transfer entries.
pub fn latest_non_transfer_date(entries: &[LedgerTransaction]) -> Option<NaiveDate> {
    entries
        .iter()
        .filter(|entry| !entry.deleted && !entry.is_transfer())
        .map(|entry| entry.date)
        .max()
}
