//! In-memory ledger for testing.

use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use chrono::NaiveDate;
use tokio::sync::Mutex;

use super::{CreateOutcome, Ledger};
use crate::models::{LedgerTransaction, NewLedgerTransaction};

/// Keeps entries in a vector and drops creates whose import id is already
/// present on the account, the way the hosted ledger does.
#[derive(Default)]
pub struct MemoryLedger {
    entries: Mutex<Vec<LedgerTransaction>>,
    next_id: Mutex<u64>,
    fail_writes: AtomicBool,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transactions(entries: Vec<LedgerTransaction>) -> Self {
        Self {
            entries: Mutex::new(entries),
            ..Self::default()
        }
    }

    /// Make every create/update fail until switched back.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn snapshot(&self) -> Vec<LedgerTransaction> {
        self.entries.lock().await.clone()
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            anyhow::bail!("YNAB write failed (500 Internal Server Error)");
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Ledger for MemoryLedger {
    async fn transactions(
        &self,
        account_id: &str,
        since: Option<NaiveDate>,
    ) -> Result<Vec<LedgerTransaction>> {
        let entries = self.entries.lock().await;
        Ok(entries
            .iter()
            .filter(|e| e.account_id == account_id)
            .filter(|e| match since {
                Some(since) => e.date >= since,
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn create_transactions(
        &self,
        transactions: &[NewLedgerTransaction],
    ) -> Result<CreateOutcome> {
        self.check_writable()?;
        let mut entries = self.entries.lock().await;
        let mut next_id = self.next_id.lock().await;
        let mut outcome = CreateOutcome::default();

        for tx in transactions {
            let seen = entries.iter().any(|e| {
                e.account_id == tx.account_id && e.import_id.as_deref() == Some(&tx.import_id)
            });
            if seen {
                outcome.duplicate_import_ids.push(tx.import_id.clone());
                continue;
            }

            *next_id += 1;
            let id = format!("mem-{}", *next_id);
            entries.push(LedgerTransaction {
                id: id.clone(),
                account_id: tx.account_id.clone(),
                date: tx.date,
                amount: tx.amount,
                payee_name: Some(tx.payee_name.clone()),
                cleared: tx.cleared,
                import_id: Some(tx.import_id.clone()),
                transfer_account_id: None,
                deleted: false,
            });
            outcome.created.push(id);
        }
        Ok(outcome)
    }

    async fn update_transactions(&self, transactions: &[LedgerTransaction]) -> Result<()> {
        self.check_writable()?;
        let mut entries = self.entries.lock().await;
        for update in transactions {
            let Some(entry) = entries.iter_mut().find(|e| e.id == update.id) else {
                anyhow::bail!("YNAB update failed (404 Not Found): transaction {}", update.id);
            };
            entry.cleared = update.cleared;
        }
        Ok(())
    }
}
