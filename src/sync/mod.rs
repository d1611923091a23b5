//! Sync orchestration: bank to ledger runs and statement uploads.

mod report;
mod service;

pub use report::{ImportReport, SyncReport};
pub use service::{SyncAccounts, SyncService, SyncSettings, earliest_fetch_date};

use anyhow::{Context, Result};

use crate::import::{parse_statement, statement_candidates};
use crate::ledger::Ledger;

/// Import a card statement into `account_id`.
///
/// Only rows posted after the newest non-transfer entry already on the account
/// are submitted; an empty account takes every row. The statement path does
/// no clear-vs-add matching.
pub async fn import_statement(
    ledger: &dyn Ledger,
    account_id: &str,
    content: &str,
) -> Result<ImportReport> {
    let parsed = parse_statement(content)?;
    let after = ledger
        .latest_transaction_date(account_id)
        .await
        .context("Failed to look up latest ledger transaction date")?
        .unwrap_or_else(earliest_fetch_date);

    let candidates = statement_candidates(&parsed.rows, after, account_id);
    let mut report = ImportReport {
        parsed: parsed.rows.len(),
        rejected: parsed.rejected.len(),
        after: Some(after),
        submitted: candidates.len(),
        ..ImportReport::default()
    };
    tracing::info!(
        parsed = report.parsed,
        rejected = report.rejected,
        after = %after,
        new = report.submitted,
        "Parsed statement"
    );

    if candidates.is_empty() {
        return Ok(report);
    }

    let outcome = ledger
        .create_transactions(&candidates)
        .await
        .context("Failed to create ledger transactions")?;
    report.created = outcome.created.len();
    report.duplicate_import_ids = outcome.duplicate_import_ids;
    Ok(report)
}
