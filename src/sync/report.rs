use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

/// Outcome of one bank sync.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Date the bank was asked for transactions from.
    pub from_date: Option<NaiveDate>,
    /// Transactions returned by the bank.
    pub fetched: usize,
    /// Fetched transactions dropped for missing amount/date/payee.
    pub invalid: usize,
    /// New ledger entries created.
    pub added: usize,
    /// Existing uncleared entries flipped to cleared.
    pub cleared: usize,
    /// Booked transactions whose ledger entry was already cleared.
    pub skipped: usize,
    /// Booked transactions that matched more than one ledger entry.
    pub ambiguous: usize,
    /// Import ids the ledger already knew; nothing was written for these.
    pub duplicate_import_ids: Vec<String>,
    /// Date stored as `lastSyncDate`; `None` when the run stopped early.
    pub last_sync_date: Option<NaiveDate>,
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fetched {}, added {}, cleared {}, skipped {}",
            self.fetched, self.added, self.cleared, self.skipped
        )?;
        if self.invalid > 0 {
            write!(f, ", invalid {}", self.invalid)?;
        }
        if !self.duplicate_import_ids.is_empty() {
            write!(f, ", duplicates {}", self.duplicate_import_ids.len())?;
        }
        if self.ambiguous > 0 {
            write!(f, ", ambiguous {}", self.ambiguous)?;
        }
        Ok(())
    }
}

/// Outcome of one statement upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Rows that parsed.
    pub parsed: usize,
    /// Rows dropped as malformed.
    pub rejected: usize,
    /// Newest non-transfer ledger date the rows were compared against.
    pub after: Option<NaiveDate>,
    /// Rows newer than `after`, i.e. submitted to the ledger.
    pub submitted: usize,
    pub created: usize,
    pub duplicate_import_ids: Vec<String>,
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.submitted == 0 {
            return write!(f, "No new transactions to import");
        }
        write!(f, "Successfully imported {} transactions", self.submitted)
    }
}
