use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::amount::Milliunits;
use super::bank::BookingStatus;

/// Ledger-side settlement state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClearedStatus {
    Cleared,
    Uncleared,
    Reconciled,
}

impl From<BookingStatus> for ClearedStatus {
    fn from(status: BookingStatus) -> Self {
        match status {
            BookingStatus::Booked => ClearedStatus::Cleared,
            BookingStatus::Pending => ClearedStatus::Uncleared,
        }
    }
}

/// A transaction already stored in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTransaction {
    pub id: String,
    pub account_id: String,
    pub date: NaiveDate,
    pub amount: Milliunits,
    #[serde(default)]
    pub payee_name: Option<String>,
    pub cleared: ClearedStatus,
    #[serde(default)]
    pub import_id: Option<String>,
    #[serde(default)]
    pub transfer_account_id: Option<String>,
    #[serde(default)]
    pub deleted: bool,
}

impl LedgerTransaction {
    pub fn is_transfer(&self) -> bool {
        self.transfer_account_id.is_some()
    }

    /// Copy of this entry with the cleared flag set, everything else untouched.
    pub fn marked_cleared(&self) -> Self {
        Self {
            cleared: ClearedStatus::Cleared,
            ..self.clone()
        }
    }
}

/// A transaction to be created in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLedgerTransaction {
    pub account_id: String,
    pub date: NaiveDate,
    pub amount: Milliunits,
    pub payee_name: String,
    pub cleared: ClearedStatus,
    pub import_id: String,
}
