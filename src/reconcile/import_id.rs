//! Deterministic import ids.
//!
//! The ledger drops a create whose `import_id` it has already seen, so the id
//! has to come out the same every time the same bank batch is mapped. It is
//! built from the milliunit amount, the settlement date and a 1-based counter
//! that separates same-day, same-amount transactions (two identical coffees).

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::models::{BankTransaction, ClearedStatus, Milliunits, NewLedgerTransaction};

const IMPORT_ID_PREFIX: &str = "YNAB";

pub fn format_import_id(amount: Milliunits, date: NaiveDate, occurrence: u32) -> String {
    format!(
        "{IMPORT_ID_PREFIX}:{amount}:{}:{occurrence}",
        date.format("%Y-%m-%d")
    )
}

/// Occurrence counter for one mapping pass. Build a fresh one per batch.
#[derive(Debug, Default)]
pub struct ImportIdAssigner {
    occurrences: HashMap<(NaiveDate, Milliunits), u32>,
}

impl ImportIdAssigner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self, date: NaiveDate, amount: Milliunits) -> String {
        let occurrence = self.occurrences.entry((date, amount)).or_insert(0);
        *occurrence += 1;
        format_import_id(amount, date, *occurrence)
    }
}

/// Ledger candidate for a bank transaction under a given import id.
pub fn ledger_candidate(
    tx: &BankTransaction,
    account_id: &str,
    import_id: String,
) -> NewLedgerTransaction {
    NewLedgerTransaction {
        account_id: account_id.to_string(),
        date: tx.date,
        amount: tx.milliunits,
        payee_name: tx.payee.clone(),
        cleared: ClearedStatus::from(tx.booking_status),
        import_id,
    }
}

/// Map a batch to ledger candidates, one per input, in input order.
pub fn assign_import_ids(
    transactions: &[BankTransaction],
    account_id: &str,
) -> Vec<NewLedgerTransaction> {
    let mut ids = ImportIdAssigner::new();
    transactions
        .iter()
        .map(|tx| {
            let import_id = ids.next_id(tx.date, tx.milliunits);
            ledger_candidate(tx, account_id, import_id)
        })
        .collect()
}
