//! Manual statement import for accounts the bank API does not expose.

mod statement;

pub use statement::{parse_statement, Column, CsvRowError, ParsedStatement, StatementRow};

use chrono::NaiveDate;

use crate::models::{ClearedStatus, NewLedgerTransaction};
use crate::reconcile::ImportIdAssigner;

/// Ledger candidates for the rows posted strictly after `after`.
///
/// Rows are written as cleared with the statement description as payee.
/// Import ids are counted over the kept rows only, in file order.
pub fn statement_candidates(
    rows: &[StatementRow],
    after: NaiveDate,
    account_id: &str,
) -> Vec<NewLedgerTransaction> {
    let mut ids = ImportIdAssigner::new();
    rows.iter()
        .filter(|row| row.posting_date > after)
        .map(|row| NewLedgerTransaction {
            account_id: account_id.to_string(),
            date: row.posting_date,
            amount: row.amount,
            payee_name: row.description.clone(),
            cleared: ClearedStatus::Cleared,
            import_id: ids.next_id(row.posting_date, row.amount),
        })
        .collect()
}
