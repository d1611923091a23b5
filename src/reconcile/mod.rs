//! Decide, per bank transaction, whether the ledger needs a new entry, an
//! existing entry flipped to cleared, or nothing at all.
//!
//! Card purchases show up twice at the bank: first as a PENDING entry with a
//! tidy description ("Netonnet"), later as BOOKED with the raw card text
//! ("*3301 25.12 NOK 250.00 NETONNET SANDNES Kurs: 1.0000"). If the pending
//! one is already in the ledger as uncleared, the booked one should clear it
//! rather than land next to it.
//!
//! A booked transaction matches a ledger entry when the milliunit amounts are
//! equal and the bank's raw description contains the ledger payee name,
//! ignoring case. The payee is compared as stored, surrounding whitespace
//! included. Dates are not compared. When several ledger entries match,
//! the first one in ledger order is used; which one wins in that case is not
//! a promise, so the plan lists such cases under [`ReconcilePlan::ambiguous`].

mod import_id;

pub use import_id::{
    assign_import_ids, format_import_id, ledger_candidate, ImportIdAssigner,
};

use std::collections::HashSet;

use crate::models::{BankTransaction, ClearedStatus, LedgerTransaction, NewLedgerTransaction};

/// A booked bank transaction that matched a ledger entry already settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlreadyCleared {
    pub bank_id: String,
    pub ledger_id: String,
}

/// A bank transaction whose description/amount matched more than one ledger
/// entry. `chosen` is the entry the plan acted on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmbiguousMatch {
    pub bank_id: String,
    pub chosen: String,
    pub candidates: Vec<String>,
}

/// Writes to apply to the ledger, plus what was left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub to_add: Vec<NewLedgerTransaction>,
    /// Existing entries with `cleared` set; payee and everything else as found.
    pub to_clear: Vec<LedgerTransaction>,
    pub skipped: Vec<AlreadyCleared>,
    pub ambiguous: Vec<AmbiguousMatch>,
}

impl ReconcilePlan {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_clear.is_empty()
    }
}

/// Whether `ledger` looks like an earlier recording of `bank`.
pub fn is_match(bank: &BankTransaction, ledger: &LedgerTransaction) -> bool {
    if ledger.deleted || ledger.amount != bank.milliunits {
        return false;
    }
    let (Some(description), Some(payee)) = (bank.description.as_deref(), ledger.payee_name.as_deref())
    else {
        return false;
    };
    // An empty payee is contained in every description.
    if payee.is_empty() {
        return false;
    }
    description.to_lowercase().contains(&payee.to_lowercase())
}

/// Build the write plan for one sync run.
///
/// `ledger` is the recent window of the target account. Import ids are
/// assigned over the whole bank batch in input order, so a re-run over the same
/// batch reproduces them no matter how the ledger changed in between.
///
/// Once an uncleared entry has been claimed by one bank transaction it is not
/// offered to later ones in the same batch; two identical booked purchases
/// against a single pending recording clear it once and add the other.
pub fn reconcile(
    bank: &[BankTransaction],
    ledger: &[LedgerTransaction],
    account_id: &str,
) -> ReconcilePlan {
    let candidates = assign_import_ids(bank, account_id);
    let mut plan = ReconcilePlan::default();
    let mut claimed: HashSet<&str> = HashSet::new();

    for (tx, candidate) in bank.iter().zip(candidates) {
        if tx.is_pending() {
            plan.to_add.push(candidate);
            continue;
        }

        let matches: Vec<&LedgerTransaction> = ledger
            .iter()
            .filter(|entry| !claimed.contains(entry.id.as_str()))
            .filter(|entry| is_match(tx, entry))
            .collect();

        let Some(first) = matches.first().copied() else {
            plan.to_add.push(candidate);
            continue;
        };

        if matches.len() > 1 {
            plan.ambiguous.push(AmbiguousMatch {
                bank_id: tx.id.clone(),
                chosen: first.id.clone(),
                candidates: matches.iter().map(|m| m.id.clone()).collect(),
            });
        }

        claimed.insert(first.id.as_str());
        match first.cleared {
            ClearedStatus::Uncleared => plan.to_clear.push(first.marked_cleared()),
            ClearedStatus::Cleared | ClearedStatus::Reconciled => {
                plan.skipped.push(AlreadyCleared {
                    bank_id: tx.id.clone(),
                    ledger_id: first.id.clone(),
                })
            }
        }
    }

    plan
}
