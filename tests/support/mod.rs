#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use banksync::bank::MemoryBank;
use banksync::clock::FixedClock;
use banksync::config::FetchFrom;
use banksync::ledger::MemoryLedger;
use banksync::models::{
    BookingStatus, ClearedStatus, LedgerTransaction, Milliunits, RawBankTransaction,
};
use banksync::sync::{SyncAccounts, SyncService, SyncSettings};
use banksync::token_store::MemoryTokenStore;
use chrono::{NaiveDate, TimeZone};
use chrono_tz::Europe::Oslo;
use rust_decimal::Decimal;

pub const LEDGER_ACCOUNT: &str = "checking";
pub const CSV_ACCOUNT: &str = "card";
pub const BANK_ACCOUNT_KEY: &str = "acct-key";

pub fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

/// 2025-01-20 in Oslo.
pub fn today() -> NaiveDate {
    date("2025-01-20")
}

/// Bank transaction settled at noon Oslo time on `day`.
pub fn bank_tx(
    id: &str,
    description: &str,
    cleaned: &str,
    amount: &str,
    day: &str,
    status: BookingStatus,
) -> RawBankTransaction {
    let day = date(day);
    let millis = Oslo
        .from_local_datetime(&day.and_hms_opt(12, 0, 0).unwrap())
        .unwrap()
        .timestamp_millis();
    RawBankTransaction {
        id: id.to_string(),
        description: Some(description.to_string()),
        cleaned_description: Some(cleaned.to_string()),
        amount: Some(Decimal::from_str(amount).unwrap()),
        date: Some(millis),
        kid_or_message: None,
        currency_code: Some("NOK".to_string()),
        booking_status: status,
        account_name: None,
        account_key: Some(BANK_ACCOUNT_KEY.to_string()),
    }
}

pub fn ledger_tx(
    id: &str,
    payee: &str,
    milliunits: i64,
    day: &str,
    cleared: ClearedStatus,
) -> LedgerTransaction {
    LedgerTransaction {
        id: id.to_string(),
        account_id: LEDGER_ACCOUNT.to_string(),
        date: date(day),
        amount: Milliunits::new(milliunits),
        payee_name: Some(payee.to_string()),
        cleared,
        import_id: None,
        transfer_account_id: None,
        deleted: false,
    }
}

pub struct Fixture {
    pub bank: Arc<MemoryBank>,
    pub ledger: Arc<MemoryLedger>,
    pub store: Arc<MemoryTokenStore>,
    pub service: SyncService,
}

pub fn fixture(
    bank_transactions: Vec<RawBankTransaction>,
    ledger_entries: Vec<LedgerTransaction>,
    fetch_from: FetchFrom,
) -> Fixture {
    let bank = Arc::new(MemoryBank::new("seed-token", bank_transactions));
    let ledger = Arc::new(MemoryLedger::with_transactions(ledger_entries));
    let store = Arc::new(MemoryTokenStore::with_values([("refreshToken", "seed-token")]));
    let clock = FixedClock::at_local_noon(today(), Oslo).unwrap();

    let service = SyncService::new(
        bank.clone(),
        ledger.clone(),
        store.clone(),
        SyncAccounts {
            bank_account_key: BANK_ACCOUNT_KEY.to_string(),
            ledger_account_id: LEDGER_ACCOUNT.to_string(),
            csv_account_id: CSV_ACCOUNT.to_string(),
        },
    )
    .with_settings(SyncSettings {
        time_zone: Oslo,
        fetch_from,
        lookback_days: 5,
    })
    .with_clock(Arc::new(clock));

    Fixture {
        bank,
        ledger,
        store,
        service,
    }
}
