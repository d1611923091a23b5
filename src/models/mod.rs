mod amount;
mod bank;
mod ledger;

pub use amount::{AmountError, Milliunits};
pub use bank::{
    epoch_millis_to_local_date, BankTransaction, BookingStatus, InvalidTransaction,
    RawBankTransaction,
};
pub use ledger::{ClearedStatus, LedgerTransaction, NewLedgerTransaction};
