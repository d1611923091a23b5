use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::amount::{AmountError, Milliunits};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Booked,
    Pending,
}

/// A transaction as returned by the bank API. Every field except the id and
/// booking status may be missing on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBankTransaction {
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cleaned_description: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub date: Option<i64>,
    #[serde(default)]
    pub kid_or_message: Option<String>,
    #[serde(default)]
    pub currency_code: Option<String>,
    pub booking_status: BookingStatus,
    #[serde(default)]
    pub account_name: Option<String>,
    #[serde(default)]
    pub account_key: Option<String>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InvalidTransaction {
    #[error("transaction {id} has no amount")]
    MissingAmount { id: String },
    #[error("transaction {id} has no date")]
    MissingDate { id: String },
    #[error("transaction {id} has an out-of-range date {millis}")]
    InvalidDate { id: String, millis: i64 },
    #[error("transaction {id} has neither a cleaned nor a raw description")]
    MissingPayee { id: String },
    #[error("transaction {id}: {source}")]
    Amount {
        id: String,
        #[source]
        source: AmountError,
    },
}

/// A bank transaction that passed validation: it has an amount, a settlement
/// date and a payee text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankTransaction {
    pub id: String,
    /// Raw description; on booked card transactions this is the long form,
    /// e.g. `*3301 25.12 NOK 250.00 NETONNET SANDNES Kurs: 1.0000`.
    pub description: Option<String>,
    /// Short payee text used when writing new ledger entries.
    pub payee: String,
    pub amount: Decimal,
    pub milliunits: Milliunits,
    /// Settlement date in the configured time zone.
    pub date: NaiveDate,
    pub booking_status: BookingStatus,
    pub currency_code: Option<String>,
    pub account_key: Option<String>,
}

impl BankTransaction {
    /// Validate a wire transaction, converting its epoch date into a calendar
    /// day in `tz`.
    pub fn from_raw(raw: RawBankTransaction, tz: Tz) -> Result<Self, InvalidTransaction> {
        let amount = raw.amount.ok_or_else(|| InvalidTransaction::MissingAmount {
            id: raw.id.clone(),
        })?;
        let millis = raw.date.ok_or_else(|| InvalidTransaction::MissingDate {
            id: raw.id.clone(),
        })?;
        let date = epoch_millis_to_local_date(millis, tz).ok_or_else(|| {
            InvalidTransaction::InvalidDate {
                id: raw.id.clone(),
                millis,
            }
        })?;
        let payee = non_empty(raw.cleaned_description.as_deref())
            .or_else(|| non_empty(raw.description.as_deref()))
            .ok_or_else(|| InvalidTransaction::MissingPayee { id: raw.id.clone() })?;
        let milliunits =
            Milliunits::from_decimal(amount).map_err(|source| InvalidTransaction::Amount {
                id: raw.id.clone(),
                source,
            })?;

        Ok(Self {
            id: raw.id,
            description: raw.description,
            payee,
            amount,
            milliunits,
            date,
            booking_status: raw.booking_status,
            currency_code: raw.currency_code,
            account_key: raw.account_key,
        })
    }

    pub fn is_pending(&self) -> bool {
        self.booking_status == BookingStatus::Pending
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub fn epoch_millis_to_local_date(millis: i64, tz: Tz) -> Option<NaiveDate> {
    let utc = DateTime::<Utc>::from_timestamp_millis(millis)?;
    Some(utc.with_timezone(&tz).date_naive())
}
