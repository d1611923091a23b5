use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AmountError {
    #[error("amount {0} does not fit in ledger milliunits")]
    OutOfRange(Decimal),
    #[error("invalid amount {value:?}: {reason}")]
    Unparseable { value: String, reason: String },
}

/// Ledger amount in milliunits (currency units × 1000).
///
/// Every conversion from a bank decimal goes through [`Milliunits::from_decimal`]
/// so import ids and ledger matching agree on the rounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Milliunits(i64);

impl Milliunits {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(self) -> i64 {
        self.0
    }

    /// Scale by 1000 and round half away from zero.
    pub fn from_decimal(amount: Decimal) -> Result<Self, AmountError> {
        let scaled = amount
            .checked_mul(Decimal::ONE_THOUSAND)
            .ok_or(AmountError::OutOfRange(amount))?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        scaled
            .to_i64()
            .map(Self)
            .ok_or(AmountError::OutOfRange(amount))
    }

    /// Parse a locale-formatted amount such as `-1 234,50` or `250.00`.
    ///
    /// Decimal commas are accepted; spaces (including non-breaking ones) are
    /// treated as thousands separators.
    pub fn parse_localized(raw: &str) -> Result<Self, AmountError> {
        let cleaned: String = raw
            .trim()
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| if c == ',' { '.' } else { c })
            .collect();
        let decimal = Decimal::from_str(&cleaned).map_err(|e| AmountError::Unparseable {
            value: raw.to_string(),
            reason: e.to_string(),
        })?;
        Self::from_decimal(decimal)
    }
}

impl fmt::Display for Milliunits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
