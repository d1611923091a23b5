//! Parsing for day-granular windows like "5d" or "2w".
//!
//! The ledger lookback and similar settings are counted in whole calendar
//! days, so anything finer than a day is rejected rather than rounded.

use anyhow::{Context, Result};
use serde::{de, Deserialize, Deserializer, Serializer};

/// Parse a window string into a number of days.
///
/// Supported units:
/// - `d` - days
/// - `w` - weeks (7 days)
///
/// The input is case-insensitive and whitespace is trimmed.
///
/// # Examples
///
/// ```
/// use banksync::duration::parse_days;
///
/// assert_eq!(parse_days("5d").unwrap(), 5);
/// assert_eq!(parse_days("2W").unwrap(), 14);
/// ```
pub fn parse_days(s: &str) -> Result<u32> {
    let s = s.trim().to_lowercase();
    let (num, per_unit) = if let Some(num) = s.strip_suffix('d') {
        (num, 1)
    } else if let Some(num) = s.strip_suffix('w') {
        (num, 7)
    } else {
        anyhow::bail!("Window must end with d or w, got {s:?}");
    };

    let num: u32 = num
        .parse()
        .with_context(|| format!("Invalid number in window {s:?}"))?;
    num.checked_mul(per_unit).context("Window is too large")
}

/// Format a day count the way [`parse_days`] accepts it, preferring weeks
/// when the count divides evenly.
pub fn format_days(days: u32) -> String {
    if days >= 7 && days % 7 == 0 {
        format!("{}w", days / 7)
    } else {
        format!("{days}d")
    }
}

/// Serde deserializer for window strings.
///
/// Use with `#[serde(deserialize_with = "deserialize_days")]`.
pub fn deserialize_days<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_days(&s).map_err(de::Error::custom)
}

/// Serde serializer writing a day count back as a window string.
pub fn serialize_days<S>(days: &u32, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_days(*days))
}
