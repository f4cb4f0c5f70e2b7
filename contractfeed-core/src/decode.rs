//! Wire-format decoding for the daily contract payload.
//!
//! A day's body is a JSON array of record objects with PascalCase keys.
//! Decoding is strict about shape (a malformed payload is a schema
//! mismatch, not a transient fault, so the caller must not retry it) but
//! lenient about per-record content: a missing ticker or agency becomes
//! an empty string and is dealt with downstream.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use std::str::FromStr;
use thiserror::Error;

/// Raised when a day's payload is not a well-formed record array.
#[derive(Debug, Error)]
#[error("malformed day payload: {0}")]
pub struct DecodeError(#[from] serde_json::Error);

/// One reported contract/spend event, scoped to one fetch call.
#[derive(Debug, Clone, PartialEq)]
pub struct RawContract {
    pub report_date: NaiveDate,
    pub ticker: String,
    pub description: Option<String>,
    pub agency: String,
    pub amount: Decimal,
}

#[derive(Debug, Deserialize)]
struct WireRecord {
    #[serde(rename = "Date", deserialize_with = "de_wire_date")]
    date: NaiveDate,

    #[serde(rename = "Ticker", default)]
    ticker: Option<String>,

    #[serde(rename = "Description", default)]
    description: Option<String>,

    #[serde(rename = "Agency", default)]
    agency: Option<String>,

    #[serde(rename = "Amount", deserialize_with = "de_wire_amount")]
    amount: Decimal,
}

impl From<WireRecord> for RawContract {
    fn from(wire: WireRecord) -> Self {
        Self {
            report_date: wire.date,
            ticker: wire.ticker.unwrap_or_default(),
            description: wire.description,
            agency: wire.agency.unwrap_or_default(),
            amount: wire.amount,
        }
    }
}

/// The vendor has emitted both plain dates and date-times for `Date`.
fn de_wire_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    NaiveDate::parse_from_str(&text, "%Y-%m-%d")
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(&text, "%Y-%m-%dT%H:%M:%S")
                .map(|dt| dt.date())
        })
        .map_err(|_| serde::de::Error::custom(format!("unrecognized date '{text}'")))
}

/// `Amount` arrives as a JSON number, occasionally as a quoted string.
/// Both go through decimal text parsing so no float representation ever
/// touches the value we persist. The number route relies on serde_json's
/// `arbitrary_precision` feature: without it `Number` is an f64 and
/// `to_string` gives the shortest float rendering, which drops trailing
/// zeros (`1000.50` → `"1000.5"`) and breaks the exact-line dedup key.
fn de_wire_amount<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wire {
        Number(serde_json::Number),
        Text(String),
    }

    let text = match Wire::deserialize(deserializer)? {
        Wire::Number(n) => n.to_string(),
        Wire::Text(s) => s,
    };

    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|e| serde::de::Error::custom(format!("unparseable amount '{text}': {e}")))
}

/// Decode one day's payload into typed records.
pub fn decode_day(body: &str) -> Result<Vec<RawContract>, DecodeError> {
    let wire: Vec<WireRecord> = serde_json::from_str(body)?;
    Ok(wire.into_iter().map(RawContract::from).collect())
}
