//! Per-entity aggregation of a day's records into ledger rows.
//!
//! Groups decoded records by normalized ticker and renders each as the
//! line that will live in that entity's ledger file. Rendering is the
//! dedup boundary: two records that format to the same line are the same
//! contract as far as the ledgers are concerned.

use crate::decode::RawContract;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Result of aggregating one day: ledger rows per entity, plus how many
/// records were dropped for having no usable ticker.
#[derive(Debug, Default)]
pub struct Aggregation {
    pub rows: BTreeMap<String, Vec<String>>,
    pub skipped_malformed: usize,
}

/// Normalize a raw ticker into an entity key: trimmed and uppercased.
/// Returns `None` for empty or whitespace-only tickers.
pub fn entity_key(ticker: &str) -> Option<String> {
    let trimmed = ticker.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_uppercase())
}

/// Make a description safe to embed as one CSV field on one line:
/// commas become semicolons, any newline becomes a single space.
pub fn sanitize_description(description: &str) -> String {
    description
        .replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
        .replace(',', ";")
}

/// Render one record as its ledger line for the given processing date.
///
/// The line is `{date:%Y%m%d},{description},{agency},{amount}` with the
/// amount in plain decimal notation — full precision, no separators.
pub fn ledger_row(date: NaiveDate, record: &RawContract) -> String {
    let description = record
        .description
        .as_deref()
        .map(sanitize_description)
        .unwrap_or_default();
    format!(
        "{},{},{},{}",
        date.format("%Y%m%d"),
        description,
        record.agency,
        record.amount
    )
}

/// Group a day's records into per-entity ledger rows.
///
/// Records whose ticker normalizes to nothing are counted and dropped,
/// never aborting the day. The map is ordered, so downstream writes (and
/// their logs) visit entities deterministically.
pub fn ledger_rows(date: NaiveDate, records: &[RawContract]) -> Aggregation {
    let mut out = Aggregation::default();

    for record in records {
        let Some(key) = entity_key(&record.ticker) else {
            out.skipped_malformed += 1;
            continue;
        };
        out.rows.entry(key).or_default().push(ledger_row(date, record));
    }

    out
}
