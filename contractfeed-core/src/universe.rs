//! Universe snapshot rows — which entities were active on a date, with
//! their permanent identifiers.
//!
//! Ticker-to-identifier mapping is an external collaborator behind the
//! [`IdentifierResolver`] trait. Whether the capability exists at all is
//! decided once at pipeline construction; this module only deals with
//! per-record resolution.

use crate::aggregate::{entity_key, sanitize_description};
use crate::decode::RawContract;
use chrono::NaiveDate;
use thiserror::Error;

/// Market identifier passed to the resolver for every lookup.
pub const PRIMARY_MARKET: &str = "usa";

/// Raised by a resolver when a ticker cannot be mapped as of a date.
/// Always handled at record granularity — it never aborts a day.
#[derive(Debug, Error)]
#[error("identifier resolution failed: {0}")]
pub struct ResolveError(pub String);

/// Maps a ticker to its permanent entity identifier as of a date.
pub trait IdentifierResolver: Send + Sync {
    fn resolve(
        &self,
        ticker: &str,
        market: &str,
        is_equity: bool,
        as_of: NaiveDate,
    ) -> Result<String, ResolveError>;
}

/// Universe rows for one date, plus the tickers that failed to resolve.
#[derive(Debug, Default)]
pub struct UniverseBuild {
    pub rows: Vec<String>,
    pub unresolved: Vec<String>,
}

/// Build the universe rows for a day's records.
///
/// Each record becomes `{entityId},{ticker},{description},{agency},{amount}`
/// when its ticker resolves; tickers the resolver rejects are collected in
/// `unresolved` for the caller to report. Records without a usable ticker
/// are dropped here without comment — aggregation already counted them.
pub fn build_universe(
    date: NaiveDate,
    records: &[RawContract],
    resolver: &dyn IdentifierResolver,
) -> UniverseBuild {
    let mut build = UniverseBuild::default();

    for record in records {
        let Some(ticker) = entity_key(&record.ticker) else {
            continue;
        };

        let entity_id = match resolver.resolve(&ticker, PRIMARY_MARKET, true, date) {
            Ok(id) => id,
            Err(_) => {
                build.unresolved.push(ticker);
                continue;
            }
        };

        let description = record
            .description
            .as_deref()
            .map(sanitize_description)
            .unwrap_or_default();

        build.rows.push(format!(
            "{entity_id},{ticker},{description},{},{}",
            record.agency, record.amount
        ));
    }

    build
}
