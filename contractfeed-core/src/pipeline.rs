//! Ingestion orchestrator — drives one date, then a date range.
//!
//! Each date runs the strict stage order fetch → decode → aggregate →
//! merge-write, and every failure is caught at the date boundary: a bad
//! day is reported and the range moves on. Ledger merges that completed
//! before a later stage failed stay on disk — merges are idempotent, so
//! re-running the same date later is always safe and convergent.

use crate::aggregate::ledger_rows;
use crate::decode::decode_day;
use crate::feed::{DailyFeed, FeedError};
use crate::store::LedgerStore;
use crate::universe::{build_universe, IdentifierResolver};
use chrono::{NaiveDate, Utc};
use std::fmt;

/// Stage at which a date's processing failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Decode,
    Ledgers,
    Universe,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Fetch => "fetch",
            Stage::Decode => "decode",
            Stage::Ledgers => "ledger write",
            Stage::Universe => "universe write",
        };
        f.write_str(name)
    }
}

/// What one completed date produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateReport {
    /// Records decoded from the day's payload
    pub records: usize,
    /// Ledger files merged into
    pub entities: usize,
    /// Records dropped for having no usable ticker
    pub skipped_malformed: usize,
    /// Universe rows produced (0 when resolution is unavailable)
    pub universe_rows: usize,
    /// Tickers the resolver could not map
    pub unresolved: usize,
    /// Whether a universe snapshot was written
    pub universe_written: bool,
}

/// Outcome of processing one date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateOutcome {
    /// All stages ran; ledgers (and possibly a universe snapshot) merged.
    Completed(DateReport),
    /// The remote had nothing for this date (404). Normal for weekends
    /// and holidays; nothing was written.
    NoData,
    /// The date is unset or not strictly in the past; no fetch attempted.
    SkippedInvalidDate,
    /// A stage failed; the date can be retried manually later.
    Failed { stage: Stage, message: String },
}

impl DateOutcome {
    /// True only when the full pipeline ran to completion.
    pub fn succeeded(&self) -> bool {
        matches!(self, DateOutcome::Completed(_))
    }
}

/// Summary of a range run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub total: usize,
    pub completed: usize,
    pub no_data: usize,
    pub skipped_invalid: usize,
    pub failed: usize,
    pub errors: Vec<(NaiveDate, String)>,
}

impl RunSummary {
    /// A clean run had no failed dates. No-data and skipped dates are
    /// expected (weekends, holidays, misconfigured ranges) and do not
    /// make a run dirty.
    pub fn clean(&self) -> bool {
        self.failed == 0
    }

    fn record(&mut self, date: NaiveDate, outcome: &DateOutcome) {
        self.total += 1;
        match outcome {
            DateOutcome::Completed(_) => self.completed += 1,
            DateOutcome::NoData => self.no_data += 1,
            DateOutcome::SkippedInvalidDate => self.skipped_invalid += 1,
            DateOutcome::Failed { stage, message } => {
                self.failed += 1;
                self.errors.push((date, format!("{stage}: {message}")));
            }
        }
    }
}

/// Progress callbacks for a run.
pub trait RunObserver: Send {
    /// Called before a date's pipeline starts.
    fn on_date_start(&self, date: NaiveDate, index: usize, total: usize);

    /// Called when records were dropped for having no usable ticker.
    fn on_malformed_records(&self, date: NaiveDate, count: usize);

    /// Called when tickers could not be resolved to identifiers.
    fn on_unresolved_tickers(&self, date: NaiveDate, tickers: &[String]);

    /// Called when a date's pipeline finishes, however it ended.
    fn on_date_complete(&self, date: NaiveDate, index: usize, total: usize, outcome: &DateOutcome);

    /// Called once after the whole range.
    fn on_run_complete(&self, summary: &RunSummary);
}

/// Progress reporter that prints to stdout, warnings and failures to
/// stderr.
pub struct StdoutReporter;

impl RunObserver for StdoutReporter {
    fn on_date_start(&self, date: NaiveDate, index: usize, total: usize) {
        println!("[{}/{}] Processing {date}...", index + 1, total);
    }

    fn on_malformed_records(&self, date: NaiveDate, count: usize) {
        eprintln!("  WARNING: {date}: dropped {count} records without a usable ticker");
    }

    fn on_unresolved_tickers(&self, date: NaiveDate, tickers: &[String]) {
        eprintln!(
            "  WARNING: {date}: no identifier for {}",
            tickers.join(", ")
        );
    }

    fn on_date_complete(&self, date: NaiveDate, _index: usize, _total: usize, outcome: &DateOutcome) {
        match outcome {
            DateOutcome::Completed(report) => {
                let universe = if report.universe_written {
                    format!(", universe {} rows", report.universe_rows)
                } else {
                    String::new()
                };
                println!(
                    "  OK: {} records into {} ledgers{universe}",
                    report.records, report.entities
                );
            }
            DateOutcome::NoData => eprintln!("  NO DATA: nothing published for {date}"),
            DateOutcome::SkippedInvalidDate => {
                eprintln!("  SKIP: {date} is not processable (unset or not in the past)")
            }
            DateOutcome::Failed { stage, message } => {
                eprintln!("  FAIL: {date} at {stage}: {message}")
            }
        }
    }

    fn on_run_complete(&self, summary: &RunSummary) {
        println!(
            "\nIngest complete: {}/{} dates ingested, {} without data, {} skipped, {} failed",
            summary.completed, summary.total, summary.no_data, summary.skipped_invalid, summary.failed
        );
    }
}

/// A date may be processed only when it is set and strictly before today.
fn date_is_processable(date: NaiveDate, today: NaiveDate) -> bool {
    date != NaiveDate::MIN && date < today
}

/// Run the full pipeline for one date.
///
/// Never returns an error: every stage failure is folded into the
/// [`DateOutcome`] so a range run can keep going. Pass `resolver: None`
/// when identifier reference data is unavailable — ledgers are still
/// written, the universe snapshot is skipped entirely.
pub fn process_date(
    feed: &dyn DailyFeed,
    store: &LedgerStore,
    resolver: Option<&dyn IdentifierResolver>,
    observer: &dyn RunObserver,
    date: NaiveDate,
) -> DateOutcome {
    if !date_is_processable(date, Utc::now().date_naive()) {
        return DateOutcome::SkippedInvalidDate;
    }

    let body = match feed.fetch_day(date) {
        Ok(body) => body,
        Err(FeedError::NotFound { .. }) => return DateOutcome::NoData,
        Err(e) => {
            return DateOutcome::Failed {
                stage: Stage::Fetch,
                message: e.to_string(),
            }
        }
    };

    let records = match decode_day(&body) {
        Ok(records) => records,
        Err(e) => {
            return DateOutcome::Failed {
                stage: Stage::Decode,
                message: e.to_string(),
            }
        }
    };

    let aggregation = ledger_rows(date, &records);
    if aggregation.skipped_malformed > 0 {
        observer.on_malformed_records(date, aggregation.skipped_malformed);
    }

    let mut report = DateReport {
        records: records.len(),
        entities: aggregation.rows.len(),
        skipped_malformed: aggregation.skipped_malformed,
        ..DateReport::default()
    };

    for (entity, rows) in aggregation.rows {
        if let Err(e) = store.merge_ledger(&entity, rows) {
            return DateOutcome::Failed {
                stage: Stage::Ledgers,
                message: format!("{entity}: {e}"),
            };
        }
    }

    if let Some(resolver) = resolver {
        let build = build_universe(date, &records, resolver);
        if !build.unresolved.is_empty() {
            observer.on_unresolved_tickers(date, &build.unresolved);
        }
        report.unresolved = build.unresolved.len();
        report.universe_rows = build.rows.len();

        if !build.rows.is_empty() {
            if let Err(e) = store.merge_universe(date, build.rows) {
                return DateOutcome::Failed {
                    stage: Stage::Universe,
                    message: e.to_string(),
                };
            }
            report.universe_written = true;
        }
    }

    DateOutcome::Completed(report)
}

/// Run the pipeline for every date in `from..=to`, calendar days,
/// in order. Dates are fully independent; one bad day never stops the
/// range.
pub fn process_range(
    feed: &dyn DailyFeed,
    store: &LedgerStore,
    resolver: Option<&dyn IdentifierResolver>,
    observer: &dyn RunObserver,
    from: NaiveDate,
    to: NaiveDate,
) -> RunSummary {
    let dates: Vec<NaiveDate> = from.iter_days().take_while(|d| *d <= to).collect();
    let total = dates.len();

    let mut summary = RunSummary::default();

    for (index, date) in dates.into_iter().enumerate() {
        observer.on_date_start(date, index, total);
        let outcome = process_date(feed, store, resolver, observer, date);
        observer.on_date_complete(date, index, total, &outcome);
        summary.record(date, &outcome);
    }

    observer.on_run_complete(&summary);
    summary
}
