//! Daily feed trait and structured fetch errors.
//!
//! The `DailyFeed` trait abstracts over the remote source of daily
//! contract records so the pipeline can be driven by the real HTTP
//! backend or a mock in tests. Backends own their transport quirks
//! (retries, the 401 redirect reissue); callers only see the taxonomy
//! below.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors surfaced by a feed backend.
///
/// Transient transport failures are retried inside the backend and never
/// escape individually; callers see either the terminal
/// `RetriesExhausted` or the non-retryable cases.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The remote has no data published for this date (HTTP 404).
    /// Normal for weekends and holidays. Never retried.
    #[error("no data published for {date}")]
    NotFound { date: NaiveDate },

    /// Every attempt failed with a transient error (network, non-2xx
    /// status, unreadable body) and the attempt budget ran out.
    #[error("fetch failed after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },

    /// The backend cannot issue the request at all (bad endpoint URL,
    /// unusable client configuration).
    #[error("feed misconfigured: {0}")]
    Invalid(String),
}

/// A source of one day's worth of raw records.
///
/// Implementations are expected to be cheap to share (`&self` methods)
/// and safe to call from a worker thread.
pub trait DailyFeed: Send + Sync {
    /// Human-readable name of this backend, for logs.
    fn name(&self) -> &str;

    /// Fetch the raw payload for one processing date.
    ///
    /// Returns the response body on success; `FeedError::NotFound` when
    /// the remote has nothing for the date.
    fn fetch_day(&self, date: NaiveDate) -> Result<String, FeedError>;
}
