//! ContractFeed Core — rate-limited ingestion of daily contract records
//! into per-entity CSV ledgers.
//!
//! This crate contains the whole ingestion pipeline:
//! - Rolling-window rate limiter gating every outbound request
//! - Resilient daily fetch with retries and the vendor's 401 quirk
//! - Wire decoding into typed records
//! - Per-entity aggregation and CSV row rendering
//! - Universe snapshot building against an identifier resolver
//! - Idempotent merge-writes into the on-disk ledger store
//! - The per-date / date-range orchestrator

pub mod aggregate;
pub mod clock;
pub mod config;
pub mod decode;
pub mod feed;
pub mod http;
pub mod merge;
pub mod pipeline;
pub mod rate_limit;
pub mod store;
pub mod universe;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything that crosses the pipeline's seams
    /// is Send + Sync, so a future concurrent fetcher needs no retrofit.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<decode::RawContract>();
        require_sync::<decode::RawContract>();

        require_send::<rate_limit::RateLimiter>();
        require_sync::<rate_limit::RateLimiter>();

        require_send::<http::HttpFeed>();
        require_sync::<http::HttpFeed>();

        require_send::<feed::FeedError>();
        require_sync::<feed::FeedError>();

        require_send::<store::LedgerStore>();
        require_sync::<store::LedgerStore>();

        require_send::<pipeline::DateOutcome>();
        require_sync::<pipeline::DateOutcome>();

        require_send::<pipeline::RunSummary>();
        require_sync::<pipeline::RunSummary>();

        require_send::<config::FeedConfig>();
        require_sync::<config::FeedConfig>();
    }
}
