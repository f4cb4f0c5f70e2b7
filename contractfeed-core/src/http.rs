//! HTTP feed backend.
//!
//! Fetches one day of records from the vendor's REST API. Handles rate
//! limiting, fixed-delay retries, the 404 no-data answer, and the
//! vendor's 401 redirect quirk: an unauthorized response carrying a
//! `Location` header means "ask again over there", and the reissued GET
//! does not count against the attempt budget.
//!
//! The quirk is this API's problem, not a general pattern — it stays
//! behind the `DailyFeed` trait so other backends never see it.

use crate::clock::{Clock, SystemClock};
use crate::config::ApiConfig;
use crate::feed::{DailyFeed, FeedError};
use crate::rate_limit::RateLimiter;
use chrono::NaiveDate;
use reqwest::{StatusCode, Url};
use std::sync::Arc;
use std::time::Duration;

/// Outcome of one physical GET, reduced to what the retry loop cares about.
#[derive(Debug)]
enum Attempt {
    /// 2xx with a readable body.
    Ok(String),
    /// HTTP 404 — the remote has nothing for this date.
    NotFound,
    /// HTTP 401, with the redirect target if the response carried one.
    Unauthorized { location: Option<String> },
    /// Anything worth retrying: network error, other status, body read failure.
    Transient(String),
}

/// The retry state machine, independent of any transport.
///
/// `attempt` performs one physical GET: against the primary URL when the
/// target is `None`, against a 401 redirect target otherwise. At most
/// `max_attempts` budgeted attempts run, with a fixed `backoff` between
/// them; the 401 reissue is an extra physical call inside its attempt.
fn run_attempts(
    date: NaiveDate,
    max_attempts: u32,
    backoff: Duration,
    clock: &dyn Clock,
    mut attempt: impl FnMut(Option<&str>) -> Attempt,
) -> Result<String, FeedError> {
    let mut last = String::from("no attempts made");

    for n in 1..=max_attempts {
        if n > 1 {
            clock.sleep(backoff);
        }

        let mut outcome = attempt(None);

        // 401 quirk: reissue once against the redirect target, then
        // evaluate whatever comes back as if it were the first answer.
        if let Attempt::Unauthorized {
            location: Some(loc),
        } = &outcome
        {
            let loc = loc.clone();
            outcome = attempt(Some(&loc));
        }

        match outcome {
            Attempt::Ok(body) => return Ok(body),
            Attempt::NotFound => return Err(FeedError::NotFound { date }),
            Attempt::Unauthorized { .. } => last = "HTTP 401 unauthorized".into(),
            Attempt::Transient(cause) => last = cause,
        }
    }

    Err(FeedError::RetriesExhausted {
        attempts: max_attempts,
        last,
    })
}

/// Blocking HTTP implementation of [`DailyFeed`].
pub struct HttpFeed {
    client: reqwest::blocking::Client,
    limiter: Arc<RateLimiter>,
    clock: Arc<dyn Clock>,
    endpoint: Url,
    resource: String,
    auth_token: String,
    max_attempts: u32,
    backoff: Duration,
}

impl HttpFeed {
    pub fn new(config: &ApiConfig, limiter: Arc<RateLimiter>) -> Result<Self, FeedError> {
        Self::with_clock(config, limiter, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: &ApiConfig,
        limiter: Arc<RateLimiter>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, FeedError> {
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|e| FeedError::Invalid(format!("endpoint '{}': {e}", config.endpoint)))?;

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FeedError::Invalid(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            limiter,
            clock,
            endpoint,
            resource: config.resource.clone(),
            auth_token: config.auth_token.clone(),
            max_attempts: config.max_attempts,
            backoff: Duration::from_secs(config.backoff_secs),
        })
    }

    /// Build `{endpoint}/live/{resource}?date={yyyyMMdd}` with proper
    /// escaping of the path segment and query value.
    fn day_url(&self, date: NaiveDate) -> Result<Url, FeedError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| FeedError::Invalid("endpoint cannot be a base URL".into()))?
            .pop_if_empty()
            .push("live")
            .push(&self.resource);
        url.query_pairs_mut()
            .append_pair("date", &date.format("%Y%m%d").to_string());
        Ok(url)
    }

    /// One physical GET. Every call consumes a rate-limiter permit,
    /// including the 401 reissue.
    fn attempt_once(&self, url: Url) -> Attempt {
        self.limiter.acquire();

        let request = self
            .client
            .get(url)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {}", self.auth_token),
            )
            .header(reqwest::header::ACCEPT, "application/json");

        match request.send() {
            Ok(resp) => {
                let status = resp.status();

                if status == StatusCode::NOT_FOUND {
                    return Attempt::NotFound;
                }

                if status == StatusCode::UNAUTHORIZED {
                    let location = resp
                        .headers()
                        .get(reqwest::header::LOCATION)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_owned);
                    return Attempt::Unauthorized { location };
                }

                if !status.is_success() {
                    return Attempt::Transient(format!("HTTP {status}"));
                }

                match resp.text() {
                    Ok(body) => Attempt::Ok(body),
                    Err(e) => Attempt::Transient(format!("body read failed: {e}")),
                }
            }
            Err(e) => Attempt::Transient(format!("request failed: {e}")),
        }
    }
}

impl DailyFeed for HttpFeed {
    fn name(&self) -> &str {
        "http"
    }

    fn fetch_day(&self, date: NaiveDate) -> Result<String, FeedError> {
        let primary = self.day_url(date)?;

        run_attempts(
            date,
            self.max_attempts,
            self.backoff,
            self.clock.as_ref(),
            |target| {
                let url = match target {
                    None => primary.clone(),
                    // The redirect target may be absolute or relative;
                    // resolve it against the URL we just asked.
                    Some(loc) => match primary.join(loc) {
                        Ok(u) => u,
                        Err(e) => {
                            return Attempt::Transient(format!("bad redirect target '{loc}': {e}"))
                        }
                    },
                };
                self.attempt_once(url)
            },
        )
    }
}
