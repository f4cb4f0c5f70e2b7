//! Sliding-window rate limiter for outbound API requests.
//!
//! The remote API tolerates at most N requests in any rolling window of
//! length W (100 per 60 seconds for this feed). `acquire` blocks the
//! caller until granting one more permit keeps that bound intact.
//!
//! The limiter keeps a log of grant times rather than a refilling token
//! bucket: a bucket of capacity N refilled at N/W can hand out close to
//! 2N inside a single window after a burst, which violates the bound the
//! provider enforces.

use crate::clock::{Clock, SystemClock};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Blocking rate gate. Safe to share across threads; permit decisions are
/// serialized under one lock. No fairness guarantee — only the bound.
pub struct RateLimiter {
    grants: Mutex<VecDeque<std::time::Instant>>,
    permits: usize,
    window: Duration,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    /// Limiter granting at most `permits` permits per rolling `window`.
    pub fn new(permits: usize, window: Duration) -> Self {
        Self::with_clock(permits, window, Arc::new(SystemClock))
    }

    pub fn with_clock(permits: usize, window: Duration, clock: Arc<dyn Clock>) -> Self {
        assert!(permits > 0, "rate limiter needs at least one permit");
        Self {
            grants: Mutex::new(VecDeque::with_capacity(permits)),
            permits,
            window,
            clock,
        }
    }

    /// Block until a permit can be granted without exceeding the bound.
    pub fn acquire(&self) {
        loop {
            let wait = {
                let mut grants = self.grants.lock().unwrap();
                let now = self.clock.now();

                // Grants older than one window no longer count against the bound.
                while let Some(&front) = grants.front() {
                    if now.duration_since(front) >= self.window {
                        grants.pop_front();
                    } else {
                        break;
                    }
                }

                if grants.len() < self.permits {
                    grants.push_back(now);
                    return;
                }

                // Full: the oldest grant leaves the window at front + window.
                // wait is strictly positive here, otherwise the prune above
                // would have removed the front entry.
                let front = *grants.front().expect("grant log is non-empty when full");
                (front + self.window).saturating_duration_since(now)
            };
            self.clock.sleep(wait);
        }
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("permits", &self.permits)
            .field("window", &self.window)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[test]
    fn grants_up_to_capacity_without_blocking() {
        let clock = Arc::new(ManualClock::new());
        let limiter = RateLimiter::with_clock(3, Duration::from_secs(60), clock.clone());

        for _ in 0..3 {
            limiter.acquire();
        }
        assert_eq!(clock.elapsed(), Duration::ZERO);
    }

    #[test]
    fn blocks_until_window_frees_a_slot() {
        let clock = Arc::new(ManualClock::new());
        let limiter = RateLimiter::with_clock(2, Duration::from_secs(10), clock.clone());

        limiter.acquire();
        limiter.acquire();
        limiter.acquire(); // must wait out the full window

        assert_eq!(clock.elapsed(), Duration::from_secs(10));
    }

    #[test]
    fn expired_grants_free_capacity() {
        let clock = Arc::new(ManualClock::new());
        let limiter = RateLimiter::with_clock(2, Duration::from_secs(10), clock.clone());

        limiter.acquire();
        limiter.acquire();
        clock.advance(Duration::from_secs(6));

        // Oldest grant (t=0) expires at t=10, so this waits 4 more seconds.
        limiter.acquire();
        assert_eq!(clock.elapsed(), Duration::from_secs(10));

        // Both t=0 grants have aged out by now, so another permit is free.
        limiter.acquire();
        assert_eq!(clock.elapsed(), Duration::from_secs(10));
    }

    #[test]
    fn shared_across_threads() {
        let limiter = Arc::new(RateLimiter::new(4, Duration::from_millis(40)));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let l = limiter.clone();
            handles.push(std::thread::spawn(move || l.acquire()));
        }
        for h in handles {
            h.join().unwrap();
        }
        // 8 acquisitions through a 4-permit window must span at least one window.
    }

    #[test]
    #[should_panic(expected = "at least one permit")]
    fn zero_permits_is_rejected() {
        let _ = RateLimiter::new(0, Duration::from_secs(1));
    }
}
