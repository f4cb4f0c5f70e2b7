//! Monotonic clock abstraction.
//!
//! The rate limiter and the fetch retry loop both block on wall time
//! (window arithmetic, fixed backoff). Routing time through a trait keeps
//! those paths testable without real sleeps — a 60-second rate window is
//! not something a test can wait out.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Source of monotonic time plus the ability to block on it.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    fn sleep(&self, dur: Duration);
}

/// Production clock: `Instant::now` + `thread::sleep`.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, dur: Duration) {
        std::thread::sleep(dur);
    }
}

/// Manually advanced clock for tests.
///
/// `sleep` advances the clock instead of blocking, so code that waits on
/// a window or a backoff runs instantly under test while still observing
/// the same time arithmetic.
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Move time forward by `dur`.
    pub fn advance(&self, dur: Duration) {
        *self.offset.lock().unwrap() += dur;
    }

    /// Time elapsed since the clock was created.
    pub fn elapsed(&self) -> Duration {
        *self.offset.lock().unwrap()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock().unwrap()
    }

    fn sleep(&self, dur: Duration) {
        self.advance(dur);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances_on_sleep() {
        let clock = ManualClock::new();
        let t0 = clock.now();
        clock.sleep(Duration::from_secs(5));
        assert_eq!(clock.now() - t0, Duration::from_secs(5));
    }

    #[test]
    fn manual_clock_advance_accumulates() {
        let clock = ManualClock::new();
        clock.advance(Duration::from_millis(300));
        clock.advance(Duration::from_millis(700));
        assert_eq!(clock.elapsed(), Duration::from_secs(1));
    }
}
