//! Sliding one-second window rate limiter.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use super::clock::{Clock, SystemClock};
use super::Throttle;

/// Length of the accounting window.
const WINDOW: Duration = Duration::from_secs(1);

/// Default calls permitted per window.
const DEFAULT_RATE_PER_SECOND: usize = 100;

/// Permits dispatch while fewer than `rate_per_second` calls were recorded
/// during the last second.
///
/// Permission is only recomputed on `tick`, so recording calls between ticks
/// does not flip `can_request` on its own.
#[derive(Debug, Clone)]
pub struct SlidingWindow<C: Clock = SystemClock> {
    rate_per_second: usize,
    calls: VecDeque<Instant>,
    permitted: bool,
    clock: C,
}

impl SlidingWindow<SystemClock> {
    pub fn new(rate_per_second: usize) -> Self {
        Self::with_clock(rate_per_second, SystemClock)
    }
}

impl Default for SlidingWindow<SystemClock> {
    fn default() -> Self {
        Self::new(DEFAULT_RATE_PER_SECOND)
    }
}

impl<C: Clock> SlidingWindow<C> {
    /// Builds a window driven by `clock`. A rate of 0 is raised to 1 so the
    /// window can always drain.
    pub fn with_clock(rate_per_second: usize, clock: C) -> Self {
        Self {
            rate_per_second: rate_per_second.max(1),
            calls: VecDeque::new(),
            permitted: true,
            clock,
        }
    }

    pub fn rate_per_second(&self) -> usize {
        self.rate_per_second
    }

    pub fn set_rate_per_second(&mut self, rate_per_second: usize) {
        self.rate_per_second = rate_per_second.max(1);
    }

    /// Number of calls currently retained in the window.
    pub fn retained(&self) -> usize {
        self.calls.len()
    }

    fn purge_older_calls(&mut self) {
        if self.calls.is_empty() {
            return;
        }
        let now = self.clock.now();
        self.calls
            .retain(|when| now.saturating_duration_since(*when) <= WINDOW);
    }
}

impl<C: Clock> Throttle for SlidingWindow<C> {
    fn can_request(&self) -> bool {
        self.permitted
    }

    fn record_call(&mut self, when: Option<Instant>) {
        let when = when.unwrap_or_else(|| self.clock.now());
        self.calls.push_back(when);
    }

    /// Time elapsed since the oldest retained call. This is a wait hint, not
    /// an exact bound on when the window reopens.
    fn estimate(&self) -> Option<Duration> {
        let now = self.clock.now();
        let oldest = self.calls.iter().min();
        Some(
            oldest
                .map(|when| {
                    if now >= *when {
                        now - *when
                    } else {
                        *when - now
                    }
                })
                .unwrap_or(Duration::ZERO),
        )
    }

    fn tick(&mut self) {
        self.purge_older_calls();
        self.permitted = self.calls.len() < self.rate_per_second;
    }

    fn reset(&mut self) {
        self.calls.clear();
        self.permitted = true;
    }

    fn record_transfer(&mut self, elapsed: Duration) {
        let now = self.clock.now();
        self.record_call(Some(now.checked_sub(elapsed).unwrap_or(now)));
    }
}
