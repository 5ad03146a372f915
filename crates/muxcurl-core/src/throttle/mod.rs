//! Global rate limiting consulted before each dispatch batch.
//!
//! A `Throttle` answers "can I dispatch now?" and "how long until I can?".
//! The scheduler ticks it once per loop iteration and records every finished
//! transfer into it.

mod clock;
mod open;
mod window;

pub use clock::{Clock, ManualClock, SystemClock};
pub use open::OpenThrottle;
pub use window::SlidingWindow;

use std::time::{Duration, Instant};

/// Pluggable rate-limiting strategy.
pub trait Throttle {
    /// Returns true if new transfers may be dispatched now.
    fn can_request(&self) -> bool;

    /// Records a call at `when`, or at the current time when `None`.
    fn record_call(&mut self, when: Option<Instant>);

    /// Estimated wait until dispatch is permitted again.
    ///
    /// `Some(ZERO)` means "not permitted but there is nothing useful to wait
    /// for, keep polling"; `None` means no estimate is available.
    fn estimate(&self) -> Option<Duration>;

    /// Advances internal state and recomputes permission.
    fn tick(&mut self);

    /// Clears all accumulated state.
    fn reset(&mut self);

    /// Records a finished transfer that ran for `elapsed`, stamped at its start.
    fn record_transfer(&mut self, elapsed: Duration) {
        self.record_call(Instant::now().checked_sub(elapsed));
    }
}

impl<T: Throttle + ?Sized> Throttle for Box<T> {
    fn can_request(&self) -> bool {
        (**self).can_request()
    }

    fn record_call(&mut self, when: Option<Instant>) {
        (**self).record_call(when)
    }

    fn estimate(&self) -> Option<Duration> {
        (**self).estimate()
    }

    fn tick(&mut self) {
        (**self).tick()
    }

    fn reset(&mut self) {
        (**self).reset()
    }

    fn record_transfer(&mut self, elapsed: Duration) {
        (**self).record_transfer(elapsed)
    }
}
