//! Throttle that never holds anything back.

use std::time::{Duration, Instant};

use super::Throttle;

/// Always permits dispatch. The default when rate limiting is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenThrottle;

impl Throttle for OpenThrottle {
    fn can_request(&self) -> bool {
        true
    }

    fn record_call(&mut self, _when: Option<Instant>) {}

    fn estimate(&self) -> Option<Duration> {
        Some(Duration::ZERO)
    }

    fn tick(&mut self) {}

    fn reset(&mut self) {}
}
