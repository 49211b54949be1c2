//! Time source for write deadlines and note dates.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Injected so hosts and tests decide how time advances.
pub trait Clock {
    /// Monotonic time used for write-queue deadlines.
    fn now(&self) -> Instant;
    /// Wall-clock Unix epoch milliseconds used for note dates.
    fn epoch_millis(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn epoch_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as i64)
            .unwrap_or_default()
    }
}
