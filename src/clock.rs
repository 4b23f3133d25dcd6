use quanta::{Instant, Mock};
use std::{
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

/// Time source for trackers.
///
/// Timestamps are wall-clock milliseconds: the epoch offset is sampled once at construction and
/// the monotonic `quanta` clock supplies elapsed time from there, so stamps never go backwards.
#[derive(Clone)]
pub struct Clock {
    source: quanta::Clock,
    origin: Instant,
    origin_millis: i64,
}

impl Clock {
    pub fn new() -> Clock {
        let origin_millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|since| since.as_millis() as i64)
            .unwrap_or(0);
        Clock::with_source(quanta::Clock::new(), origin_millis)
    }

    /// Creates a clock driven by a `quanta::Mock`, starting at timestamp 0.
    pub fn mock() -> (Clock, Arc<Mock>) {
        let (source, mock) = quanta::Clock::mock();
        (Clock::with_source(source, 0), mock)
    }

    fn with_source(source: quanta::Clock, origin_millis: i64) -> Clock {
        let origin = source.now();
        Clock { source, origin, origin_millis }
    }

    pub fn now(&self) -> Instant { self.source.now() }

    /// Current timestamp in milliseconds.
    pub fn now_millis(&self) -> i64 {
        let elapsed = self.now().saturating_duration_since(self.origin);
        self.origin_millis + elapsed.as_millis() as i64
    }

    /// Fractional milliseconds elapsed since `since`.
    pub fn elapsed_millis(&self, since: Instant) -> f64 { as_millis_f64(self.now().saturating_duration_since(since)) }
}

impl Default for Clock {
    fn default() -> Self { Clock::new() }
}

fn as_millis_f64(duration: Duration) -> f64 { duration.as_secs_f64() * 1_000.0 }
