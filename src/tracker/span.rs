use super::Tracker;
use crate::{clock::Clock, session::StatsSession};
use log::{trace, warn};
use quanta::Instant;
use std::sync::Arc;

/// A sampled quantity whose difference between start and stop is the span's value.
pub type Measure = Arc<dyn Fn() -> f64 + Send + Sync>;

/// Measures one span between `track` and `commit`.
///
/// By default the value is the elapsed wall time in fractional milliseconds. With a `Measure`
/// the value is the measure at commit minus the measure at track, which covers CPU time, block
/// time and other per-thread counters.
pub struct SpanTracker {
    session: Arc<dyn StatsSession>,
    clock: Clock,
    measure: Option<Measure>,
    start: Option<Instant>,
    start_measure: f64,
    value: f64,
}

impl SpanTracker {
    pub fn new(session: Arc<dyn StatsSession>, clock: Clock) -> SpanTracker {
        SpanTracker { session, clock, measure: None, start: None, start_measure: 0.0, value: 0.0 }
    }

    pub fn with_measure(session: Arc<dyn StatsSession>, clock: Clock, measure: Measure) -> SpanTracker {
        SpanTracker { measure: Some(measure), ..SpanTracker::new(session, clock) }
    }

    /// Starts the span. Tracking an already started span restarts it.
    pub fn track(&mut self) -> &mut Self {
        if self.start.is_some() {
            trace!("restarting span on '{}'", self.session.key());
        }

        self.start_measure = self.measure.as_ref().map_or(0.0, |measure| measure());
        self.start = Some(self.clock.now());
        self.session.track(&*self, self.clock.now_millis());
        self
    }

    /// Stops the span and commits its value. Committing a span that was never started is ignored.
    pub fn commit(&mut self) -> &mut Self {
        let start = match self.start.take() {
            Some(start) => start,
            None => {
                warn!("commit without track on '{}'", self.session.key());
                return self;
            },
        };

        self.value = match &self.measure {
            Some(measure) => measure() - self.start_measure,
            None => self.clock.elapsed_millis(start),
        };
        self.session.update(&*self, self.clock.now_millis());
        self
    }

    pub fn is_tracking(&self) -> bool { self.start.is_some() }

    pub fn session(&self) -> &Arc<dyn StatsSession> { &self.session }

    pub fn reset(&mut self) {
        self.start = None;
        self.start_measure = 0.0;
        self.value = 0.0;
    }
}

impl Tracker for SpanTracker {
    fn value(&self) -> f64 { self.value }
}
