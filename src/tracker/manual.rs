use super::Tracker;
use crate::{clock::Clock, session::StatsSession};
use std::sync::Arc;

/// A tracker whose value is set by the caller before committing.
pub struct ManualTracker {
    session: Arc<dyn StatsSession>,
    clock: Clock,
    value: f64,
}

impl ManualTracker {
    pub fn new(session: Arc<dyn StatsSession>, clock: Clock) -> ManualTracker {
        ManualTracker { session, clock, value: 0.0 }
    }

    pub fn set_value(&mut self, value: f64) -> &mut Self {
        self.value = value;
        self
    }

    pub fn add_value(&mut self, delta: f64) -> &mut Self {
        self.value += delta;
        self
    }

    /// Records one hit and commits the current value.
    pub fn commit(&mut self) -> &mut Self {
        let now = self.clock.now_millis();
        self.session.track(&*self, now);
        self.session.update(&*self, now);
        self
    }

    pub fn session(&self) -> &Arc<dyn StatsSession> { &self.session }

    pub fn reset(&mut self) { self.value = 0.0; }
}

impl Tracker for ManualTracker {
    fn value(&self) -> f64 { self.value }
}
