use super::{IncidentTracker, ManualTracker, SpanTracker, Tracker};

/// Drives an ordered list of trackers of one kind as a single tracker.
///
/// Every call is forwarded to each member in order. The composite's own value is the value of
/// its first member, or `0.0` when it has none.
pub struct CompositeTracker<T> {
    trackers: Vec<T>,
}

impl<T> CompositeTracker<T> {
    pub fn new(trackers: Vec<T>) -> CompositeTracker<T> { CompositeTracker { trackers } }

    pub fn trackers(&self) -> &[T] { &self.trackers }

    pub fn len(&self) -> usize { self.trackers.len() }

    pub fn is_empty(&self) -> bool { self.trackers.is_empty() }
}

impl<T: Tracker> Tracker for CompositeTracker<T> {
    fn value(&self) -> f64 { self.trackers.first().map_or(0.0, Tracker::value) }
}

impl CompositeTracker<SpanTracker> {
    pub fn track(&mut self) -> &mut Self {
        for tracker in &mut self.trackers {
            tracker.track();
        }
        self
    }

    pub fn commit(&mut self) -> &mut Self {
        for tracker in &mut self.trackers {
            tracker.commit();
        }
        self
    }

    pub fn is_tracking(&self) -> bool { self.trackers.iter().any(SpanTracker::is_tracking) }
}

impl CompositeTracker<ManualTracker> {
    pub fn set_value(&mut self, value: f64) -> &mut Self {
        for tracker in &mut self.trackers {
            tracker.set_value(value);
        }
        self
    }

    pub fn add_value(&mut self, delta: f64) -> &mut Self {
        for tracker in &mut self.trackers {
            tracker.add_value(delta);
        }
        self
    }

    pub fn commit(&mut self) -> &mut Self {
        for tracker in &mut self.trackers {
            tracker.commit();
        }
        self
    }
}

impl CompositeTracker<IncidentTracker> {
    pub fn incident(&self) {
        for tracker in &self.trackers {
            tracker.incident();
        }
    }
}
