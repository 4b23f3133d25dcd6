use super::Tracker;
use crate::{clock::Clock, session::StatsSession};
use std::sync::Arc;

/// Counts occurrences. Each incident is a hit and a commit of `1.0`.
pub struct IncidentTracker {
    session: Arc<dyn StatsSession>,
    clock: Clock,
}

impl IncidentTracker {
    pub fn new(session: Arc<dyn StatsSession>, clock: Clock) -> IncidentTracker { IncidentTracker { session, clock } }

    pub fn incident(&self) {
        let now = self.clock.now_millis();
        self.session.track(self, now);
        self.session.update(self, now);
    }

    pub fn session(&self) -> &Arc<dyn StatsSession> { &self.session }
}

impl Tracker for IncidentTracker {
    fn value(&self) -> f64 { 1.0 }
}

#[cfg(test)]
mod tests {
    use super::IncidentTracker;
    use crate::{
        clock::Clock,
        session::{ConcurrentSession, StatsSession},
    };
    use std::{sync::Arc, time::Duration};

    #[test]
    fn test_incidents() {
        let (clock, mock) = Clock::mock();
        let session: Arc<dyn StatsSession> = Arc::new(ConcurrentSession::new("errors", vec![]).unwrap());
        let tracker = IncidentTracker::new(session.clone(), clock);

        tracker.incident();
        mock.increment(Duration::from_millis(30));
        tracker.incident();
        tracker.incident();

        assert_eq!(session.hits(), 3);
        assert_eq!(session.commits(), 3);
        assert_eq!(session.sum(), 3.0);
        assert_eq!(session.first_hit_stamp(), 0);
        assert_eq!(session.last_hit_stamp(), 30);
    }
}
