use super::{session_fields, ConcurrentSession, ImmutableSession, StatsSession};
use crate::{
    clock::Clock,
    configuration::Configuration,
    data::{DataSet, FieldSet, Snapshot},
    error::StatsError,
    helper::recover,
    tracker::{IncidentTracker, ManualTracker, SpanTracker},
};
use fnv::FnvBuildHasher;
use hashbrown::HashMap;
use log::{debug, trace};
use std::sync::{Arc, RwLock};

/// Registry of the sessions of every key, and the factory for trackers bound to them.
///
/// Sessions are created on first use with the recorders the configuration yields for their key.
/// Lookups of existing sessions take a read lock only.
pub struct SessionManager {
    config: Configuration,
    sessions: RwLock<HashMap<String, Arc<ConcurrentSession>, FnvBuildHasher>>,
    // Data of the sessions handed out while disabled.
    empty: Option<DataSet>,
}

impl SessionManager {
    pub(crate) fn from_config(config: Configuration) -> SessionManager {
        let empty = FieldSet::shared(session_fields()).ok().map(DataSet::defaults);
        SessionManager { config, sessions: RwLock::new(HashMap::default()), empty }
    }

    /// Gets a builder to configure a `SessionManager` instance with.
    pub fn builder() -> Configuration { Configuration::default() }

    /// Creates a `SessionManager` with the default configuration.
    pub fn new() -> SessionManager { SessionManager::builder().build() }

    pub fn is_enabled(&self) -> bool { self.config.enabled }

    pub fn clock(&self) -> &Clock { &self.config.clock }

    pub(crate) fn config(&self) -> &Configuration { &self.config }

    /// Gets the session for `key`, if one was created.
    pub fn get_session(&self, key: &str) -> Option<Arc<ConcurrentSession>> {
        recover(self.sessions.read()).get(key).cloned()
    }

    /// Gets the session for `key`, creating it when missing.
    ///
    /// A disabled manager returns an empty immutable session instead and registers nothing.
    pub fn get_or_create_session(&self, key: &str) -> Result<Arc<dyn StatsSession>, StatsError> {
        if !self.config.enabled {
            let session = match &self.empty {
                Some(data) => ImmutableSession::new(key, data.clone()),
                None => ImmutableSession::empty(key)?,
            };
            return Ok(Arc::new(session));
        }

        Ok(self.concurrent_session(key)?)
    }

    fn concurrent_session(&self, key: &str) -> Result<Arc<ConcurrentSession>, StatsError> {
        if let Some(session) = self.get_session(key) {
            return Ok(session);
        }

        // The factory runs unlocked, so it may call back into the manager. A racing creator can
        // win the insert, in which case this session is discarded.
        let recorders = self.config.recorders.create_recorders(key)?;
        let session = Arc::new(ConcurrentSession::new(key, recorders)?);

        let mut sessions = recover(self.sessions.write());
        if let Some(existing) = sessions.get(key) {
            return Ok(existing.clone());
        }

        debug!("creating session '{}' with {} recorder(s)", key, session.data_recorders().len());
        sessions.insert(key.to_owned(), session.clone());
        Ok(session)
    }

    /// Removes the session for `key`. Trackers already bound to it keep working on the detached
    /// session.
    pub fn remove(&self, key: &str) -> Option<Arc<ConcurrentSession>> { recover(self.sessions.write()).remove(key) }

    /// Clears every session in place.
    pub fn clear_all(&self) {
        for session in recover(self.sessions.read()).values() {
            session.clear();
        }
    }

    /// Keys of all sessions, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = recover(self.sessions.read()).keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize { recover(self.sessions.read()).len() }

    pub fn is_empty(&self) -> bool { recover(self.sessions.read()).is_empty() }

    /// Collects the data of every session, ordered by key.
    pub fn snapshot(&self) -> Snapshot {
        let mut sessions: Vec<Arc<ConcurrentSession>> = recover(self.sessions.read()).values().cloned().collect();
        sessions.sort_by(|a, b| a.key().cmp(b.key()));

        let mut snapshot = Snapshot::default();
        for session in sessions {
            snapshot.push(session.key(), session.collect_data());
        }
        snapshot
    }

    /// Restores every session in `snapshot`, creating the missing ones.
    pub fn restore(&self, snapshot: &Snapshot) -> Result<(), StatsError> {
        if !self.config.enabled {
            debug!("ignoring restore of {} session(s) on disabled manager", snapshot.len());
            return Ok(());
        }

        for (key, data) in snapshot.iter() {
            trace!("restoring session '{}'", key);
            self.concurrent_session(key)?.restore(data);
        }
        Ok(())
    }

    pub fn span_tracker(&self, key: &str) -> Result<SpanTracker, StatsError> {
        Ok(SpanTracker::new(self.get_or_create_session(key)?, self.config.clock.clone()))
    }

    pub fn manual_tracker(&self, key: &str) -> Result<ManualTracker, StatsError> {
        Ok(ManualTracker::new(self.get_or_create_session(key)?, self.config.clock.clone()))
    }

    pub fn incident_tracker(&self, key: &str) -> Result<IncidentTracker, StatsError> {
        Ok(IncidentTracker::new(self.get_or_create_session(key)?, self.config.clock.clone()))
    }
}

impl Default for SessionManager {
    fn default() -> Self { SessionManager::new() }
}

#[cfg(test)]
mod tests {
    use super::SessionManager;
    use crate::{
        clock::Clock,
        error::StatsError,
        recorder::DataRecorder,
        session::{ImmutableSession, StatsSession},
        tracker::FixedValue,
    };
    use std::{
        sync::{Arc, Mutex, Weak},
        thread,
        time::Duration,
    };

    #[test]
    fn test_sessions_are_shared_per_key() {
        let manager = SessionManager::new();
        let a = manager.get_or_create_session("db.query").unwrap();
        let b = manager.get_or_create_session("db.query").unwrap();
        manager.get_or_create_session("http").unwrap();

        a.update(&FixedValue(2.0), 0);
        assert_eq!(b.commits(), 1);
        assert_eq!(manager.len(), 2);
        assert_eq!(manager.keys(), vec!["db.query".to_owned(), "http".to_owned()]);
        assert_eq!(manager.get_session("db.query").unwrap().commits(), 1);
        assert!(manager.get_session("missing").is_none());
    }

    #[test]
    fn test_concurrent_creation_yields_one_session() {
        let manager = Arc::new(SessionManager::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let manager = manager.clone();
                thread::spawn(move || {
                    let tracker = manager.incident_tracker("shared").unwrap();
                    for _ in 0..100 {
                        tracker.incident();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(manager.len(), 1);
        assert_eq!(manager.get_session("shared").unwrap().hits(), 800);
    }

    #[test]
    fn test_trackers_and_snapshot() {
        let (clock, mock) = Clock::mock();
        let manager = SessionManager::builder().clock(clock).build();

        let mut span = manager.span_tracker("render").unwrap();
        span.track();
        mock.increment(Duration::from_millis(8));
        span.commit();

        manager.manual_tracker("queue").unwrap().set_value(42.0).commit();
        manager.incident_tracker("errors").unwrap().incident();

        let snapshot = manager.snapshot();
        assert_eq!(snapshot.keys(), vec!["errors", "queue", "render"]);
        assert_eq!(snapshot.get("render").unwrap().get_double_by_name("sum"), 8.0);
        assert_eq!(snapshot.get("queue").unwrap().get_double_by_name("max"), 42.0);
        assert_eq!(snapshot.get("errors").unwrap().get_long_by_name("hits"), 1);
        assert_eq!(snapshot.get("errors").unwrap().get_double_by_name("product"), 1.0);
    }

    #[test]
    fn test_clear_remove_and_restore() {
        let manager = SessionManager::new();
        let mut tracker = manager.manual_tracker("db").unwrap();
        tracker.set_value(2.0).commit();
        tracker.set_value(8.0).commit();
        let snapshot = manager.snapshot();

        manager.clear_all();
        assert_eq!(manager.get_session("db").unwrap().commits(), 0);

        assert!(manager.remove("db").is_some());
        assert!(manager.is_empty());

        manager.restore(&snapshot).unwrap();
        let restored = manager.get_session("db").unwrap();
        assert_eq!(restored.commits(), 2);
        assert_eq!(restored.max(), 8.0);
        assert_eq!(manager.snapshot(), snapshot);
    }

    #[test]
    fn test_disabled_manager() {
        let manager = SessionManager::builder().enabled(false).build();
        assert!(!manager.is_enabled());

        let tracker = manager.incident_tracker("errors").unwrap();
        tracker.incident();
        assert_eq!(tracker.session().hits(), 0);
        assert_eq!(tracker.session().key(), "errors");
        assert!(manager.is_empty());
        assert!(manager.snapshot().is_empty());
    }

    #[test]
    fn test_disabled_manager_reuses_empty_schema() {
        let manager = SessionManager::builder().enabled(false).build();
        let a = manager.get_or_create_session("a").unwrap();
        let b = manager.get_or_create_session("b").unwrap();

        assert_eq!(a.key(), "a");
        assert_eq!(b.key(), "b");
        assert!(Arc::ptr_eq(a.collect_data().field_set(), b.collect_data().field_set()));
        assert_eq!(a.collect_data(), ImmutableSession::empty("a").unwrap().collect_data());
    }

    #[test]
    fn test_recorder_factory_may_use_manager() {
        let slot: Arc<Mutex<Weak<SessionManager>>> = Arc::new(Mutex::new(Weak::new()));
        let factory_slot = Arc::clone(&slot);
        let manager = Arc::new(
            SessionManager::builder()
                .recorders(move |key: &str| -> Result<Vec<Box<dyn DataRecorder>>, StatsError> {
                    // Child sessions make sure their parent exists first.
                    let manager = factory_slot.lock().unwrap().upgrade();
                    if let (Some(parent), Some(manager)) = (key.rsplitn(2, '.').nth(1), manager) {
                        manager.get_or_create_session(parent)?;
                    }
                    Ok(vec![])
                })
                .build(),
        );
        *slot.lock().unwrap() = Arc::downgrade(&manager);

        manager.incident_tracker("db.query").unwrap().incident();
        assert_eq!(manager.keys(), vec!["db".to_owned(), "db.query".to_owned()]);
        assert_eq!(manager.get_session("db.query").unwrap().commits(), 1);
        assert_eq!(manager.get_session("db").unwrap().commits(), 0);
    }

    #[test]
    fn test_recorder_factory_failure() {
        let manager = SessionManager::builder()
            .recorders(|key: &str| -> Result<Vec<Box<dyn DataRecorder>>, StatsError> {
                Err(StatsError::Recorder(format!("no recorders for '{}'", key)))
            })
            .build();

        assert!(manager.span_tracker("db").is_err());
        assert!(manager.is_empty());
    }
}
