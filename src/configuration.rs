use crate::{
    clock::Clock,
    error::StatsError,
    recorder::{DataRecorder, DistributionDataRecorder},
    session::SessionManager,
};
use std::{sync::Arc, time::Duration};

/// Yields the data recorders attached to a newly created session.
pub trait RecorderFactory: Send + Sync {
    fn create_recorders(&self, key: &str) -> Result<Vec<Box<dyn DataRecorder>>, StatsError>;
}

impl<F> RecorderFactory for F
where
    F: Fn(&str) -> Result<Vec<Box<dyn DataRecorder>>, StatsError> + Send + Sync,
{
    fn create_recorders(&self, key: &str) -> Result<Vec<Box<dyn DataRecorder>>, StatsError> { self(key) }
}

fn distribution_only(_key: &str) -> Result<Vec<Box<dyn DataRecorder>>, StatsError> {
    Ok(vec![Box::new(DistributionDataRecorder::new())])
}

/// A configuration builder for `SessionManager`.
#[derive(Clone)]
pub struct Configuration {
    pub(crate) enabled: bool,
    pub(crate) recorders: Arc<dyn RecorderFactory>,
    pub(crate) clock: Clock,
    pub(crate) snapshot_interval: Duration,
    pub(crate) snapshot_capacity: usize,
}

impl Default for Configuration {
    fn default() -> Configuration {
        Configuration {
            enabled: true,
            recorders: Arc::new(distribution_only),
            clock: Clock::new(),
            snapshot_interval: Duration::from_secs(10),
            snapshot_capacity: 16,
        }
    }
}

impl Configuration {
    /// Creates a new `Configuration` with default values.
    pub fn new() -> Configuration { Default::default() }

    /// Sets whether statistics are collected at all.
    ///
    /// Defaults to `true`.
    ///
    /// A disabled manager creates no sessions: its trackers are bound to empty, immutable
    /// sessions which ignore everything they are given.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Sets the factory deciding which data recorders a session for a given key receives.
    ///
    /// Defaults to a single `DistributionDataRecorder` per session.
    pub fn recorders<F: RecorderFactory + 'static>(mut self, factory: F) -> Self {
        self.recorders = Arc::new(factory);
        self
    }

    /// Sets the time source handed to trackers.
    pub fn clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Sets how often a running `Publisher` collects and publishes a snapshot.
    ///
    /// Defaults to `10s`.
    pub fn snapshot_interval(mut self, interval: Duration) -> Self {
        self.snapshot_interval = interval;
        self
    }

    /// Sets how many unread snapshots each publisher subscriber may have queued.
    ///
    /// Defaults to `16`. Snapshots published to a full subscriber are dropped.
    pub fn snapshot_capacity(mut self, capacity: usize) -> Self {
        self.snapshot_capacity = capacity;
        self
    }

    /// Create a `SessionManager` based on this configuration.
    pub fn build(self) -> SessionManager { SessionManager::from_config(self) }
}
