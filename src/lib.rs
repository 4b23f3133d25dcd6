//! Lock-free, in-process statistics.
//!
//! Application code asks a `SessionManager` for trackers bound to a key: span trackers time an
//! operation, manual trackers commit arbitrary values and incident trackers count occurrences.
//! Every key has one `StatsSession` aggregating whatever its trackers commit, with data recorders
//! adding derived statistics such as means and histogram buckets. A `Publisher` can snapshot all
//! sessions on an interval and hand the snapshots to subscribers.
//!
//! ```
//! use hotstat::{SessionManager, StatsSession};
//!
//! let manager = SessionManager::new();
//! let mut tracker = manager.span_tracker("db.query").unwrap();
//! tracker.track();
//! // ... the measured operation ...
//! tracker.commit();
//!
//! assert_eq!(tracker.session().commits(), 1);
//! ```
mod atomic;
mod clock;
mod configuration;
mod control;
pub mod data;
pub mod dynamic;
mod error;
mod helper;
mod publisher;
mod range;
pub mod recorder;
pub mod session;
pub mod tracker;

pub use self::{
    clock::Clock,
    configuration::{Configuration, RecorderFactory},
    control::Controller,
    data::{DataSet, DataSetBuilder, Field, FieldRef, FieldSet, FieldType, Snapshot, StandardField, Value},
    error::StatsError,
    publisher::Publisher,
    range::{Range, RangeList},
    recorder::{DataRecorder, DistributionDataRecorder, RangeDataRecorder},
    session::{ConcurrentSession, ImmutableSession, SessionManager, StatsSession},
    tracker::{CompositeTracker, IncidentTracker, ManualTracker, SpanTracker, Tracker},
};
