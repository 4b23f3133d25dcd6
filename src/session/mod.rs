//! Per-key aggregation state.
//!
//! A session counts how often trackers bound to its key started (`hits`) and committed
//! (`commits`), keeps first/last/min/max/sum of the committed values, and hands every commit to
//! its data recorders for derived statistics.

mod concurrent;
mod immutable;
mod manager;

pub use self::{concurrent::ConcurrentSession, immutable::ImmutableSession, manager::SessionManager};

use crate::{
    data::{DataSet, FieldRef},
    recorder::DataRecorder,
    tracker::Tracker,
};

/// Names and defaults of the base session fields.
pub mod fields {
    use crate::data::StandardField;

    pub static HITS: StandardField = StandardField::long("hits", 0);
    pub static FIRST_HIT_STAMP: StandardField = StandardField::long("first_hit_stamp", -1);
    pub static LAST_HIT_STAMP: StandardField = StandardField::long("last_hit_stamp", -1);
    pub static COMMITS: StandardField = StandardField::long("commits", 0);
    pub static FIRST: StandardField = StandardField::double("first", std::f64::NAN);
    pub static LAST: StandardField = StandardField::double("last", std::f64::NAN);
    pub static MIN: StandardField = StandardField::double("min", std::f64::INFINITY);
    pub static MAX: StandardField = StandardField::double("max", std::f64::NEG_INFINITY);
    pub static SUM: StandardField = StandardField::double("sum", 0.0);
}

pub(crate) fn session_fields() -> Vec<FieldRef> {
    vec![
        fields::HITS.clone().into_ref(),
        fields::FIRST_HIT_STAMP.clone().into_ref(),
        fields::LAST_HIT_STAMP.clone().into_ref(),
        fields::COMMITS.clone().into_ref(),
        fields::FIRST.clone().into_ref(),
        fields::LAST.clone().into_ref(),
        fields::MIN.clone().into_ref(),
        fields::MAX.clone().into_ref(),
        fields::SUM.clone().into_ref(),
    ]
}

/// Aggregated statistics for one key.
///
/// Sessions are shared by every tracker bound to the key, so every operation takes `&self` and
/// is safe to call from any number of threads at once. Individual counters are read atomically,
/// but a reader may see one counter reflect a commit that another does not yet.
pub trait StatsSession: Send + Sync {
    fn key(&self) -> &str;

    fn data_recorders(&self) -> &[Box<dyn DataRecorder>];

    /// Number of times a tracker started tracking.
    fn hits(&self) -> u64;

    /// Timestamp of the first hit, or `-1` before any hit.
    fn first_hit_stamp(&self) -> i64;

    /// Timestamp of the latest hit, or `-1` before any hit.
    fn last_hit_stamp(&self) -> i64;

    /// Number of values committed.
    fn commits(&self) -> u64;

    /// First committed value, `NaN` before any commit.
    fn first(&self) -> f64;

    /// Latest committed value, `NaN` before any commit.
    fn last(&self) -> f64;

    /// Smallest committed value, `+inf` before any commit.
    fn min(&self) -> f64;

    /// Largest committed value, `-inf` before any commit.
    fn max(&self) -> f64;

    fn sum(&self) -> f64;

    /// Records that `tracker` started tracking at `now` (milliseconds).
    fn track(&self, tracker: &dyn Tracker, now: i64);

    /// Commits the current value of `tracker` at `now` (milliseconds).
    fn update(&self, tracker: &dyn Tracker, now: i64);

    /// Collects the session counters and every recorder's fields into one data set.
    fn collect_data(&self) -> DataSet;

    /// Resets the session to the state of a freshly created one.
    fn clear(&self);

    /// Loads counters and recorder state from previously collected data.
    fn restore(&self, data: &DataSet);
}
