use super::{fields, session_fields, StatsSession};
use crate::{
    data::{DataSet, FieldSet},
    error::StatsError,
    recorder::DataRecorder,
    tracker::Tracker,
};
use log::debug;

/// A read-only session backed by previously collected data.
///
/// Tracking, committing, clearing and restoring are ignored. Disabled session managers bind
/// their trackers to empty immutable sessions.
#[derive(Debug, Clone)]
pub struct ImmutableSession {
    key: String,
    data: DataSet,
}

impl ImmutableSession {
    pub fn new<K: Into<String>>(key: K, data: DataSet) -> ImmutableSession { ImmutableSession { key: key.into(), data } }

    /// Creates a session holding only the default session fields.
    pub fn empty<K: Into<String>>(key: K) -> Result<ImmutableSession, StatsError> {
        let data = DataSet::defaults(FieldSet::shared(session_fields())?);
        Ok(ImmutableSession::new(key, data))
    }

    pub fn data(&self) -> &DataSet { &self.data }
}

impl StatsSession for ImmutableSession {
    fn key(&self) -> &str { &self.key }

    fn data_recorders(&self) -> &[Box<dyn DataRecorder>] { &[] }

    fn hits(&self) -> u64 { self.data.get_long(&fields::HITS).max(0) as u64 }

    fn first_hit_stamp(&self) -> i64 { self.data.get_long(&fields::FIRST_HIT_STAMP) }

    fn last_hit_stamp(&self) -> i64 { self.data.get_long(&fields::LAST_HIT_STAMP) }

    fn commits(&self) -> u64 { self.data.get_long(&fields::COMMITS).max(0) as u64 }

    fn first(&self) -> f64 { self.data.get_double(&fields::FIRST) }

    fn last(&self) -> f64 { self.data.get_double(&fields::LAST) }

    fn min(&self) -> f64 { self.data.get_double(&fields::MIN) }

    fn max(&self) -> f64 { self.data.get_double(&fields::MAX) }

    fn sum(&self) -> f64 { self.data.get_double(&fields::SUM) }

    fn track(&self, _tracker: &dyn Tracker, _now: i64) {
        debug!("ignoring track on immutable session '{}'", self.key);
    }

    fn update(&self, _tracker: &dyn Tracker, _now: i64) {
        debug!("ignoring update on immutable session '{}'", self.key);
    }

    fn collect_data(&self) -> DataSet { self.data.clone() }

    fn clear(&self) {
        debug!("ignoring clear on immutable session '{}'", self.key);
    }

    fn restore(&self, _data: &DataSet) {
        debug!("ignoring restore on immutable session '{}'", self.key);
    }
}
