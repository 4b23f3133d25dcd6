//! Pluggable aggregation strategies attached to a session.

mod distribution;
mod range;

pub use self::{
    distribution::{fields as distribution_fields, DistributionDataRecorder},
    range::RangeDataRecorder,
};

use crate::{
    data::{DataSet, DataSetBuilder, FieldRef},
    error::StatsError,
    session::StatsSession,
    tracker::Tracker,
};

/// Derives statistics beyond the base session counters.
///
/// Recorders are shared with every thread committing to their session, and run on the
/// committing thread, so `update` must be short and must never block.
pub trait DataRecorder: Send + Sync {
    /// The fields this recorder writes in `collect_data`.
    fn supported_fields(&self) -> Vec<FieldRef>;

    fn supported_field_names(&self) -> Vec<String> {
        self.supported_fields().iter().map(|field| field.name().to_owned()).collect()
    }

    /// Incorporates the tracker's committed value.
    fn update(&self, session: &dyn StatsSession, tracker: &dyn Tracker, now: i64) -> Result<(), StatsError>;

    /// Writes this recorder's fields into `data`.
    fn collect_data(&self, session: &dyn StatsSession, data: &mut DataSetBuilder) -> Result<(), StatsError>;

    /// Reloads internal state from previously collected data.
    fn restore(&self, data: &DataSet);

    fn clear(&self);
}
