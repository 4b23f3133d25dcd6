use super::DataRecorder;
use crate::{
    data::{DataSet, DataSetBuilder, FieldRef, StandardField, Value},
    error::StatsError,
    range::RangeList,
    session::StatsSession,
    tracker::Tracker,
};
use fnv::FnvBuildHasher;
use hashbrown::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

/// Histogram-style hit counts over a list of ranges.
///
/// Each committed value increments the counter of every range containing it. When the ranges
/// are known not to overlap, the scan stops at the first match.
#[derive(Debug)]
pub struct RangeDataRecorder {
    ranges: RangeList,
    fields: Vec<FieldRef>,
    hits: Vec<AtomicU64>,
}

impl RangeDataRecorder {
    /// Creates a recorder with one long field per range, named after the range.
    ///
    /// Fails with `StatsError::DuplicateField` if two ranges share a name.
    pub fn new(ranges: RangeList) -> Result<RangeDataRecorder, StatsError> {
        if ranges.is_empty() {
            return Err(StatsError::EmptyRangeList);
        }

        {
            let mut names: HashSet<&str, FnvBuildHasher> = HashSet::default();
            for range in ranges.ranges() {
                if !names.insert(range.name()) {
                    return Err(StatsError::DuplicateField(range.name().to_owned()));
                }
            }
        }

        let fields = ranges
            .ranges()
            .iter()
            .map(|range| StandardField::new(range.name(), Value::Long(0)).into_ref())
            .collect();
        let hits = ranges.ranges().iter().map(|_| AtomicU64::new(0)).collect();

        Ok(RangeDataRecorder { ranges, fields, hits })
    }

    pub fn range_list(&self) -> &RangeList { &self.ranges }

    /// Current hit count of the range at `index`.
    pub fn hits(&self, index: usize) -> Option<u64> { self.hits.get(index).map(|hits| hits.load(Ordering::Acquire)) }
}

impl DataRecorder for RangeDataRecorder {
    fn supported_fields(&self) -> Vec<FieldRef> { self.fields.clone() }

    fn update(&self, _session: &dyn StatsSession, tracker: &dyn Tracker, _now: i64) -> Result<(), StatsError> {
        let value = tracker.value();
        let mut from = 0;
        while let Some(index) = self.ranges.index_of_range_containing(value, from) {
            self.hits[index].fetch_add(1, Ordering::AcqRel);
            if !self.ranges.has_overlap() {
                break;
            }
            from = index + 1;
        }
        Ok(())
    }

    fn collect_data(&self, _session: &dyn StatsSession, data: &mut DataSetBuilder) -> Result<(), StatsError> {
        for (field, hits) in self.fields.iter().zip(self.hits.iter()) {
            data.set(&**field, hits.load(Ordering::Acquire))?;
        }
        Ok(())
    }

    fn restore(&self, _data: &DataSet) {
        // TODO: restore bucket counts once snapshots record which range list produced them;
        // range names alone do not pin down a bucket layout.
    }

    fn clear(&self) {
        for hits in &self.hits {
            hits.store(0, Ordering::Release);
        }
    }
}
