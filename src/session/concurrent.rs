use super::{fields, session_fields, StatsSession};
use crate::{
    atomic::AtomicF64,
    data::{DataSet, DataSetBuilder, FieldSet},
    error::StatsError,
    recorder::DataRecorder,
    tracker::Tracker,
};
use fnv::FnvBuildHasher;
use hashbrown::HashSet;
use log::{error, warn};
use std::{
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicI64, AtomicU64, Ordering},
        Arc,
    },
};

const UNSET_STAMP: i64 = -1;

/// A session updated entirely through atomics.
///
/// Each counter is its own atomic; min, max and the floating-point sum advance through
/// compare-and-swap loops. Recorders run synchronously on the committing thread, in
/// registration order.
pub struct ConcurrentSession {
    key: String,
    fields: Arc<FieldSet>,
    recorders: Vec<Box<dyn DataRecorder>>,

    hits: AtomicU64,
    first_hit_stamp: AtomicI64,
    last_hit_stamp: AtomicI64,
    commits: AtomicU64,
    first: AtomicF64,
    last: AtomicF64,
    min: AtomicF64,
    max: AtomicF64,
    sum: AtomicF64,
}

impl ConcurrentSession {
    /// Creates a session for `key` fed into the given recorders.
    ///
    /// Fails with `StatsError::DuplicateField` if a recorder declares a base session field, or a
    /// field already declared by another recorder.
    pub fn new<K: Into<String>>(key: K, recorders: Vec<Box<dyn DataRecorder>>) -> Result<ConcurrentSession, StatsError> {
        let mut schema = session_fields();
        let mut names: HashSet<String, FnvBuildHasher> = schema.iter().map(|field| field.name().to_owned()).collect();
        for recorder in &recorders {
            for field in recorder.supported_fields() {
                if !names.insert(field.name().to_owned()) {
                    return Err(StatsError::DuplicateField(field.name().to_owned()));
                }
                schema.push(field);
            }
        }

        Ok(ConcurrentSession {
            key: key.into(),
            fields: FieldSet::shared(schema)?,
            recorders,
            hits: AtomicU64::new(0),
            first_hit_stamp: AtomicI64::new(UNSET_STAMP),
            last_hit_stamp: AtomicI64::new(UNSET_STAMP),
            commits: AtomicU64::new(0),
            first: AtomicF64::new(std::f64::NAN),
            last: AtomicF64::new(std::f64::NAN),
            min: AtomicF64::new(std::f64::INFINITY),
            max: AtomicF64::new(std::f64::NEG_INFINITY),
            sum: AtomicF64::new(0.0),
        })
    }

    /// The schema of the data sets this session collects.
    pub fn field_set(&self) -> &Arc<FieldSet> { &self.fields }

    fn collect_own(&self, data: &mut DataSetBuilder) -> Result<(), StatsError> {
        data.set(&fields::HITS, self.hits())?;
        data.set(&fields::FIRST_HIT_STAMP, self.first_hit_stamp())?;
        data.set(&fields::LAST_HIT_STAMP, self.last_hit_stamp())?;
        data.set(&fields::COMMITS, self.commits())?;
        data.set(&fields::FIRST, self.first())?;
        data.set(&fields::LAST, self.last())?;
        data.set(&fields::MIN, self.min())?;
        data.set(&fields::MAX, self.max())?;
        data.set(&fields::SUM, self.sum())?;
        Ok(())
    }

    /// Runs one recorder step, logging failures instead of passing them to the caller.
    fn guarded<F>(&self, stage: &str, step: F)
    where
        F: FnOnce() -> Result<(), StatsError>,
    {
        match panic::catch_unwind(AssertUnwindSafe(step)) {
            Ok(Ok(())) => {},
            Ok(Err(e)) => warn!("data recorder {} failed for session '{}': {}", stage, self.key, e),
            Err(_) => error!("data recorder panicked during {} for session '{}'", stage, self.key),
        }
    }
}

impl StatsSession for ConcurrentSession {
    fn key(&self) -> &str { &self.key }

    fn data_recorders(&self) -> &[Box<dyn DataRecorder>] { &self.recorders }

    fn hits(&self) -> u64 { self.hits.load(Ordering::Acquire) }

    fn first_hit_stamp(&self) -> i64 { self.first_hit_stamp.load(Ordering::Acquire) }

    fn last_hit_stamp(&self) -> i64 { self.last_hit_stamp.load(Ordering::Acquire) }

    fn commits(&self) -> u64 { self.commits.load(Ordering::Acquire) }

    fn first(&self) -> f64 { self.first.load() }

    fn last(&self) -> f64 { self.last.load() }

    fn min(&self) -> f64 { self.min.load() }

    fn max(&self) -> f64 { self.max.load() }

    fn sum(&self) -> f64 { self.sum.load() }

    fn track(&self, _tracker: &dyn Tracker, now: i64) {
        self.hits.fetch_add(1, Ordering::AcqRel);
        let _ = self
            .first_hit_stamp
            .compare_exchange(UNSET_STAMP, now, Ordering::AcqRel, Ordering::Acquire);
        self.last_hit_stamp.store(now, Ordering::Release);
    }

    fn update(&self, tracker: &dyn Tracker, now: i64) {
        let value = tracker.value();

        if self.commits.fetch_add(1, Ordering::AcqRel) == 0 {
            self.first.store(value);
        }
        self.last.store(value);
        self.min.fetch_min(value);
        self.max.fetch_max(value);
        self.sum.fetch_add(value);

        for recorder in &self.recorders {
            self.guarded("update", || recorder.update(self, tracker, now));
        }
    }

    fn collect_data(&self) -> DataSet {
        let mut data = self.fields.new_data_set_builder();
        if let Err(e) = self.collect_own(&mut data) {
            warn!("failed to collect session '{}': {}", self.key, e);
        }

        for recorder in &self.recorders {
            self.guarded("collect", || recorder.collect_data(self, &mut data));
        }

        data.finish()
    }

    fn clear(&self) {
        self.hits.store(0, Ordering::Release);
        self.first_hit_stamp.store(UNSET_STAMP, Ordering::Release);
        self.last_hit_stamp.store(UNSET_STAMP, Ordering::Release);
        self.commits.store(0, Ordering::Release);
        self.first.store(std::f64::NAN);
        self.last.store(std::f64::NAN);
        self.min.store(std::f64::INFINITY);
        self.max.store(std::f64::NEG_INFINITY);
        self.sum.store(0.0);

        for recorder in &self.recorders {
            self.guarded("clear", || {
                recorder.clear();
                Ok(())
            });
        }
    }

    fn restore(&self, data: &DataSet) {
        self.hits.store(data.get_long(&fields::HITS).max(0) as u64, Ordering::Release);
        self.first_hit_stamp
            .store(data.get_long(&fields::FIRST_HIT_STAMP), Ordering::Release);
        self.last_hit_stamp
            .store(data.get_long(&fields::LAST_HIT_STAMP), Ordering::Release);
        self.commits.store(data.get_long(&fields::COMMITS).max(0) as u64, Ordering::Release);
        self.first.store(data.get_double(&fields::FIRST));
        self.last.store(data.get_double(&fields::LAST));
        self.min.store(data.get_double(&fields::MIN));
        self.max.store(data.get_double(&fields::MAX));
        self.sum.store(data.get_double(&fields::SUM));

        for recorder in &self.recorders {
            self.guarded("restore", || {
                recorder.restore(data);
                Ok(())
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ConcurrentSession;
    use crate::{
        data::{FieldRef, StandardField},
        error::StatsError,
        range::RangeList,
        recorder::{DataRecorder, DistributionDataRecorder, RangeDataRecorder},
        session::{fields, StatsSession},
        tracker::{FixedValue, Tracker},
        DataSet, DataSetBuilder,
    };
    use std::{
        sync::{
            atomic::{AtomicBool, AtomicUsize, Ordering},
            Arc,
        },
        thread,
    };

    fn init() { let _ = env_logger::builder().is_test(true).try_init(); }

    /// Counts calls and fails in the configured way.
    struct FaultyRecorder {
        field: &'static str,
        calls: AtomicUsize,
        panics: bool,
    }

    impl DataRecorder for FaultyRecorder {
        fn supported_fields(&self) -> Vec<FieldRef> { vec![StandardField::long(self.field, 0).into_ref()] }

        fn update(&self, _: &dyn StatsSession, _: &dyn Tracker, _: i64) -> Result<(), StatsError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.panics {
                panic!("recorder exploded");
            }
            Err(StatsError::Recorder("broken".to_owned()))
        }

        fn collect_data(&self, _: &dyn StatsSession, _: &mut DataSetBuilder) -> Result<(), StatsError> {
            panic!("collect exploded");
        }

        fn restore(&self, _: &DataSet) {}

        fn clear(&self) { self.calls.store(0, Ordering::SeqCst); }
    }

    #[test]
    fn test_fresh_session_defaults() {
        let session = ConcurrentSession::new("db.query", vec![]).unwrap();
        assert_eq!(session.key(), "db.query");
        assert_eq!(session.hits(), 0);
        assert_eq!(session.commits(), 0);
        assert_eq!(session.first_hit_stamp(), -1);
        assert!(session.first().is_nan());
        assert_eq!(session.min(), std::f64::INFINITY);
        assert_eq!(session.max(), std::f64::NEG_INFINITY);

        let data = session.collect_data();
        assert_eq!(data.len(), 9);
        assert_eq!(data.get_long(&fields::LAST_HIT_STAMP), -1);
        assert!(data.get_double(&fields::LAST).is_nan());
    }

    #[test]
    fn test_session_counters() {
        let session = ConcurrentSession::new("db.query", vec![]).unwrap();
        for now in 100..105 {
            session.track(&FixedValue(0.0), now);
        }
        for value in &[3.0, -2.0, 10.0] {
            session.update(&FixedValue(*value), 200);
        }

        assert_eq!(session.hits(), 5);
        assert_eq!(session.first_hit_stamp(), 100);
        assert_eq!(session.last_hit_stamp(), 104);
        assert_eq!(session.commits(), 3);
        assert_eq!(session.first(), 3.0);
        assert_eq!(session.last(), 10.0);
        assert_eq!(session.min(), -2.0);
        assert_eq!(session.max(), 10.0);
        assert_eq!(session.sum(), 11.0);

        let data = session.collect_data();
        assert_eq!(data.get_long(&fields::HITS), 5);
        assert_eq!(data.get_long(&fields::COMMITS), 3);
        assert_eq!(data.get_double(&fields::SUM), 11.0);
        assert_eq!(data.get_double(&fields::MIN), -2.0);
    }

    #[test]
    fn test_session_concurrent_commits() {
        let session = Arc::new(ConcurrentSession::new("hot", vec![Box::new(DistributionDataRecorder::new())]).unwrap());
        let threads = 8;
        let per_thread = 1000;

        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let session = Arc::clone(&session);
                thread::spawn(move || {
                    for i in 0..per_thread {
                        let value = (t * per_thread + i) as f64;
                        session.track(&FixedValue(value), i as i64);
                        session.update(&FixedValue(value), i as i64);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let n = (threads * per_thread) as u64;
        assert_eq!(session.hits(), n);
        assert_eq!(session.commits(), n);
        assert_eq!(session.min(), 0.0);
        assert_eq!(session.max(), (n - 1) as f64);
        // Sums of integers below 2^53 are exact in any order.
        assert_eq!(session.sum(), (n * (n - 1) / 2) as f64);
        assert_eq!(session.first_hit_stamp(), 0);
    }

    #[test]
    fn test_collect_and_clear_under_concurrent_commits() {
        let session = Arc::new(ConcurrentSession::new("hot", vec![Box::new(DistributionDataRecorder::new())]).unwrap());
        let writers = 4;
        let per_writer = 2000;
        let total = (writers * per_writer) as i64;
        let done = Arc::new(AtomicBool::new(false));

        let collector = {
            let session = Arc::clone(&session);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut collections = 0;
                while !done.load(Ordering::SeqCst) || collections == 0 {
                    let data = session.collect_data();
                    let commits = data.get_long(&fields::COMMITS);
                    assert!(commits >= 0 && commits <= total);
                    assert!(data.get_double(&fields::SUM) <= total as f64);
                    collections += 1;
                }
            })
        };

        let handles: Vec<_> = (0..writers)
            .map(|_| {
                let session = Arc::clone(&session);
                thread::spawn(move || {
                    for i in 0..per_writer {
                        session.track(&FixedValue(1.0), i as i64);
                        session.update(&FixedValue(1.0), i as i64);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        done.store(true, Ordering::SeqCst);
        collector.join().unwrap();

        let data = session.collect_data();
        assert_eq!(data.get_long(&fields::HITS), total);
        assert_eq!(data.get_long(&fields::COMMITS), total);
        assert_eq!(data.get_double(&fields::SUM), total as f64);
        assert_eq!(data.get_double_by_name("sum_of_squares"), total as f64);

        // Clearing while writers run leaves a usable session.
        let handles: Vec<_> = (0..writers)
            .map(|_| {
                let session = Arc::clone(&session);
                thread::spawn(move || {
                    for i in 0..per_writer {
                        session.update(&FixedValue(2.0), i as i64);
                    }
                })
            })
            .collect();
        for _ in 0..50 {
            session.clear();
            assert!(session.collect_data().get_long(&fields::COMMITS) <= 2 * total);
        }
        for handle in handles {
            handle.join().unwrap();
        }

        session.clear();
        let fresh = ConcurrentSession::new("hot", vec![Box::new(DistributionDataRecorder::new())]).unwrap();
        assert_eq!(session.collect_data(), fresh.collect_data());
    }

    #[test]
    fn test_recorder_failures_are_isolated() {
        init();
        let faulty: Box<dyn DataRecorder> = Box::new(FaultyRecorder {
            field: "failing_calls",
            calls: AtomicUsize::new(0),
            panics: false,
        });
        let panicking: Box<dyn DataRecorder> = Box::new(FaultyRecorder {
            field: "panicking_calls",
            calls: AtomicUsize::new(0),
            panics: true,
        });
        let session = ConcurrentSession::new(
            "fragile",
            vec![faulty, panicking, Box::new(DistributionDataRecorder::new())],
        )
        .unwrap();

        session.track(&FixedValue(2.0), 1);
        session.update(&FixedValue(2.0), 1);
        session.track(&FixedValue(8.0), 2);
        session.update(&FixedValue(8.0), 2);

        assert_eq!(session.commits(), 2);
        assert_eq!(session.sum(), 10.0);

        // The distribution recorder after the failing ones still saw both commits.
        let data = session.collect_data();
        assert_eq!(data.get_double_by_name("sum_of_squares"), 68.0);
        assert_eq!(data.get_long(&fields::COMMITS), 2);
    }

    #[test]
    fn test_clear_resets_to_fresh_state() {
        let session = ConcurrentSession::new("db", vec![Box::new(DistributionDataRecorder::new())]).unwrap();
        session.track(&FixedValue(4.0), 10);
        session.update(&FixedValue(4.0), 11);
        let fresh = ConcurrentSession::new("db", vec![Box::new(DistributionDataRecorder::new())]).unwrap();

        session.clear();
        assert_eq!(session.collect_data(), fresh.collect_data());

        session.track(&FixedValue(6.0), 20);
        session.update(&FixedValue(6.0), 21);
        assert_eq!(session.first(), 6.0);
        assert_eq!(session.first_hit_stamp(), 20);
        assert_eq!(session.min(), 6.0);
    }

    #[test]
    fn test_restore_from_collected_data() {
        let source = ConcurrentSession::new("db", vec![Box::new(DistributionDataRecorder::new())]).unwrap();
        for value in &[2.0, 4.0, 8.0] {
            source.track(&FixedValue(*value), 5);
            source.update(&FixedValue(*value), 6);
        }
        let data = source.collect_data();

        let target = ConcurrentSession::new("db", vec![Box::new(DistributionDataRecorder::new())]).unwrap();
        target.restore(&data);
        assert_eq!(target.collect_data(), data);

        target.update(&FixedValue(1.0), 7);
        assert_eq!(target.commits(), 4);
        assert_eq!(target.min(), 1.0);
        assert_eq!(target.first(), 2.0);
    }

    /// Declares a fixed list of long fields and records nothing.
    struct Declaring(Vec<&'static str>);

    impl DataRecorder for Declaring {
        fn supported_fields(&self) -> Vec<FieldRef> {
            self.0.iter().map(|name| StandardField::long(*name, 0).into_ref()).collect()
        }

        fn update(&self, _: &dyn StatsSession, _: &dyn Tracker, _: i64) -> Result<(), StatsError> { Ok(()) }

        fn collect_data(&self, _: &dyn StatsSession, _: &mut DataSetBuilder) -> Result<(), StatsError> { Ok(()) }

        fn restore(&self, _: &DataSet) {}

        fn clear(&self) {}
    }

    #[test]
    fn test_recorder_fields_shadowing_session_fields() {
        // Same type as the base field.
        let err = ConcurrentSession::new("db", vec![Box::new(Declaring(vec!["hits"]))]).err().unwrap();
        assert_eq!(err, StatsError::DuplicateField("hits".to_owned()));

        // Different type from the base field.
        let err = ConcurrentSession::new("db", vec![Box::new(Declaring(vec!["sum"]))]).err().unwrap();
        assert_eq!(err, StatsError::DuplicateField("sum".to_owned()));
    }

    #[test]
    fn test_recorder_fields_shared_between_recorders() {
        let recorders: Vec<Box<dyn DataRecorder>> =
            vec![Box::new(Declaring(vec!["errors"])), Box::new(Declaring(vec!["retries", "errors"]))];
        let err = ConcurrentSession::new("db", recorders).err().unwrap();
        assert_eq!(err, StatsError::DuplicateField("errors".to_owned()));

        let ranges = RangeList::from_breakpoints(&[0.0, 1.0], true).unwrap();
        let session = ConcurrentSession::new("db", vec![Box::new(RangeDataRecorder::new(ranges).unwrap())]);
        assert!(session.is_ok());
    }
}
