use super::DataRecorder;
use crate::{
    atomic::AtomicF64,
    data::{DataSet, DataSetBuilder, FieldRef},
    error::StatsError,
    session::StatsSession,
    tracker::Tracker,
};

/// Names and defaults of the distribution fields.
pub mod fields {
    use crate::data::StandardField;

    pub static PRODUCT: StandardField = StandardField::double("product", 1.0);
    pub static SUM_OF_INVERSES: StandardField = StandardField::double("sum_of_inverses", 0.0);
    pub static SUM_OF_SQUARES: StandardField = StandardField::double("sum_of_squares", 0.0);
    pub static ARITHMETIC_MEAN: StandardField = StandardField::double("arithmetic_mean", 0.0);
    pub static GEOMETRIC_MEAN: StandardField = StandardField::double("geometric_mean", 0.0);
    pub static HARMONIC_MEAN: StandardField = StandardField::double("harmonic_mean", 0.0);
    pub static QUADRATIC_MEAN: StandardField = StandardField::double("quadratic_mean", 0.0);
    pub static STANDARD_DEVIATION: StandardField = StandardField::double("standard_deviation", 0.0);
}

/// Streaming moments of the committed values.
///
/// Keeps the running product, sum of inverses and sum of squares; every mean and the standard
/// deviation are derived from these plus the session's commit count and sum. All derived
/// values are `0.0` while the session has no commits.
#[derive(Debug)]
pub struct DistributionDataRecorder {
    product: AtomicF64,
    sum_of_inverses: AtomicF64,
    sum_of_squares: AtomicF64,
}

impl DistributionDataRecorder {
    pub fn new() -> DistributionDataRecorder {
        DistributionDataRecorder {
            product: AtomicF64::new(1.0),
            sum_of_inverses: AtomicF64::new(0.0),
            sum_of_squares: AtomicF64::new(0.0),
        }
    }

    pub fn product(&self) -> f64 { self.product.load() }

    pub fn sum_of_inverses(&self) -> f64 { self.sum_of_inverses.load() }

    pub fn sum_of_squares(&self) -> f64 { self.sum_of_squares.load() }

    pub fn arithmetic_mean(&self, session: &dyn StatsSession) -> f64 {
        match session.commits() {
            0 => 0.0,
            n => session.sum() / n as f64,
        }
    }

    pub fn geometric_mean(&self, session: &dyn StatsSession) -> f64 {
        match session.commits() {
            0 => 0.0,
            n => self.product().powf(1.0 / n as f64),
        }
    }

    pub fn harmonic_mean(&self, session: &dyn StatsSession) -> f64 {
        match session.commits() {
            0 => 0.0,
            n => n as f64 / self.sum_of_inverses(),
        }
    }

    pub fn quadratic_mean(&self, session: &dyn StatsSession) -> f64 {
        match session.commits() {
            0 => 0.0,
            n => (self.sum_of_squares() / n as f64).sqrt(),
        }
    }

    pub fn standard_deviation(&self, session: &dyn StatsSession) -> f64 {
        match session.commits() {
            0 => 0.0,
            n => {
                let n = n as f64;
                let sum = session.sum();
                let variance = (self.sum_of_squares() - (sum * sum) / n) / (n - 1.0).max(1.0);
                // Rounding can push a zero variance slightly negative.
                variance.max(0.0).sqrt()
            },
        }
    }
}

impl Default for DistributionDataRecorder {
    fn default() -> Self { DistributionDataRecorder::new() }
}

impl DataRecorder for DistributionDataRecorder {
    fn supported_fields(&self) -> Vec<FieldRef> {
        vec![
            fields::PRODUCT.clone().into_ref(),
            fields::SUM_OF_INVERSES.clone().into_ref(),
            fields::SUM_OF_SQUARES.clone().into_ref(),
            fields::ARITHMETIC_MEAN.clone().into_ref(),
            fields::GEOMETRIC_MEAN.clone().into_ref(),
            fields::HARMONIC_MEAN.clone().into_ref(),
            fields::QUADRATIC_MEAN.clone().into_ref(),
            fields::STANDARD_DEVIATION.clone().into_ref(),
        ]
    }

    fn update(&self, _session: &dyn StatsSession, tracker: &dyn Tracker, _now: i64) -> Result<(), StatsError> {
        let value = tracker.value();
        self.product.fetch_mul(value);
        self.sum_of_inverses.fetch_add(1.0 / value);
        self.sum_of_squares.fetch_add(value * value);
        Ok(())
    }

    fn collect_data(&self, session: &dyn StatsSession, data: &mut DataSetBuilder) -> Result<(), StatsError> {
        data.set(&fields::PRODUCT, self.product())?;
        data.set(&fields::SUM_OF_INVERSES, self.sum_of_inverses())?;
        data.set(&fields::SUM_OF_SQUARES, self.sum_of_squares())?;
        data.set(&fields::ARITHMETIC_MEAN, self.arithmetic_mean(session))?;
        data.set(&fields::GEOMETRIC_MEAN, self.geometric_mean(session))?;
        data.set(&fields::HARMONIC_MEAN, self.harmonic_mean(session))?;
        data.set(&fields::QUADRATIC_MEAN, self.quadratic_mean(session))?;
        data.set(&fields::STANDARD_DEVIATION, self.standard_deviation(session))?;
        Ok(())
    }

    fn restore(&self, data: &DataSet) {
        self.product.store(data.get_double(&fields::PRODUCT));
        self.sum_of_inverses.store(data.get_double(&fields::SUM_OF_INVERSES));
        self.sum_of_squares.store(data.get_double(&fields::SUM_OF_SQUARES));
    }

    fn clear(&self) {
        self.product.store(1.0);
        self.sum_of_inverses.store(0.0);
        self.sum_of_squares.store(0.0);
    }
}
