use crate::error::StatsError;
use std::{
    fmt,
    hash::{Hash, Hasher},
};

/// A numeric interval with a display name.
#[derive(Debug, Clone)]
pub struct Range {
    begin: f64,
    end: f64,
    name: String,
}

impl Range {
    /// Creates a range named after its bounds, e.g. `0-10`.
    pub fn new(begin: f64, end: f64) -> Result<Range, StatsError> {
        let name = format!("{}-{}", begin, end);
        Range::with_name(begin, end, name)
    }

    pub fn with_name<N: Into<String>>(begin: f64, end: f64, name: N) -> Result<Range, StatsError> {
        if begin > end {
            return Err(StatsError::InvalidRange { begin, end });
        }

        Ok(Range {
            begin,
            end,
            name: name.into(),
        })
    }

    pub fn begin(&self) -> f64 { self.begin }

    pub fn end(&self) -> f64 { self.end }

    pub fn name(&self) -> &str { &self.name }

    pub fn contains(&self, value: f64, exclusive_end: bool) -> bool {
        if value < self.begin {
            return false;
        }

        if exclusive_end {
            value < self.end
        } else {
            value <= self.end
        }
    }

    pub fn overlaps(&self, other: &Range, exclusive_end: bool) -> bool {
        if exclusive_end {
            self.begin < other.end && other.begin < self.end
        } else {
            self.begin <= other.end && other.begin <= self.end
        }
    }
}

impl PartialEq for Range {
    fn eq(&self, other: &Range) -> bool {
        self.begin.to_bits() == other.begin.to_bits()
            && self.end.to_bits() == other.end.to_bits()
            && self.name == other.name
    }
}

impl Eq for Range {}

impl Hash for Range {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.begin.to_bits().hash(state);
        self.end.to_bits().hash(state);
        self.name.hash(state);
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "{}", self.name) }
}

/// An ordered, non-empty list of ranges sharing one end-exclusivity policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeList {
    ranges: Vec<Range>,
    exclusive_range_end: bool,
    has_overlap: bool,
}

impl RangeList {
    pub fn new(ranges: Vec<Range>, exclusive_range_end: bool) -> Result<RangeList, StatsError> {
        if ranges.is_empty() {
            return Err(StatsError::EmptyRangeList);
        }

        let has_overlap = ranges.iter().enumerate().any(|(i, a)| {
            ranges[i + 1..]
                .iter()
                .any(|b| a.overlaps(b, exclusive_range_end))
        });

        Ok(RangeList {
            ranges,
            exclusive_range_end,
            has_overlap,
        })
    }

    /// Creates the adjacent ranges between consecutive breakpoints.
    ///
    /// `[0, 10, 20]` gives `0-10` and `10-20`. Breakpoints must be ascending and there must be
    /// at least two of them.
    pub fn from_breakpoints(breakpoints: &[f64], exclusive_range_end: bool) -> Result<RangeList, StatsError> {
        let ranges = breakpoints
            .windows(2)
            .map(|pair| Range::new(pair[0], pair[1]))
            .collect::<Result<Vec<_>, _>>()?;
        RangeList::new(ranges, exclusive_range_end)
    }

    pub fn ranges(&self) -> &[Range] { &self.ranges }

    pub fn get(&self, index: usize) -> Option<&Range> { self.ranges.get(index) }

    pub fn len(&self) -> usize { self.ranges.len() }

    pub fn is_empty(&self) -> bool { self.ranges.is_empty() }

    pub fn exclusive_range_end(&self) -> bool { self.exclusive_range_end }

    /// Whether any two ranges in the list overlap.
    pub fn has_overlap(&self) -> bool { self.has_overlap }

    /// Finds the first range at or after `from_index` that contains `value`.
    pub fn index_of_range_containing(&self, value: f64, from_index: usize) -> Option<usize> {
        self.ranges
            .iter()
            .enumerate()
            .skip(from_index)
            .find(|(_, range)| range.contains(value, self.exclusive_range_end))
            .map(|(index, _)| index)
    }
}
