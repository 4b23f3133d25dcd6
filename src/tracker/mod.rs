//! Measurement handles.
//!
//! A tracker is a short-lived handle for one measurement episode. It notifies its session with
//! `track` when the episode starts and `update` when a value is committed; the session reads the
//! committed value back through `Tracker::value`.

mod composite;
mod incident;
mod manual;
mod span;

pub use self::{
    composite::CompositeTracker,
    incident::IncidentTracker,
    manual::ManualTracker,
    span::{Measure, SpanTracker},
};

/// The view a session has of a tracker.
pub trait Tracker {
    /// The value recorded when this tracker commits.
    fn value(&self) -> f64;
}

/// A tracker with a fixed value, for feeding sessions directly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedValue(pub f64);

impl Tracker for FixedValue {
    fn value(&self) -> f64 { self.0 }
}
