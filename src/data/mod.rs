//! Fixed-schema field values.
//!
//! A `FieldSet` describes which fields a `DataSet` holds; values live in two primitive arrays,
//! one per field type, so collecting a session never boxes individual values.

pub mod dataset;
pub mod field;
pub mod field_set;
pub mod snapshot;

pub use self::{
    dataset::{DataSet, DataSetBuilder},
    field::{same_field, same_value, Field, FieldRef, FieldType, StandardField, Value},
    field_set::FieldSet,
    snapshot::Snapshot,
};
