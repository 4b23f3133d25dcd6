//! Open-schema, string-keyed field storage.
//!
//! Unlike `data::DataSet`, these containers accept any field name at runtime and values of
//! mixed types. Typed reads come in two flavors: `get_field_as` reports a type mismatch as an
//! error, `get_field_or` quietly falls back to the given default.

pub mod dataset;
pub mod metadata;

pub use self::{
    dataset::DynamicDataSet,
    metadata::{FieldMetaDataSet, MetaData},
};

use crate::{data::Value, error::StatsError};
use std::fmt;

/// A dynamically typed value.
#[derive(Clone, Debug, PartialEq)]
pub enum Variant {
    Long(i64),
    Double(f64),
    Bool(bool),
    Text(String),
}

impl Variant {
    pub fn type_name(&self) -> &'static str {
        match self {
            Variant::Long(_) => i64::TYPE_NAME,
            Variant::Double(_) => f64::TYPE_NAME,
            Variant::Bool(_) => bool::TYPE_NAME,
            Variant::Text(_) => String::TYPE_NAME,
        }
    }
}

impl From<i64> for Variant {
    fn from(v: i64) -> Self { Variant::Long(v) }
}

impl From<f64> for Variant {
    fn from(v: f64) -> Self { Variant::Double(v) }
}

impl From<bool> for Variant {
    fn from(v: bool) -> Self { Variant::Bool(v) }
}

impl From<String> for Variant {
    fn from(v: String) -> Self { Variant::Text(v) }
}

impl<'a> From<&'a str> for Variant {
    fn from(v: &'a str) -> Self { Variant::Text(v.to_owned()) }
}

impl From<Value> for Variant {
    fn from(v: Value) -> Self {
        match v {
            Value::Long(v) => Variant::Long(v),
            Value::Double(v) => Variant::Double(v),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Variant::Long(v) => write!(f, "{}", v),
            Variant::Double(v) => write!(f, "{}", v),
            Variant::Bool(v) => write!(f, "{}", v),
            Variant::Text(v) => write!(f, "{}", v),
        }
    }
}

/// Types a `Variant` can be read back as.
///
/// Conversions are exact: a `Long` never reads as `f64`, nor a `Double` as `i64`.
pub trait FromVariant: Sized {
    const TYPE_NAME: &'static str;

    fn from_variant(value: &Variant) -> Option<Self>;
}

impl FromVariant for i64 {
    const TYPE_NAME: &'static str = "long";

    fn from_variant(value: &Variant) -> Option<Self> {
        match value {
            Variant::Long(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromVariant for f64 {
    const TYPE_NAME: &'static str = "double";

    fn from_variant(value: &Variant) -> Option<Self> {
        match value {
            Variant::Double(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromVariant for bool {
    const TYPE_NAME: &'static str = "bool";

    fn from_variant(value: &Variant) -> Option<Self> {
        match value {
            Variant::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromVariant for String {
    const TYPE_NAME: &'static str = "text";

    fn from_variant(value: &Variant) -> Option<Self> {
        match value {
            Variant::Text(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FromVariant for Variant {
    const TYPE_NAME: &'static str = "variant";

    fn from_variant(value: &Variant) -> Option<Self> { Some(value.clone()) }
}

/// Reads `value` as `T`, reporting a mismatch against the field `name`.
pub(crate) fn cast<T: FromVariant>(name: &str, value: &Variant) -> Result<T, StatsError> {
    T::from_variant(value).ok_or_else(|| StatsError::TypeMismatch {
        name: name.to_owned(),
        expected: T::TYPE_NAME,
        actual: value.type_name(),
    })
}

pub(crate) fn check_name(name: &str) -> Result<(), StatsError> {
    if name.is_empty() {
        return Err(StatsError::InvalidFieldName);
    }
    Ok(())
}

/// A string-keyed container of dynamically typed fields.
pub trait DataContainer {
    /// Gets the stored value of the given field.
    fn get_field(&self, name: &str) -> Option<Variant>;

    /// Stores a value, returning the previous one.
    ///
    /// Fails with `StatsError::InvalidFieldName` if the name is empty.
    fn set_field(&mut self, name: &str, value: Variant) -> Result<Option<Variant>, StatsError>;

    fn remove_field(&mut self, name: &str) -> Option<Variant>;

    fn clear(&mut self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool { self.len() == 0 }

    fn field_names(&self) -> Vec<String>;

    /// Gets the stored value of the given field as `T`.
    ///
    /// An absent field gives `Ok(None)`; a value of another type gives
    /// `StatsError::TypeMismatch`.
    fn get_field_as<T: FromVariant>(&self, name: &str) -> Result<Option<T>, StatsError>
    where
        Self: Sized,
    {
        match self.get_field(name) {
            Some(value) => cast(name, &value).map(Some),
            None => Ok(None),
        }
    }

    /// Gets the stored value of the given field as `T`, or `default` if it is absent or of
    /// another type.
    fn get_field_or<T: FromVariant>(&self, name: &str, default: T) -> T
    where
        Self: Sized,
    {
        self.get_field(name)
            .and_then(|value| T::from_variant(&value))
            .unwrap_or(default)
    }
}
