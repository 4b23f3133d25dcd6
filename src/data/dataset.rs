use super::{
    field::{Field, FieldType, Value},
    field_set::FieldSet,
};
use crate::error::StatsError;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::sync::Arc;

/// An immutable set of field values over a fixed schema.
#[derive(Debug, Clone)]
pub struct DataSet {
    fields: Arc<FieldSet>,
    longs: Vec<i64>,
    doubles: Vec<f64>,
}

impl DataSet {
    /// Creates a data set holding the defaults of every field.
    pub fn defaults(fields: Arc<FieldSet>) -> DataSet {
        let (longs, doubles) = fields.defaults();
        DataSet { fields, longs, doubles }
    }

    pub fn field_set(&self) -> &Arc<FieldSet> { &self.fields }

    /// Gets the value of the given field, or its default if it is not part of this data set.
    pub fn get(&self, field: &dyn Field) -> Value {
        match self.fields.index_of(field) {
            Some(index) => read(&self.longs, &self.doubles, field.field_type(), index),
            None => field.default_value(),
        }
    }

    pub fn get_long(&self, field: &dyn Field) -> i64 { self.get(field).as_long() }

    pub fn get_double(&self, field: &dyn Field) -> f64 { self.get(field).as_double() }

    pub fn get_bool(&self, field: &dyn Field) -> bool { self.get(field).as_bool() }

    /// Gets the value of the field with the given name.
    ///
    /// Returns `None` if no such field is part of this data set.
    pub fn get_by_name(&self, name: &str) -> Option<Value> {
        self.fields
            .index_of_name(name)
            .map(|(field_type, index)| read(&self.longs, &self.doubles, field_type, index))
    }

    pub fn get_long_by_name(&self, name: &str) -> i64 { self.get_by_name(name).map(Value::as_long).unwrap_or(0) }

    pub fn get_double_by_name(&self, name: &str) -> f64 {
        self.get_by_name(name).map(Value::as_double).unwrap_or(0.0)
    }

    pub fn get_bool_by_name(&self, name: &str) -> bool { self.get_by_name(name).map(Value::as_bool).unwrap_or(false) }

    /// Iterates over every field name and value, in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Value)> + '_ {
        self.fields.fields().iter().map(move |field| (field.name(), self.get(&**field)))
    }

    pub fn field_names(&self) -> Vec<&str> { self.fields.fields().iter().map(|field| field.name()).collect() }

    pub fn len(&self) -> usize { self.fields.len() }

    pub fn is_empty(&self) -> bool { self.fields.is_empty() }
}

impl PartialEq for DataSet {
    fn eq(&self, other: &DataSet) -> bool {
        // Doubles compare by bit pattern so that NaN defaults match.
        (Arc::ptr_eq(&self.fields, &other.fields) || *self.fields == *other.fields)
            && self.longs == other.longs
            && self.doubles.len() == other.doubles.len()
            && self
                .doubles
                .iter()
                .zip(other.doubles.iter())
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

impl Serialize for DataSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.iter() {
            match value {
                Value::Long(v) => map.serialize_entry(name, &v)?,
                Value::Double(v) => map.serialize_entry(name, &v)?,
            }
        }
        map.end()
    }
}

fn read(longs: &[i64], doubles: &[f64], field_type: FieldType, index: usize) -> Value {
    match field_type {
        FieldType::Long => Value::Long(longs[index]),
        FieldType::Double => Value::Double(doubles[index]),
    }
}

/// Builder for a `DataSet`.
///
/// The builder owns fresh copies of the schema defaults and hands them over, uncopied, to the
/// data set on `build`. It is not meant to be shared across threads.
#[derive(Debug)]
pub struct DataSetBuilder {
    fields: Arc<FieldSet>,
    values: Option<(Vec<i64>, Vec<f64>)>,
}

impl DataSetBuilder {
    pub(crate) fn new(fields: Arc<FieldSet>) -> DataSetBuilder {
        let values = Some(fields.defaults());
        DataSetBuilder { fields, values }
    }

    pub fn field_set(&self) -> &Arc<FieldSet> { &self.fields }

    pub fn is_built(&self) -> bool { self.values.is_none() }

    /// Gets the current value of the given field.
    ///
    /// Fields outside the schema, and every field once built, read as their default.
    pub fn get(&self, field: &dyn Field) -> Value {
        match (&self.values, self.fields.index_of(field)) {
            (Some((longs, doubles)), Some(index)) => read(longs, doubles, field.field_type(), index),
            _ => field.default_value(),
        }
    }

    /// Stores a value for the given field, returning the previous value.
    ///
    /// The value is converted to the field's declared type. Writing a field outside the schema
    /// does nothing and returns the field's default.
    pub fn set<V: Into<Value>>(&mut self, field: &dyn Field, value: V) -> Result<Value, StatsError> {
        let (longs, doubles) = self.values.as_mut().ok_or(StatsError::AlreadyBuilt)?;
        match self.fields.index_of(field) {
            Some(index) => Ok(write(longs, doubles, field.field_type(), index, value.into())),
            None => Ok(field.default_value()),
        }
    }

    /// Stores a value for the field with the given name, returning the previous value.
    ///
    /// Returns `Ok(None)` if no such field is part of the schema.
    pub fn set_by_name<V: Into<Value>>(&mut self, name: &str, value: V) -> Result<Option<Value>, StatsError> {
        let (longs, doubles) = self.values.as_mut().ok_or(StatsError::AlreadyBuilt)?;
        Ok(self
            .fields
            .index_of_name(name)
            .map(|(field_type, index)| write(longs, doubles, field_type, index, value.into())))
    }

    pub fn set_long(&mut self, field: &dyn Field, value: i64) -> Result<i64, StatsError> {
        self.set(field, value).map(Value::as_long)
    }

    pub fn set_double(&mut self, field: &dyn Field, value: f64) -> Result<f64, StatsError> {
        self.set(field, value).map(Value::as_double)
    }

    pub fn set_bool(&mut self, field: &dyn Field, value: bool) -> Result<bool, StatsError> {
        self.set(field, value).map(Value::as_bool)
    }

    /// Copies every value of `data` that this schema also holds.
    pub fn merge(&mut self, data: &DataSet) -> Result<(), StatsError> {
        for (name, value) in data.iter() {
            self.set_by_name(name, value)?;
        }
        Ok(())
    }

    /// Converts the builder into a `DataSet`.
    ///
    /// Only the first call succeeds; the builder refuses all later writes.
    pub fn build(&mut self) -> Result<DataSet, StatsError> {
        let (longs, doubles) = self.values.take().ok_or(StatsError::AlreadyBuilt)?;
        Ok(DataSet {
            fields: Arc::clone(&self.fields),
            longs,
            doubles,
        })
    }

    /// Consumes the builder into a `DataSet`.
    ///
    /// A builder that was already built yields the schema defaults.
    pub fn finish(mut self) -> DataSet {
        match self.values.take() {
            Some((longs, doubles)) => DataSet {
                fields: self.fields,
                longs,
                doubles,
            },
            None => DataSet::defaults(self.fields),
        }
    }
}

fn write(longs: &mut [i64], doubles: &mut [f64], field_type: FieldType, index: usize, value: Value) -> Value {
    match field_type {
        FieldType::Long => {
            let previous = longs[index];
            longs[index] = value.as_long();
            Value::Long(previous)
        },
        FieldType::Double => {
            let previous = doubles[index];
            doubles[index] = value.as_double();
            Value::Double(previous)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::DataSet;
    use crate::{
        data::{
            field::{StandardField, Value},
            field_set::FieldSet,
        },
        error::StatsError,
    };
    use std::sync::Arc;

    const HITS: StandardField = StandardField::long("hits", 0);
    const SUM: StandardField = StandardField::double("sum", 0.0);
    const FIRST: StandardField = StandardField::double("first", std::f64::NAN);
    const ACTIVE: StandardField = StandardField::boolean("active", false);
    const UNKNOWN: StandardField = StandardField::long("unknown", 17);

    fn field_set() -> Arc<FieldSet> {
        FieldSet::shared(vec![HITS.into_ref(), SUM.into_ref(), FIRST.into_ref(), ACTIVE.into_ref()]).unwrap()
    }

    #[test]
    fn test_builder_set_and_get() {
        let mut builder = field_set().new_data_set_builder();
        assert_eq!(builder.set(&HITS, 4i64).unwrap(), Value::Long(0));
        assert_eq!(builder.set(&HITS, 5i64).unwrap(), Value::Long(4));
        assert_eq!(builder.set_double(&SUM, 2.5).unwrap(), 0.0);
        assert!(!builder.set_bool(&ACTIVE, true).unwrap());

        let data = builder.build().unwrap();
        assert_eq!(data.get_long(&HITS), 5);
        assert_eq!(data.get_double(&SUM), 2.5);
        assert!(data.get_bool(&ACTIVE));
        assert!(data.get_double(&FIRST).is_nan());
    }

    #[test]
    fn test_builder_dispatches_on_declared_type() {
        let mut builder = field_set().new_data_set_builder();
        builder.set(&HITS, 9.75).unwrap();
        builder.set(&SUM, 3i64).unwrap();

        let data = builder.build().unwrap();
        assert_eq!(data.get(&HITS), Value::Long(9));
        assert_eq!(data.get(&SUM), Value::Double(3.0));
        assert_eq!(data.get_double(&HITS), 9.0);
    }

    #[test]
    fn test_unknown_field_falls_back_to_default() {
        let mut builder = field_set().new_data_set_builder();
        assert_eq!(builder.get(&UNKNOWN), Value::Long(17));
        assert_eq!(builder.set(&UNKNOWN, 99i64).unwrap(), Value::Long(17));
        assert_eq!(builder.get(&UNKNOWN), Value::Long(17));
        assert_eq!(builder.set_by_name("unknown", 1i64).unwrap(), None);

        let data = builder.build().unwrap();
        assert_eq!(data.get(&UNKNOWN), Value::Long(17));
        assert_eq!(data.get_by_name("unknown"), None);
        assert_eq!(data.get_long_by_name("unknown"), 0);
        assert_eq!(data.get_double_by_name("unknown"), 0.0);
    }

    #[test]
    fn test_builder_builds_once() {
        let mut builder = field_set().new_data_set_builder();
        builder.set(&HITS, 3i64).unwrap();
        let data = builder.build().unwrap();

        assert_eq!(builder.build().unwrap_err(), StatsError::AlreadyBuilt);
        assert_eq!(builder.set(&HITS, 10i64).unwrap_err(), StatsError::AlreadyBuilt);
        assert_eq!(builder.set_by_name("hits", 10i64).unwrap_err(), StatsError::AlreadyBuilt);
        assert!(builder.is_built());
        assert_eq!(data.get_long(&HITS), 3);
    }

    #[test]
    fn test_builders_do_not_share_arrays() {
        let fields = field_set();
        let mut first = fields.new_data_set_builder();
        let second = fields.new_data_set_builder();
        first.set(&HITS, 8i64).unwrap();

        assert_eq!(second.get(&HITS), Value::Long(0));
        assert_eq!(fields.new_data_set_builder().get(&HITS), Value::Long(0));
    }

    #[test]
    fn test_finish_after_build_yields_defaults() {
        let mut builder = field_set().new_data_set_builder();
        builder.set(&HITS, 3i64).unwrap();
        let _ = builder.build().unwrap();

        let data = builder.finish();
        assert_eq!(data, DataSet::defaults(field_set()));
    }

    #[test]
    fn test_data_set_equality() {
        let mut a = field_set().new_data_set_builder();
        let mut b = field_set().new_data_set_builder();
        a.set(&SUM, 1.5).unwrap();
        b.set(&SUM, 1.5).unwrap();

        // Untouched NaN defaults compare equal.
        let a = a.build().unwrap();
        let b = b.build().unwrap();
        assert_eq!(a, b);

        let mut c = field_set().new_data_set_builder();
        c.set(&SUM, 1.6).unwrap();
        assert_ne!(a, c.build().unwrap());

        let narrower = FieldSet::shared(vec![HITS.into_ref()]).unwrap();
        assert_ne!(a, DataSet::defaults(narrower));
    }

    #[test]
    fn test_data_set_iter_and_merge() {
        let mut builder = field_set().new_data_set_builder();
        builder.set(&HITS, 2i64).unwrap();
        let data = builder.build().unwrap();

        let names = data.field_names();
        assert_eq!(names, vec!["hits", "sum", "first", "active"]);
        assert_eq!(data.iter().next(), Some(("hits", Value::Long(2))));

        let wider = FieldSet::shared(vec![HITS.into_ref(), UNKNOWN.into_ref()]).unwrap();
        let mut merged = wider.new_data_set_builder();
        merged.merge(&data).unwrap();
        let merged = merged.build().unwrap();
        assert_eq!(merged.get_long(&HITS), 2);
        assert_eq!(merged.get_long(&UNKNOWN), 17);
    }

    #[test]
    fn test_data_set_serialize() {
        let fields = FieldSet::shared(vec![HITS.into_ref(), SUM.into_ref()]).unwrap();
        let mut builder = fields.new_data_set_builder();
        builder.set(&HITS, 3i64).unwrap();
        builder.set(&SUM, 4.5).unwrap();

        let json = serde_json::to_string(&builder.build().unwrap()).unwrap();
        assert_eq!(json, r#"{"hits":3,"sum":4.5}"#);
    }
}
