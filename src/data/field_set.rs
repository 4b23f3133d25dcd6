use super::{
    dataset::DataSetBuilder,
    field::{same_value, Field, FieldRef, FieldType},
};
use crate::error::StatsError;
use fnv::FnvBuildHasher;
use hashbrown::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
struct Slot {
    position: usize,
    field_type: FieldType,
    index: usize,
}

/// An ordered schema of fields.
///
/// Long and double fields get independent dense index spaces, each starting at zero, in the
/// order the fields were first seen.
#[derive(Debug)]
pub struct FieldSet {
    fields: Vec<FieldRef>,
    slots: HashMap<String, Slot, FnvBuildHasher>,
    long_defaults: Vec<i64>,
    double_defaults: Vec<f64>,
}

impl FieldSet {
    /// Creates a field set from the given fields.
    ///
    /// A field repeated with the same type keeps its first position.
    pub fn new<I>(fields: I) -> Result<FieldSet, StatsError>
    where
        I: IntoIterator<Item = FieldRef>,
    {
        let mut set = FieldSet {
            fields: Vec::new(),
            slots: HashMap::default(),
            long_defaults: Vec::new(),
            double_defaults: Vec::new(),
        };

        for field in fields {
            if let Some(existing) = set.slots.get(field.name()) {
                if existing.field_type != field.field_type() {
                    return Err(StatsError::DuplicateField(field.name().to_owned()));
                }
                continue;
            }

            let field_type = field.field_type();
            let default = field.default_value();
            let index = match field_type {
                FieldType::Long => {
                    set.long_defaults.push(default.as_long());
                    set.long_defaults.len() - 1
                },
                FieldType::Double => {
                    set.double_defaults.push(default.as_double());
                    set.double_defaults.len() - 1
                },
            };

            let slot = Slot {
                position: set.fields.len(),
                field_type,
                index,
            };
            set.slots.insert(field.name().to_owned(), slot);
            set.fields.push(field);
        }

        if set.fields.is_empty() {
            return Err(StatsError::EmptyFieldSet);
        }

        Ok(set)
    }

    /// Creates a shareable field set.
    pub fn shared<I>(fields: I) -> Result<Arc<FieldSet>, StatsError>
    where
        I: IntoIterator<Item = FieldRef>,
    {
        FieldSet::new(fields).map(Arc::new)
    }

    /// Gets the per-type index of the given field.
    ///
    /// Returns `None` if the field is not part of this set.
    pub fn index_of(&self, field: &dyn Field) -> Option<usize> {
        self.slots
            .get(field.name())
            .filter(|slot| slot.field_type == field.field_type())
            .map(|slot| slot.index)
    }

    /// Gets the declared type and per-type index of the field with the given name.
    pub fn index_of_name(&self, name: &str) -> Option<(FieldType, usize)> {
        self.slots.get(name).map(|slot| (slot.field_type, slot.index))
    }

    pub fn field(&self, name: &str) -> Option<&FieldRef> { self.slots.get(name).map(|slot| &self.fields[slot.position]) }

    pub fn contains(&self, field: &dyn Field) -> bool { self.index_of(field).is_some() }

    pub fn fields(&self) -> &[FieldRef] { &self.fields }

    pub fn len(&self) -> usize { self.fields.len() }

    pub fn is_empty(&self) -> bool { self.fields.is_empty() }

    pub fn long_count(&self) -> usize { self.long_defaults.len() }

    pub fn double_count(&self) -> usize { self.double_defaults.len() }

    /// Fresh copies of the default arrays.
    pub(crate) fn defaults(&self) -> (Vec<i64>, Vec<f64>) { (self.long_defaults.clone(), self.double_defaults.clone()) }

    /// Creates a builder for a data set over this schema.
    pub fn new_data_set_builder(self: &Arc<Self>) -> DataSetBuilder { DataSetBuilder::new(Arc::clone(self)) }
}

impl PartialEq for FieldSet {
    fn eq(&self, other: &FieldSet) -> bool {
        self.fields.len() == other.fields.len()
            && self.fields.iter().zip(other.fields.iter()).all(|(a, b)| {
                a.name() == b.name()
                    && a.field_type() == b.field_type()
                    && same_value(a.default_value(), b.default_value())
            })
    }
}
