use super::{check_name, metadata::FieldMetaDataSet, DataContainer, MetaData, Variant};
use crate::{data::DataSet, error::StatsError};
use fnv::FnvBuildHasher;
use hashbrown::HashMap;
use std::sync::Arc;

/// An open-schema data set with per-field metadata.
#[derive(Debug, Clone, Default)]
pub struct DynamicDataSet {
    fields: HashMap<String, Variant, FnvBuildHasher>,
    meta: FieldMetaDataSet,
}

impl DynamicDataSet {
    pub fn new() -> DynamicDataSet { DynamicDataSet::default() }

    /// Gets the metadata of the given field.
    pub fn field_meta_data(&self, name: &str) -> Result<Arc<MetaData>, StatsError> { self.meta.meta_data(name) }

    pub fn meta_data_set(&self) -> &FieldMetaDataSet { &self.meta }
}

impl DataContainer for DynamicDataSet {
    fn get_field(&self, name: &str) -> Option<Variant> { self.fields.get(name).cloned() }

    fn set_field(&mut self, name: &str, value: Variant) -> Result<Option<Variant>, StatsError> {
        check_name(name)?;
        Ok(self.fields.insert(name.to_owned(), value))
    }

    fn remove_field(&mut self, name: &str) -> Option<Variant> { self.fields.remove(name) }

    /// Removes every field along with all field metadata.
    fn clear(&mut self) {
        self.fields.clear();
        self.meta.clear();
    }

    fn len(&self) -> usize { self.fields.len() }

    fn field_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.fields.keys().cloned().collect();
        names.sort();
        names
    }
}

impl PartialEq for DynamicDataSet {
    fn eq(&self, other: &DynamicDataSet) -> bool { self.fields == other.fields && self.meta == other.meta }
}

impl<'a> From<&'a DataSet> for DynamicDataSet {
    fn from(data: &'a DataSet) -> DynamicDataSet {
        let fields = data
            .iter()
            .map(|(name, value)| (name.to_owned(), Variant::from(value)))
            .collect();
        DynamicDataSet {
            fields,
            meta: FieldMetaDataSet::new(),
        }
    }
}
