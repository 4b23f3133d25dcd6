use super::{cast, check_name, FromVariant, Variant};
use crate::{error::StatsError, helper::recover};
use fnv::FnvBuildHasher;
use hashbrown::HashMap;
use std::sync::{Arc, Mutex, RwLock};

const DELIMITER: &str = "__";
const NAMESPACE: &str = "meta";

/// Backing map shared by every metadata view of one data set.
#[derive(Debug, Default)]
pub(crate) struct MetaDataMap {
    entries: HashMap<String, Variant, FnvBuildHasher>,
    // Bumped whenever a key is added or removed.
    generation: u64,
}

impl MetaDataMap {
    fn insert(&mut self, key: String, value: Variant) -> Option<Variant> {
        let previous = self.entries.insert(key, value);
        if previous.is_none() {
            self.generation += 1;
        }
        previous
    }

    fn remove(&mut self, key: &str) -> Option<Variant> {
        let previous = self.entries.remove(key);
        if previous.is_some() {
            self.generation += 1;
        }
        previous
    }

    fn retain<F: FnMut(&str) -> bool>(&mut self, mut keep: F) {
        let before = self.entries.len();
        self.entries.retain(|key, _| keep(key));
        if self.entries.len() != before {
            self.generation += 1;
        }
    }
}

type SharedMap = Arc<RwLock<MetaDataMap>>;

/// Field and attribute names must be non-empty and free of the key delimiter, otherwise one
/// field's prefix could match another field's keys.
fn check_meta_name(name: &str) -> Result<(), StatsError> {
    check_name(name)?;
    if name.contains(DELIMITER) {
        return Err(StatsError::InvalidFieldName);
    }
    Ok(())
}

/// Attributes of a single field.
///
/// A `MetaData` is a view: attributes are stored in the map shared by all fields of the owning
/// `FieldMetaDataSet`, under keys prefixed with this field's name.
#[derive(Debug)]
pub struct MetaData {
    field: String,
    prefix: String,
    map: SharedMap,
    names: Mutex<Option<(u64, Arc<Vec<String>>)>>,
}

impl MetaData {
    fn new(field: &str, map: SharedMap) -> MetaData {
        MetaData {
            field: field.to_owned(),
            prefix: format!("{}{}{}{}", field, DELIMITER, NAMESPACE, DELIMITER),
            map,
            names: Mutex::new(None),
        }
    }

    pub fn field_name(&self) -> &str { &self.field }

    fn key(&self, attribute: &str) -> String { format!("{}{}", self.prefix, attribute) }

    pub fn get_attribute(&self, name: &str) -> Option<Variant> {
        recover(self.map.read()).entries.get(&self.key(name)).cloned()
    }

    /// Gets an attribute as `T`, reporting a value of another type as an error.
    pub fn get_attribute_as<T: FromVariant>(&self, name: &str) -> Result<Option<T>, StatsError> {
        match self.get_attribute(name) {
            Some(value) => cast(name, &value).map(Some),
            None => Ok(None),
        }
    }

    /// Gets an attribute as `T`, or `default` if it is absent or of another type.
    pub fn get_attribute_or<T: FromVariant>(&self, name: &str, default: T) -> T {
        self.get_attribute(name)
            .and_then(|value| T::from_variant(&value))
            .unwrap_or(default)
    }

    pub fn set_attribute<V: Into<Variant>>(&self, name: &str, value: V) -> Result<Option<Variant>, StatsError> {
        check_meta_name(name)?;
        Ok(recover(self.map.write()).insert(self.key(name), value.into()))
    }

    pub fn remove_attribute(&self, name: &str) -> Option<Variant> { recover(self.map.write()).remove(&self.key(name)) }

    /// Names of every attribute set on this field, sorted.
    pub fn attribute_names(&self) -> Arc<Vec<String>> {
        let map = recover(self.map.read());
        let mut cached = recover(self.names.lock());
        if let Some((generation, names)) = cached.as_ref() {
            if *generation == map.generation {
                return Arc::clone(names);
            }
        }

        let mut names: Vec<String> = map
            .entries
            .keys()
            .filter_map(|key| key.strip_prefix(self.prefix.as_str()))
            .map(str::to_owned)
            .collect();
        names.sort();

        let names = Arc::new(names);
        *cached = Some((map.generation, Arc::clone(&names)));
        names
    }

    pub fn len(&self) -> usize { self.attribute_names().len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Removes every attribute of this field, leaving other fields' attributes in place.
    pub fn clear(&self) {
        let prefix = self.prefix.as_str();
        recover(self.map.write()).retain(|key| !key.starts_with(prefix));
    }
}

/// Per-field metadata over one shared backing map.
#[derive(Debug, Default)]
pub struct FieldMetaDataSet {
    map: SharedMap,
    views: Mutex<HashMap<String, Arc<MetaData>, FnvBuildHasher>>,
}

impl FieldMetaDataSet {
    pub fn new() -> FieldMetaDataSet { FieldMetaDataSet::default() }

    /// Gets the metadata view of the given field.
    ///
    /// Repeated calls for the same field return the same instance. Fails with
    /// `StatsError::InvalidFieldName` for an empty name or one containing `__`.
    pub fn meta_data(&self, field: &str) -> Result<Arc<MetaData>, StatsError> {
        check_meta_name(field)?;

        let mut views = recover(self.views.lock());
        if let Some(view) = views.get(field) {
            return Ok(Arc::clone(view));
        }

        let view = Arc::new(MetaData::new(field, Arc::clone(&self.map)));
        views.insert(field.to_owned(), Arc::clone(&view));
        Ok(view)
    }

    /// Number of attributes across every field.
    pub fn len(&self) -> usize { recover(self.map.read()).entries.len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Removes the attributes of every field.
    pub fn clear(&self) { recover(self.map.write()).retain(|_| false); }
}

impl Clone for FieldMetaDataSet {
    fn clone(&self) -> FieldMetaDataSet {
        let entries = recover(self.map.read()).entries.clone();
        FieldMetaDataSet {
            map: Arc::new(RwLock::new(MetaDataMap { entries, generation: 0 })),
            views: Mutex::new(HashMap::default()),
        }
    }
}

impl PartialEq for FieldMetaDataSet {
    fn eq(&self, other: &FieldMetaDataSet) -> bool {
        if Arc::ptr_eq(&self.map, &other.map) {
            return true;
        }
        let ours = recover(self.map.read());
        let theirs = recover(other.map.read());
        ours.entries == theirs.entries
    }
}
