use super::dataset::DataSet;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// A point-in-time view of every session's data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    sessions: Vec<(String, DataSet)>,
}

impl Snapshot {
    /// Stores the collected data of one session.
    pub(crate) fn push<K: Into<String>>(&mut self, key: K, data: DataSet) { self.sessions.push((key.into(), data)); }

    /// Gets the data collected for the given session key.
    ///
    /// Returns `None` if the key had no session when this snapshot was taken.
    pub fn get(&self, key: &str) -> Option<&DataSet> {
        self.sessions.iter().find(|(k, _)| k == key).map(|(_, data)| data)
    }

    pub fn keys(&self) -> Vec<&str> { self.sessions.iter().map(|(k, _)| k.as_str()).collect() }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DataSet)> {
        self.sessions.iter().map(|(k, data)| (k.as_str(), data))
    }

    pub fn len(&self) -> usize { self.sessions.len() }

    pub fn is_empty(&self) -> bool { self.sessions.is_empty() }

    /// Converts this `Snapshot` to the underlying vector of session data.
    pub fn into_vec(self) -> Vec<(String, DataSet)> { self.sessions }
}

impl Serialize for Snapshot {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.sessions.len()))?;
        for (key, data) in &self.sessions {
            map.serialize_entry(key, data)?;
        }
        map.end()
    }
}
