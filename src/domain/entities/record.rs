use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Uppercase alphanumeric identifier, see [`crate::domain::normalize::normalize`].
pub type NormalizedKey = String;

/// Field values of one shipment, keyed by normalized header name.
///
/// Fields keep the order in which they were first inserted; overwriting a
/// field keeps its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: IndexMap<String, String>,
}

impl Record {
    #[cfg(test)]
    pub fn get(&self, header: &str) -> Option<&str> {
        self.fields.get(header).map(String::as_str)
    }

    pub fn set(&mut self, header: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(header.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// All known records, keyed by normalized identifier. Keys are never empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Store {
    records: IndexMap<NormalizedKey, Record>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Record> {
        self.records.get(key)
    }

    #[cfg(test)]
    pub fn contains_key(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    /// Returns the record for `key`, creating an empty one when the key is new.
    /// `None` for the empty key.
    pub fn record_mut(&mut self, key: &str) -> Option<&mut Record> {
        if key.is_empty() {
            return None;
        }
        let record = match self.records.entry(key.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(Record::default()),
        };
        Some(record)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drops entries that could not have been produced by an import, e.g. a
    /// hand-edited store document with an empty key.
    pub fn drop_invalid_keys(&mut self) -> usize {
        let before = self.records.len();
        self.records.retain(|key, _| !key.is_empty());
        before - self.records.len()
    }
}
