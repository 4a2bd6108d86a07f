//! Field/value record stored under a table key

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One backend record: field name → string value
///
/// An empty record is meaningful: in a DELETE snapshot it stands for
/// "the whole entry", and some tables hold key-only entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbValue {
    /// Fields of the record
    pub fields: BTreeMap<String, String>,
}

impl DbValue {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a field value
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Set a field, returning the previous value
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.fields.insert(field.into(), value.into())
    }

    /// Check whether a field is present
    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Remove a field, returning its value
    pub fn remove(&mut self, field: &str) -> Option<String> {
        self.fields.remove(field)
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when the record has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over (field, value) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Field-level union; fields of `other` win
    pub fn merge_fields(&mut self, other: &DbValue) {
        for (k, v) in &other.fields {
            self.fields.insert(k.clone(), v.clone());
        }
    }
}

impl<K, V> FromIterator<(K, V)> for DbValue
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl From<BTreeMap<String, String>> for DbValue {
    fn from(fields: BTreeMap<String, String>) -> Self {
        Self { fields }
    }
}
