//! Merged key/value table extracted from a document.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Lower-cased label → lower-cased value mapping merged from every table on
/// every page of one document.
///
/// Later inserts overwrite earlier ones for the same label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawTable {
    entries: BTreeMap<String, String>,
}

impl RawTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pair, replacing any previous value for the label.
    ///
    /// Returns the value that was replaced, if any.
    pub fn insert(&mut self, label: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(label.into(), value.into())
    }

    /// Merge another table into this one; `other` wins on conflicts.
    pub fn merge(&mut self, other: RawTable) {
        self.entries.extend(other.entries);
    }

    /// Look up a label.
    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries.get(label).map(String::as_str)
    }

    /// Whether a label is present.
    pub fn contains(&self, label: &str) -> bool {
        self.entries.contains_key(label)
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// An empty table means nothing usable was found in the document.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(label, value)` pairs in label order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for RawTable
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = RawTable::new();
        for (k, v) in iter {
            table.insert(k, v);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_write_wins() {
        let mut table = RawTable::new();
        table.insert("kerros", "2");
        let replaced = table.insert("kerros", "3 / 4");

        assert_eq!(replaced.as_deref(), Some("2"));
        assert_eq!(table.get("kerros"), Some("3 / 4"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_merge_overwrites() {
        let mut first: RawTable = [("hissi", "ei"), ("parveke", "kyllä")].into_iter().collect();
        let second: RawTable = [("hissi", "kyllä")].into_iter().collect();
        first.merge(second);

        assert_eq!(first.get("hissi"), Some("kyllä"));
        assert_eq!(first.get("parveke"), Some("kyllä"));
    }

    #[test]
    fn test_serializes_as_plain_object() {
        let table: RawTable = [("vuokra/kk", "950 €")].into_iter().collect();
        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(json, r#"{"vuokra/kk":"950 €"}"#);
    }
}
