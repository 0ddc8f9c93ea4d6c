//! Record sets flowing along connections.
//!
//! A record set is an ordered sequence of field-keyed records. Homogeneity
//! is a soft contract: inference only reads the first record's field names
//! as representative of the whole set.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// An ordered sequence of records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordSet(Vec<JsonValue>);

impl RecordSet {
    /// Creates an empty record set.
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Creates a record set from a vector of records.
    #[must_use]
    pub fn from_records(records: Vec<JsonValue>) -> Self {
        Self(records)
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the set holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the first record, if any.
    #[must_use]
    pub fn first(&self) -> Option<&JsonValue> {
        self.0.first()
    }

    /// Returns the records as a slice.
    #[must_use]
    pub fn records(&self) -> &[JsonValue] {
        &self.0
    }

    /// Appends a record.
    pub fn push(&mut self, record: JsonValue) {
        self.0.push(record);
    }

    /// Returns an iterator over the records.
    pub fn iter(&self) -> std::slice::Iter<'_, JsonValue> {
        self.0.iter()
    }

    /// Consumes the set, returning the underlying records.
    #[must_use]
    pub fn into_records(self) -> Vec<JsonValue> {
        self.0
    }
}

impl From<Vec<JsonValue>> for RecordSet {
    fn from(records: Vec<JsonValue>) -> Self {
        Self(records)
    }
}

impl FromIterator<JsonValue> for RecordSet {
    fn from_iter<I: IntoIterator<Item = JsonValue>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a JsonValue;
    type IntoIter = std::slice::Iter<'a, JsonValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_set() {
        let set = RecordSet::new();
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
        assert!(set.first().is_none());
    }

    #[test]
    fn preserves_order() {
        let set = RecordSet::from_records(vec![json!({"seq": 1}), json!({"seq": 2})]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.records()[0], json!({"seq": 1}));
        assert_eq!(set.records()[1], json!({"seq": 2}));
    }

    #[test]
    fn serde_is_transparent() {
        let set = RecordSet::from_records(vec![json!({"id": "m-1", "amount": 3})]);
        let json = serde_json::to_string(&set).expect("serialize");
        assert!(json.starts_with('['));
        let parsed: RecordSet = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(set, parsed);
    }
}
