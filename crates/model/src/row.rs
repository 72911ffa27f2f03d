//! Raw rows returned by a store client

use crate::value::Value;
use std::collections::HashMap;

/// A raw row: column name to storage value
///
/// Column names are lower-cased on insert. A column that is absent and a
/// column holding `Null` read the same through [`Row::get`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: HashMap<String, Value>,
}

impl Row {
    /// Create an empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column value
    pub fn insert(&mut self, column: &str, value: Value) {
        self.columns.insert(column.to_lowercase(), value);
    }

    /// Builder-style [`Row::insert`]
    pub fn with(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.insert(column, value.into());
        self
    }

    /// Remove a column, returning its value
    pub fn remove(&mut self, column: &str) -> Option<Value> {
        self.columns.remove(column)
    }

    /// Look up a column
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.get(column).filter(|v| !v.is_null())
    }

    /// Number of columns carried by the row
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the row has no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Iterate over columns in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Consume the row into its columns
    pub fn into_columns(self) -> HashMap<String, Value> {
        self.columns
    }
}

impl<K: AsRef<str>> FromIterator<(K, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (k, v) in iter {
            row.insert(k.as_ref(), v);
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_reads_as_absent() {
        let row = Row::new().with("a", Value::Null).with("B", 1i64);
        assert_eq!(row.get("a"), None);
        assert_eq!(row.get("b"), Some(&Value::Int(1)));
        assert_eq!(row.len(), 2);
    }
}
