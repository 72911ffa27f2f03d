//! Constraint sets supplied to `find` and `get`

use keyline_model::Value;

/// Insertion-ordered mapping from lower-cased field name to value
///
/// Re-inserting a name replaces its value in place, keeping the original
/// position. The caller's order is the order of the where-clause the first
/// time a given field set is prepared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstraintSet {
    entries: Vec<(String, Value)>,
}

impl ConstraintSet {
    /// Empty constraint set: matches every row
    pub fn new() -> Self {
        Self::default()
    }

    /// Constrain `field` to `value`
    pub fn insert(&mut self, field: &str, value: impl Into<Value>) {
        let field = field.to_lowercase();
        let value = value.into();
        match self.entries.iter_mut().find(|(name, _)| *name == field) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((field, value)),
        }
    }

    /// Builder-style [`ConstraintSet::insert`]
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    /// Value constrained for `field`
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, v)| v)
    }

    /// Whether `field` is constrained
    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// Number of constrained fields
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is constrained
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Field names in caller order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Field names sorted lexicographically
    pub fn sorted_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.names().collect();
        names.sort_unstable();
        names
    }

    /// `(field, value)` pairs in caller order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, v)| (name.as_str(), v))
    }
}

impl<K: AsRef<str>, V: Into<Value>> FromIterator<(K, V)> for ConstraintSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = ConstraintSet::new();
        for (k, v) in iter {
            set.insert(k.as_ref(), v);
        }
        set
    }
}

impl<K: AsRef<str>, V: Into<Value>, const N: usize> From<[(K, V); N]> for ConstraintSet {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl<K: AsRef<str>, V: Into<Value>> From<Vec<(K, V)>> for ConstraintSet {
    fn from(pairs: Vec<(K, V)>) -> Self {
        pairs.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_and_lowercasing() {
        let set = ConstraintSet::from([("B", 1), ("a", 2)]);
        assert_eq!(set.names().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(set.sorted_names(), vec!["a", "b"]);
        assert_eq!(set.get("b"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_reinsert_replaces_in_place() {
        let mut set = ConstraintSet::new().with("a", 1).with("b", 2);
        set.insert("A", 3);
        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().next(), Some(("a", &Value::Int(3))));
    }
}
