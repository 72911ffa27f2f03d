//! Constraint-set validation against a composite primary key
//!
//! A constraint set is legal when it is a prefix of the primary key: every
//! partition-key component is constrained, and the constrained clustering
//! components form a leading run of the clustering order. The empty set is
//! always legal and means "scan all rows".
//!
//! # Rules
//!
//! Rules are checked in order; the first failing rule is reported.
//!
//! - Rule 1: no more constraints than key components
//! - Rule 2: every partition-key component is constrained (skipped when
//!   nothing is constrained)
//! - Rule 3: every constrained field is a key component
//! - Rule 4: constrained clustering components are prefix-closed

use crate::constraint::ConstraintSet;
use keyline_model::{KeySchema, KeyViolation};

/// Check that `constraints` addresses a legal primary-key prefix of `key`
pub fn validate(constraints: &ConstraintSet, key: &KeySchema) -> Result<(), KeyViolation> {
    // Rule 1
    if constraints.len() > key.len() {
        return Err(KeyViolation::TooManyKeys {
            fields: constraints.names().map(str::to_string).collect(),
            max: key.len(),
        });
    }

    if constraints.is_empty() {
        return Ok(());
    }

    // Rule 2
    let missing: Vec<String> = key
        .partition()
        .iter()
        .filter(|p| !constraints.contains(p))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(KeyViolation::MissingPartitionKey { fields: missing });
    }

    // Rule 3
    let unknown: Vec<String> = constraints
        .names()
        .filter(|name| !key.contains(name))
        .map(str::to_string)
        .collect();
    if !unknown.is_empty() {
        return Err(KeyViolation::UnknownPrimaryKey { fields: unknown });
    }

    // Rule 4
    let deepest = constraints
        .names()
        .filter_map(|name| key.clustering_position(name))
        .max();
    if let Some(deepest) = deepest {
        let open: Vec<String> = key.clustering()[..deepest]
            .iter()
            .filter(|c| !constraints.contains(c))
            .cloned()
            .collect();
        if !open.is_empty() {
            return Err(KeyViolation::MissingClusteringKey {
                fields: open,
                constrained: key.clustering()[deepest].clone(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> KeySchema {
        KeySchema::new(["uuid_field"], ["another_uuid_field", "still_another_uuid_field"])
    }

    fn set(names: &[&str]) -> ConstraintSet {
        names.iter().map(|n| (*n, "x")).collect()
    }

    #[test]
    fn test_empty_set_is_valid() {
        assert_eq!(validate(&ConstraintSet::new(), &key()), Ok(()));
    }

    #[test]
    fn test_legal_prefixes() {
        assert!(validate(&set(&["uuid_field"]), &key()).is_ok());
        assert!(validate(&set(&["another_uuid_field", "uuid_field"]), &key()).is_ok());
        assert!(validate(
            &set(&["still_another_uuid_field", "uuid_field", "another_uuid_field"]),
            &key()
        )
        .is_ok());
    }

    #[test]
    fn test_too_many_keys() {
        let err = validate(&set(&["uuid_field", "a", "b", "c"]), &key()).unwrap_err();
        assert_eq!(
            err,
            KeyViolation::TooManyKeys {
                fields: vec!["uuid_field".into(), "a".into(), "b".into(), "c".into()],
                max: 3,
            }
        );
    }

    #[test]
    fn test_missing_partition_key() {
        let err = validate(&set(&["another_uuid_field"]), &key()).unwrap_err();
        assert_eq!(
            err,
            KeyViolation::MissingPartitionKey {
                fields: vec!["uuid_field".into()]
            }
        );
    }

    #[test]
    fn test_missing_partition_wins_over_unknown() {
        let err = validate(&set(&["text_field"]), &key()).unwrap_err();
        assert!(matches!(err, KeyViolation::MissingPartitionKey { .. }));
    }

    #[test]
    fn test_unknown_primary_key() {
        let err = validate(&set(&["uuid_field", "text_field"]), &key()).unwrap_err();
        assert_eq!(
            err,
            KeyViolation::UnknownPrimaryKey {
                fields: vec!["text_field".into()]
            }
        );
    }

    #[test]
    fn test_clustering_gap() {
        let err = validate(&set(&["uuid_field", "still_another_uuid_field"]), &key()).unwrap_err();
        assert_eq!(
            err,
            KeyViolation::MissingClusteringKey {
                fields: vec!["another_uuid_field".into()],
                constrained: "still_another_uuid_field".into(),
            }
        );
    }

    #[test]
    fn test_composite_partition_key() {
        let key = KeySchema::new(["a", "b"], ["c"]);
        let err = validate(&set(&["a", "c"]), &key).unwrap_err();
        assert_eq!(
            err,
            KeyViolation::MissingPartitionKey {
                fields: vec!["b".into()]
            }
        );
        assert!(validate(&set(&["b", "a"]), &key).is_ok());
    }
}
