//! Property tests for key validation and statement reuse

use keyline_model::{KeySchema, KeyViolation, TableSchema};
use keyline_query::{validate, ConstraintSet, QueryPlanner};
use proptest::prelude::*;
use std::cell::Cell;
use std::sync::Arc;

const PARTITION: [&str; 2] = ["p1", "p2"];
const CLUSTERING: [&str; 3] = ["c1", "c2", "c3"];
const ALL: [&str; 6] = ["p1", "p2", "c1", "c2", "c3", "extra"];

fn key() -> KeySchema {
    KeySchema::new(PARTITION, CLUSTERING)
}

fn schema() -> Arc<TableSchema> {
    let mut builder = TableSchema::builder("wide").keyspace("ks");
    for name in ALL {
        builder = builder.field(name, "text");
    }
    Arc::new(builder.primary_key(PARTITION, CLUSTERING).build().unwrap())
}

/// Reference verdict: a legal set is empty, or holds every partition key
/// plus a leading run of clustering keys and nothing else
fn is_legal_prefix(names: &[&str]) -> bool {
    if names.is_empty() {
        return true;
    }
    if !PARTITION.iter().all(|p| names.contains(p)) {
        return false;
    }
    let clustering = names.iter().filter(|n| CLUSTERING.contains(n)).count();
    let others = names.len() - PARTITION.len() - clustering;
    others == 0 && CLUSTERING[..clustering].iter().all(|c| names.contains(c))
}

fn subset() -> impl Strategy<Value = Vec<&'static str>> {
    prop::sample::subsequence(ALL.to_vec(), 0..=ALL.len()).prop_shuffle()
}

proptest! {
    #[test]
    fn prop_validator_matches_reference(names in subset()) {
        let constraints: ConstraintSet = names.iter().map(|n| (*n, "v")).collect();
        let verdict = validate(&constraints, &key());
        prop_assert_eq!(verdict.is_ok(), is_legal_prefix(&names));
    }

    #[test]
    fn prop_violation_precedence(names in subset()) {
        let constraints: ConstraintSet = names.iter().map(|n| (*n, "v")).collect();
        match validate(&constraints, &key()) {
            Ok(()) => {}
            Err(KeyViolation::TooManyKeys { max, .. }) => {
                prop_assert_eq!(max, 5);
                prop_assert!(names.len() > 5);
            }
            Err(KeyViolation::MissingPartitionKey { fields }) => {
                prop_assert!(names.len() <= 5);
                prop_assert!(fields.iter().all(|f| !names.iter().any(|n| *n == f.as_str())));
            }
            Err(KeyViolation::UnknownPrimaryKey { fields }) => {
                prop_assert!(PARTITION.iter().all(|p| names.contains(p)));
                prop_assert_eq!(fields, vec!["extra".to_string()]);
            }
            Err(KeyViolation::MissingClusteringKey { fields, constrained }) => {
                prop_assert!(!names.contains(&"extra"));
                prop_assert!(names.iter().any(|n| *n == constrained.as_str()));
                prop_assert!(!fields.is_empty());
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig { max_global_rejects: 65536, ..ProptestConfig::default() })]

    #[test]
    fn prop_any_order_reuses_one_statement(names in subset()) {
        prop_assume!(is_legal_prefix(&names));
        let planner: QueryPlanner<()> = QueryPlanner::new(schema());
        let prepares = Cell::new(0);
        let prepare = |_: &str| {
            prepares.set(prepares.get() + 1);
            Ok(())
        };

        let forward: ConstraintSet = names.iter().map(|n| (*n, *n)).collect();
        let backward: ConstraintSet = names.iter().rev().map(|n| (*n, *n)).collect();
        let a = planner.find(&forward, Some(10), prepare).unwrap();
        let b = planner.find(&backward, Some(10), prepare).unwrap();

        prop_assert_eq!(prepares.get(), 1);
        prop_assert!(Arc::ptr_eq(&a, &b));
        // Each placeholder receives the value of its own column
        for (column, value) in b.bind_columns().iter().zip(b.bind(&backward)) {
            prop_assert_eq!(value.as_str(), Some(column.as_str()));
        }
    }
}

#[test]
fn test_limits_split_cache_entries() {
    let planner: QueryPlanner<()> = QueryPlanner::new(schema());
    let constraints = ConstraintSet::from([("p1", "a"), ("p2", "b")]);
    planner.find(&constraints, None, |_| Ok(())).unwrap();
    planner.find(&constraints, Some(0), |_| Ok(())).unwrap();
    planner.find(&constraints, Some(3), |_| Ok(())).unwrap();
    assert_eq!(planner.cache().len(), 2);
    assert!(planner.cache().get("find_p1_p2").is_some());
    assert!(planner.cache().get("find_p1_p2_limit3").is_some());
}
