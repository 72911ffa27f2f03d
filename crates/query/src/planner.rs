//! Query planning
//!
//! Every logical operation on a table maps to one statement shape per
//! canonical cache key:
//!
//! | Operation | Cache key | Statement |
//! |-----------|-----------|-----------|
//! | find | `find[_<sorted fields>][_limit<n>]` | `SELECT * ... [WHERE f = ? AND ...] [LIMIT n]` |
//! | get | `get_<sorted fields>_limit1` | `SELECT * ... WHERE ... LIMIT 1` |
//! | delete | `delete` | `DELETE ... WHERE <primary key>` |
//! | count | `count` | `SELECT COUNT(*) ...` |
//! | save | `save_<columns>` | `INSERT ... (<columns>) VALUES (?, ...)` |
//!
//! Where-clause fragments follow the caller's insertion order the first
//! time a key is prepared; that order is then frozen in the cached
//! [`PreparedQuery`] and later callers are rebound through it.

use crate::cache::{PreparedQuery, StatementCache};
use crate::constraint::ConstraintSet;
use crate::validation::validate;
use keyline_model::{Result, StoreError, TableSchema, Value};
use std::fmt;
use std::sync::Arc;

/// Logical operation a statement serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Filtered scan
    Find,
    /// Single-row lookup
    Get,
    /// Delete by full primary key
    Delete,
    /// Row count
    Count,
    /// Insert (upsert) of a column list
    Save,
}

impl Operation {
    /// Name used as the first cache-key segment
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Find => "find",
            Operation::Get => "get",
            Operation::Delete => "delete",
            Operation::Count => "count",
            Operation::Save => "save",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical cache key: operation, fields and positive limit joined by `_`
///
/// Fields are taken in the order given; callers sort them where the
/// operation is order-insensitive. A zero limit counts as no limit.
pub fn cache_key<'a, I>(op: Operation, fields: I, limit: Option<usize>) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut parts: Vec<String> = vec![op.as_str().to_string()];
    parts.extend(fields.into_iter().map(str::to_string));
    if let Some(n) = limit.filter(|n| *n > 0) {
        parts.push(format!("limit{}", n));
    }
    parts.join("_")
}

/// A planned statement, before preparation
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    /// Canonical cache key
    pub cache_key: String,
    /// Full statement text
    pub text: String,
    /// `a = ? AND b = ?`, empty when unfiltered
    pub where_clause: String,
    /// Column bound at each placeholder
    pub bind_columns: Vec<String>,
    /// Constraint values in placeholder order, when planned from constraints
    pub bind_values: Vec<Value>,
}

// ============================================================================
// Statement builders
// ============================================================================

fn where_clause<'a>(columns: impl IntoIterator<Item = &'a str>) -> String {
    columns
        .into_iter()
        .map(|c| format!("{} = ?", c))
        .collect::<Vec<_>>()
        .join(" AND ")
}

fn plan_select(
    op: Operation,
    schema: &TableSchema,
    constraints: &ConstraintSet,
    limit: Option<usize>,
) -> QueryPlan {
    let limit = limit.filter(|n| *n > 0);
    let clause = where_clause(constraints.names());
    let mut text = format!("SELECT * FROM {}", schema.qualified_name());
    if !clause.is_empty() {
        text.push_str(" WHERE ");
        text.push_str(&clause);
    }
    if let Some(n) = limit {
        text.push_str(&format!(" LIMIT {}", n));
    }
    text.push(';');

    QueryPlan {
        cache_key: cache_key(op, constraints.sorted_names(), limit),
        text,
        where_clause: clause,
        bind_columns: constraints.names().map(str::to_string).collect(),
        bind_values: constraints.iter().map(|(_, v)| v.clone()).collect(),
    }
}

/// Plan a filtered scan
pub fn plan_find(schema: &TableSchema, constraints: &ConstraintSet, limit: Option<usize>) -> QueryPlan {
    plan_select(Operation::Find, schema, constraints, limit)
}

/// Plan a single-row lookup (limit 1)
pub fn plan_get(schema: &TableSchema, constraints: &ConstraintSet) -> QueryPlan {
    plan_select(Operation::Get, schema, constraints, Some(1))
}

/// Plan a delete by full primary key, partition keys first
pub fn plan_delete(schema: &TableSchema) -> QueryPlan {
    let columns: Vec<String> = schema.key().columns().map(str::to_string).collect();
    let clause = where_clause(columns.iter().map(String::as_str));
    QueryPlan {
        cache_key: cache_key(Operation::Delete, [], None),
        text: format!("DELETE FROM {} WHERE {};", schema.qualified_name(), clause),
        where_clause: clause,
        bind_columns: columns,
        bind_values: Vec::new(),
    }
}

/// Plan a row count
pub fn plan_count(schema: &TableSchema) -> QueryPlan {
    QueryPlan {
        cache_key: cache_key(Operation::Count, [], None),
        text: format!("SELECT COUNT(*) FROM {};", schema.qualified_name()),
        where_clause: String::new(),
        bind_columns: Vec::new(),
        bind_values: Vec::new(),
    }
}

/// Plan an insert of `columns`, in the order given
pub fn plan_save(schema: &TableSchema, columns: &[&str]) -> QueryPlan {
    let placeholders = vec!["?"; columns.len()].join(",");
    QueryPlan {
        cache_key: cache_key(Operation::Save, columns.iter().copied(), None),
        text: format!(
            "INSERT INTO {} ({}) VALUES ({});",
            schema.qualified_name(),
            columns.join(","),
            placeholders
        ),
        where_clause: String::new(),
        bind_columns: columns.iter().map(|c| c.to_string()).collect(),
        bind_values: Vec::new(),
    }
}

// ============================================================================
// QueryPlanner
// ============================================================================

/// Validates constraints and resolves statements through the table's cache
///
/// Each method takes a `prepare` closure that submits statement text to the
/// driver; it runs only on a cache miss.
#[derive(Debug)]
pub struct QueryPlanner<H> {
    schema: Arc<TableSchema>,
    cache: StatementCache<H>,
}

impl<H> QueryPlanner<H> {
    /// Planner for `schema` with an empty cache
    pub fn new(schema: Arc<TableSchema>) -> Self {
        QueryPlanner {
            schema,
            cache: StatementCache::new(),
        }
    }

    /// Table schema
    pub fn schema(&self) -> &Arc<TableSchema> {
        &self.schema
    }

    /// Statement cache
    pub fn cache(&self) -> &StatementCache<H> {
        &self.cache
    }

    /// Statement for a filtered scan
    ///
    /// Fails with a key violation before anything is prepared when the
    /// constraints are not a legal key prefix.
    pub fn find<F>(
        &self,
        constraints: &ConstraintSet,
        limit: Option<usize>,
        prepare: F,
    ) -> Result<Arc<PreparedQuery<H>>>
    where
        F: FnOnce(&str) -> std::result::Result<H, StoreError>,
    {
        validate(constraints, self.schema.key())?;
        self.select(Operation::Find, constraints, limit, prepare)
    }

    /// Statement for a single-row lookup
    pub fn get<F>(&self, constraints: &ConstraintSet, prepare: F) -> Result<Arc<PreparedQuery<H>>>
    where
        F: FnOnce(&str) -> std::result::Result<H, StoreError>,
    {
        validate(constraints, self.schema.key())?;
        self.select(Operation::Get, constraints, Some(1), prepare)
    }

    /// Statement deleting one row by primary key
    pub fn delete<F>(&self, prepare: F) -> Result<Arc<PreparedQuery<H>>>
    where
        F: FnOnce(&str) -> std::result::Result<H, StoreError>,
    {
        let columns: Vec<&str> = self.schema.key().columns().collect();
        let key = cache_key(Operation::Delete, [], None);
        self.cache
            .get_or_prepare(&key, &columns, || plan_delete(&self.schema), prepare)
    }

    /// Statement counting all rows
    pub fn count<F>(&self, prepare: F) -> Result<Arc<PreparedQuery<H>>>
    where
        F: FnOnce(&str) -> std::result::Result<H, StoreError>,
    {
        let key = cache_key(Operation::Count, [], None);
        self.cache
            .get_or_prepare(&key, &[], || plan_count(&self.schema), prepare)
    }

    /// Statement inserting `columns` in the order given
    pub fn save<F>(&self, columns: &[&str], prepare: F) -> Result<Arc<PreparedQuery<H>>>
    where
        F: FnOnce(&str) -> std::result::Result<H, StoreError>,
    {
        let key = cache_key(Operation::Save, columns.iter().copied(), None);
        self.cache
            .get_or_prepare(&key, columns, || plan_save(&self.schema, columns), prepare)
    }

    fn select<F>(
        &self,
        op: Operation,
        constraints: &ConstraintSet,
        limit: Option<usize>,
        prepare: F,
    ) -> Result<Arc<PreparedQuery<H>>>
    where
        F: FnOnce(&str) -> std::result::Result<H, StoreError>,
    {
        let limit = limit.filter(|n| *n > 0);
        let names = constraints.sorted_names();
        let key = cache_key(op, names.iter().copied(), limit);
        self.cache.get_or_prepare(
            &key,
            &names,
            || plan_select(op, &self.schema, constraints, limit),
            prepare,
        )
    }
}
