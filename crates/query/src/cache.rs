//! Statement cache
//!
//! One cache exists per table mapping. Entries are keyed by the canonical
//! cache key of a query shape and hold the driver's prepared handle along
//! with the bind order fixed when the statement was first prepared.
//!
//! # Thread Safety
//!
//! The map is a `DashMap`. Preparation runs outside any shard lock; the
//! first entry inserted for a key wins and racing preparers adopt it, so
//! every caller of a key sees the same handle and bind order.
//!
//! Entries are never evicted; the cache lives as long as its table.

use crate::constraint::ConstraintSet;
use crate::planner::QueryPlan;
use dashmap::DashMap;
use keyline_model::{Result, StoreError, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// A prepared statement with its fixed bind order
#[derive(Debug)]
pub struct PreparedQuery<H> {
    cache_key: String,
    text: String,
    bind_columns: Vec<String>,
    handle: H,
}

impl<H> PreparedQuery<H> {
    /// Canonical cache key
    pub fn cache_key(&self) -> &str {
        &self.cache_key
    }

    /// Statement text submitted to the driver
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Column bound at each placeholder, in placeholder order
    pub fn bind_columns(&self) -> &[String] {
        &self.bind_columns
    }

    /// Driver handle
    pub fn handle(&self) -> &H {
        &self.handle
    }

    /// Bind values from `constraints` in this statement's placeholder order
    ///
    /// Unconstrained columns bind as `Null`.
    pub fn bind(&self, constraints: &ConstraintSet) -> Vec<Value> {
        self.bind_columns
            .iter()
            .map(|column| constraints.get(column).cloned().unwrap_or(Value::Null))
            .collect()
    }

    /// Bind one value per placeholder, produced by `value_for(column)`
    pub fn bind_with<F>(&self, mut value_for: F) -> Result<Vec<Value>>
    where
        F: FnMut(&str) -> Result<Value>,
    {
        self.bind_columns
            .iter()
            .map(|column| value_for(column))
            .collect()
    }
}

/// Lazily populated map from cache key to prepared statement
#[derive(Debug)]
pub struct StatementCache<H> {
    entries: DashMap<String, Arc<PreparedQuery<H>>>,
}

impl<H> Default for StatementCache<H> {
    fn default() -> Self {
        StatementCache {
            entries: DashMap::new(),
        }
    }
}

impl<H> StatementCache<H> {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached statements
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been prepared yet
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached entry for `cache_key`, if any
    pub fn get(&self, cache_key: &str) -> Option<Arc<PreparedQuery<H>>> {
        self.entries.get(cache_key).map(|entry| Arc::clone(entry.value()))
    }

    /// Return the statement for `cache_key`, preparing it on a miss
    ///
    /// `columns` is the column set the caller will bind. `plan` builds the
    /// statement and runs only on a miss. `prepare` submits the text to the
    /// driver; its error is returned unchanged and nothing is cached.
    ///
    /// A cached entry whose bind columns differ from `columns` is a key
    /// collision between two shapes; the statement is then prepared without
    /// being cached.
    pub fn get_or_prepare<P, F>(
        &self,
        cache_key: &str,
        columns: &[&str],
        plan: P,
        prepare: F,
    ) -> Result<Arc<PreparedQuery<H>>>
    where
        P: FnOnce() -> QueryPlan,
        F: FnOnce(&str) -> std::result::Result<H, StoreError>,
    {
        if let Some(entry) = self.get(cache_key) {
            if same_columns(entry.bind_columns(), columns) {
                trace!(target: "keyline::query", cache_key, "Statement cache hit");
                return Ok(entry);
            }
            warn!(
                target: "keyline::query",
                cache_key,
                cached = ?entry.bind_columns(),
                requested = ?columns,
                "Cache key collision, preparing uncached statement"
            );
            let plan = plan();
            let handle = prepare(&plan.text)?;
            return Ok(Arc::new(PreparedQuery::from_plan(plan, handle)));
        }

        let plan = plan();
        debug!(target: "keyline::query", cache_key, text = %plan.text, "Preparing statement");
        let handle = prepare(&plan.text)?;
        let prepared = Arc::new(PreparedQuery::from_plan(plan, handle));

        // First insert wins; a racing preparer adopts the stored entry
        let entry = self
            .entries
            .entry(cache_key.to_string())
            .or_insert(prepared);
        Ok(Arc::clone(entry.value()))
    }
}

impl<H> PreparedQuery<H> {
    fn from_plan(plan: QueryPlan, handle: H) -> Self {
        PreparedQuery {
            cache_key: plan.cache_key,
            text: plan.text,
            bind_columns: plan.bind_columns,
            handle,
        }
    }
}

fn same_columns(cached: &[String], requested: &[&str]) -> bool {
    if cached.len() != requested.len() {
        return false;
    }
    let cached: HashSet<&str> = cached.iter().map(String::as_str).collect();
    requested.iter().all(|c| cached.contains(c))
}
