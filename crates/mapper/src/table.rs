//! Table gateway
//!
//! [`Table`] binds one [`TableSchema`] to a [`StoreClient`] and implements
//! the record operations on top of the query planner:
//!
//! - `get` / `find` / `find_each`: validate constraints, resolve a cached
//!   statement, bind encoded constraint values, hydrate rows lazily
//! - `save` / `save_with`: upsert a record's persisted columns
//! - `delete`: remove a record by its primary-key projection
//! - `count`: number of rows
//!
//! Every operation has an options form (`find`, `save_with`, `get_with`,
//! `delete_with`, `count_with`) whose timeout overrides the table default
//! and is passed to the client in [`ExecuteOptions`].
//!
//! Store errors are returned unchanged as [`Error::Store`]. Key violations
//! are raised before the client is called.

use crate::client::{ExecuteOptions, StoreClient};
use crate::config::MapperConfig;
use crate::ddl::{self, KeyspaceOptions};
use keyline_model::codec::encode_field;
use keyline_model::{Error, Record, Result, Row, StoreError, TableSchema, Value};
use keyline_query::{ConstraintSet, PreparedQuery, QueryPlanner};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Options for `find`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FindOptions {
    /// Maximum rows; `Some(0)` is the same as `None`
    pub limit: Option<usize>,
    /// Execute timeout, overriding the table default
    pub timeout: Option<Duration>,
}

impl FindOptions {
    /// Limit the result to `n` rows
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Override the execute timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Options for `save_with`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveOptions {
    /// Write only columns whose source value is non-null
    pub exclude_nulls: bool,
    /// Execute timeout, overriding the table default
    pub timeout: Option<Duration>,
}

impl SaveOptions {
    /// Write only non-null columns
    pub fn exclude_nulls(mut self) -> Self {
        self.exclude_nulls = true;
        self
    }

    /// Override the execute timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Options for `get_with`, `delete_with` and `count_with`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Execute timeout, overriding the table default
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    /// Override the execute timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Mapping of one table over a store client
///
/// # Thread Safety
///
/// `Table<C>` is `Send + Sync` when `C` is. The statement cache is the only
/// shared mutable state.
pub struct Table<C: StoreClient> {
    client: C,
    schema: Arc<TableSchema>,
    planner: QueryPlanner<C::Statement>,
    timeout: Option<Duration>,
}

impl<C: StoreClient> Table<C> {
    /// Map `schema` over `client` with no default timeout
    pub fn new(client: C, schema: TableSchema) -> Self {
        let schema = Arc::new(schema);
        Table {
            client,
            planner: QueryPlanner::new(Arc::clone(&schema)),
            schema,
            timeout: None,
        }
    }

    /// Map `schema` over `client`, applying the configured default keyspace
    /// and timeout
    pub fn with_config(client: C, schema: TableSchema, config: &MapperConfig) -> Self {
        let schema = schema.with_default_keyspace(config.keyspace.as_deref());
        let mut table = Table::new(client, schema);
        table.timeout = config.timeout();
        table
    }

    /// Table schema
    pub fn schema(&self) -> &Arc<TableSchema> {
        &self.schema
    }

    /// Underlying client
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Number of statements prepared and cached so far
    pub fn statement_count(&self) -> usize {
        self.planner.cache().len()
    }

    /// Empty record of this table
    pub fn new_record(&self) -> Record {
        Record::new(Arc::clone(&self.schema))
    }

    /// Record of this table built from raw values
    pub fn record<I, K, V>(&self, pairs: I) -> Result<Record>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        Record::from_pairs(Arc::clone(&self.schema), pairs)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Fetch the first row matching `constraints`
    pub fn get(&self, constraints: &ConstraintSet) -> Result<Option<Record>> {
        self.get_with(constraints, RequestOptions::default())
    }

    /// [`Table::get`] with a per-call timeout
    pub fn get_with(
        &self,
        constraints: &ConstraintSet,
        options: RequestOptions,
    ) -> Result<Option<Record>> {
        let prepared = self
            .planner
            .get(constraints, |text| self.client.prepare(text))?;
        let values = self.bind_constraints(&prepared, constraints)?;
        let options = ExecuteOptions {
            limit: Some(1),
            timeout: options.timeout.or(self.timeout),
        };
        let mut rows = self.execute(&prepared, &values, &options)?;
        rows.next().transpose()
    }

    /// Rows matching `constraints`, hydrated as the iterator is consumed
    ///
    /// An empty constraint set scans the whole table.
    pub fn find(&self, constraints: &ConstraintSet, options: FindOptions) -> Result<Records<C::Rows>> {
        let limit = options.limit.filter(|n| *n > 0);
        let prepared = self
            .planner
            .find(constraints, limit, |text| self.client.prepare(text))?;
        let values = self.bind_constraints(&prepared, constraints)?;
        let options = ExecuteOptions {
            limit,
            timeout: options.timeout.or(self.timeout),
        };
        self.execute(&prepared, &values, &options)
    }

    /// Push-style [`Table::find`]; returns the number of records visited
    ///
    /// Stops at the first error.
    pub fn find_each<F>(
        &self,
        constraints: &ConstraintSet,
        options: FindOptions,
        mut f: F,
    ) -> Result<usize>
    where
        F: FnMut(Record),
    {
        let mut visited = 0;
        for record in self.find(constraints, options)? {
            f(record?);
            visited += 1;
        }
        Ok(visited)
    }

    /// Number of rows in the table
    pub fn count(&self) -> Result<u64> {
        self.count_with(RequestOptions::default())
    }

    /// [`Table::count`] with a per-call timeout
    pub fn count_with(&self, options: RequestOptions) -> Result<u64> {
        let prepared = self.planner.count(|text| self.client.prepare(text))?;
        let options = ExecuteOptions {
            limit: None,
            timeout: options.timeout.or(self.timeout),
        };
        let mut rows = self
            .client
            .execute(prepared.handle(), &[], &options)
            .map_err(Error::Store)?;
        let row = rows
            .next()
            .transpose()?
            .ok_or_else(|| StoreError::Invalid("COUNT returned no row".to_string()))?;
        match row.get("count") {
            Some(Value::Int(n)) if *n >= 0 => Ok(*n as u64),
            other => Err(StoreError::Invalid(format!("unexpected COUNT result: {:?}", other)).into()),
        }
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Upsert every persisted column of `record`
    ///
    /// Returns `false` when there was nothing to write.
    pub fn save(&self, record: &Record) -> Result<bool> {
        self.save_with(record, SaveOptions::default())
    }

    /// Upsert `record` with options
    ///
    /// With `exclude_nulls`, only columns whose source value is non-null are
    /// written, so existing values of the other columns are left alone.
    pub fn save_with(&self, record: &Record, options: SaveOptions) -> Result<bool> {
        self.check_owner(record)?;
        let columns = record.persisted_columns(options.exclude_nulls);
        if columns.is_empty() {
            debug!(target: "keyline::table", table = %self.schema.qualified_name(), "Nothing to save");
            return Ok(false);
        }

        let names: Vec<&str> = columns.iter().map(|(name, _)| name.as_str()).collect();
        let prepared = self
            .planner
            .save(&names, |text| self.client.prepare(text))?;
        let values = prepared.bind_with(|column| {
            Ok(columns
                .iter()
                .find(|(name, _)| name == column)
                .map(|(_, value)| value.clone())
                .unwrap_or(Value::Null))
        })?;
        let exec = ExecuteOptions {
            limit: None,
            timeout: options.timeout.or(self.timeout),
        };
        self.client
            .execute(prepared.handle(), &values, &exec)
            .map_err(Error::Store)?;
        Ok(true)
    }

    /// Delete the row addressed by `record`'s primary key
    pub fn delete(&self, record: &Record) -> Result<()> {
        self.delete_with(record, RequestOptions::default())
    }

    /// [`Table::delete`] with a per-call timeout
    pub fn delete_with(&self, record: &Record, options: RequestOptions) -> Result<()> {
        self.check_owner(record)?;
        let projection = record.primary_key();
        let prepared = self.planner.delete(|text| self.client.prepare(text))?;
        let values = prepared.bind_with(|column| {
            Ok(projection
                .iter()
                .find(|(name, _)| name == column)
                .map(|(_, value)| value.clone())
                .unwrap_or(Value::Null))
        })?;
        let options = ExecuteOptions {
            limit: None,
            timeout: options.timeout.or(self.timeout),
        };
        self.client
            .execute(prepared.handle(), &values, &options)
            .map_err(Error::Store)?;
        Ok(())
    }

    // ========================================================================
    // Schema
    // ========================================================================

    /// Create the table's keyspace
    pub fn create_keyspace(&self, options: &KeyspaceOptions) -> Result<()> {
        let keyspace = self.schema.keyspace().ok_or_else(|| {
            Error::InvalidSchema(format!("table '{}' has no keyspace", self.schema.table()))
        })?;
        self.run_ddl(&ddl::create_keyspace_statement(keyspace, options))
    }

    /// Create the table
    pub fn create_table(&self, if_not_exists: bool) -> Result<()> {
        self.run_ddl(&ddl::create_table_statement(&self.schema, if_not_exists))
    }

    /// Remove every row
    pub fn truncate(&self) -> Result<()> {
        self.run_ddl(&ddl::truncate_statement(&self.schema))
    }

    /// Drop the table if it exists
    pub fn drop_table(&self) -> Result<()> {
        self.run_ddl(&ddl::drop_table_statement(&self.schema))
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn run_ddl(&self, statement: &str) -> Result<()> {
        info!(target: "keyline::table", statement, "Executing schema statement");
        let options = ExecuteOptions {
            limit: None,
            timeout: self.timeout,
        };
        self.client
            .execute_unprepared(statement, &options)
            .map_err(Error::Store)?;
        Ok(())
    }

    fn execute(
        &self,
        prepared: &PreparedQuery<C::Statement>,
        values: &[Value],
        options: &ExecuteOptions,
    ) -> Result<Records<C::Rows>> {
        let rows = self
            .client
            .execute(prepared.handle(), values, options)
            .map_err(Error::Store)?;
        Ok(Records {
            rows,
            schema: Arc::clone(&self.schema),
        })
    }

    /// Constraint values in placeholder order, encoded for their fields
    fn bind_constraints(
        &self,
        prepared: &PreparedQuery<C::Statement>,
        constraints: &ConstraintSet,
    ) -> Result<Vec<Value>> {
        prepared.bind_with(|column| {
            let field = self.schema.require_field(column)?;
            let value = constraints.get(column).cloned().unwrap_or(Value::Null);
            encode_field(field, value)
        })
    }

    fn check_owner(&self, record: &Record) -> Result<()> {
        if Arc::ptr_eq(record.schema(), &self.schema)
            || record.schema().qualified_name() == self.schema.qualified_name()
        {
            return Ok(());
        }
        Err(Error::InvalidSchema(format!(
            "record of '{}' used with table '{}'",
            record.schema().qualified_name(),
            self.schema.qualified_name()
        )))
    }
}

impl<C: StoreClient + std::fmt::Debug> std::fmt::Debug for Table<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("table", &self.schema.qualified_name())
            .field("client", &self.client)
            .field("statements", &self.statement_count())
            .finish()
    }
}

/// Lazy iterator of records over a result set
///
/// Each row becomes a [`Record`] when it is pulled; field values are
/// decoded when read.
pub struct Records<R> {
    rows: R,
    schema: Arc<TableSchema>,
}

impl<R> Iterator for Records<R>
where
    R: Iterator<Item = std::result::Result<Row, StoreError>>,
{
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.rows.next()?;
        Some(
            row.map(|row| Record::from_row(Arc::clone(&self.schema), row))
                .map_err(Error::Store),
        )
    }
}
