//! In-memory store client
//!
//! Supports exactly the statement dialect produced by the planner and the
//! DDL helpers:
//!
//! - `SELECT * FROM t [WHERE a = ? AND ...] [LIMIT n];`
//! - `SELECT COUNT(*) FROM t;`
//! - `INSERT INTO t (a,b) VALUES (?,?);` with upsert semantics
//! - `DELETE FROM t WHERE a = ? AND ...;`
//! - `CREATE KEYSPACE`, `CREATE TABLE`, `TRUNCATE`, `DROP TABLE`
//!
//! Tables must be created before use; the primary key is learned from the
//! `PRIMARY KEY (...)` clause. Rows are returned in insertion order.
//! Writing `Null` to a column removes it, as a tombstone would.

use crate::client::{ExecuteOptions, StoreClient};
use keyline_model::{Row, StoreError, Value};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ============================================================================
// Statement parsing
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Select {
        table: String,
        filters: Vec<String>,
        limit: Option<usize>,
    },
    Count {
        table: String,
    },
    Insert {
        table: String,
        columns: Vec<String>,
    },
    Delete {
        table: String,
        filters: Vec<String>,
    },
    CreateKeyspace {
        keyspace: String,
        if_not_exists: bool,
    },
    CreateTable {
        table: String,
        key: Vec<String>,
        if_not_exists: bool,
    },
    Truncate {
        table: String,
    },
    DropTable {
        table: String,
        if_exists: bool,
    },
}

impl Command {
    fn placeholders(&self) -> usize {
        match self {
            Command::Select { filters, .. } | Command::Delete { filters, .. } => filters.len(),
            Command::Insert { columns, .. } => columns.len(),
            _ => 0,
        }
    }
}

fn invalid(msg: impl Into<String>) -> StoreError {
    StoreError::Invalid(msg.into())
}

fn parse(text: &str) -> Result<Command, StoreError> {
    let stmt = text.trim().trim_end_matches(';').trim();

    if let Some(rest) = stmt.strip_prefix("SELECT COUNT(*) FROM ") {
        return Ok(Command::Count {
            table: rest.trim().to_string(),
        });
    }
    if let Some(rest) = stmt.strip_prefix("SELECT * FROM ") {
        return parse_select(rest);
    }
    if let Some(rest) = stmt.strip_prefix("INSERT INTO ") {
        return parse_insert(rest);
    }
    if let Some(rest) = stmt.strip_prefix("DELETE FROM ") {
        let (table, clause) = rest
            .split_once(" WHERE ")
            .ok_or_else(|| invalid("DELETE requires a WHERE clause"))?;
        return Ok(Command::Delete {
            table: table.trim().to_string(),
            filters: parse_filters(clause)?,
        });
    }
    if let Some(rest) = stmt.strip_prefix("CREATE KEYSPACE ") {
        let (if_not_exists, rest) = strip_flag(rest, "IF NOT EXISTS ");
        let (keyspace, _) = rest
            .split_once(" WITH ")
            .ok_or_else(|| invalid("CREATE KEYSPACE requires WITH replication"))?;
        return Ok(Command::CreateKeyspace {
            keyspace: keyspace.trim().to_string(),
            if_not_exists,
        });
    }
    if let Some(rest) = stmt.strip_prefix("CREATE TABLE ") {
        let (if_not_exists, rest) = strip_flag(rest, "IF NOT EXISTS ");
        let (table, body) = rest
            .split_once(" (")
            .ok_or_else(|| invalid("CREATE TABLE requires a column list"))?;
        return Ok(Command::CreateTable {
            table: table.trim().to_string(),
            key: parse_primary_key(body)?,
            if_not_exists,
        });
    }
    if let Some(rest) = stmt.strip_prefix("TRUNCATE ") {
        return Ok(Command::Truncate {
            table: rest.trim().to_string(),
        });
    }
    if let Some(rest) = stmt.strip_prefix("DROP TABLE ") {
        let (if_exists, rest) = strip_flag(rest, "IF EXISTS ");
        return Ok(Command::DropTable {
            table: rest.trim().to_string(),
            if_exists,
        });
    }

    Err(invalid(format!("unsupported statement: {}", text)))
}

fn strip_flag<'a>(s: &'a str, flag: &str) -> (bool, &'a str) {
    match s.strip_prefix(flag) {
        Some(rest) => (true, rest),
        None => (false, s),
    }
}

fn parse_select(rest: &str) -> Result<Command, StoreError> {
    let (rest, limit) = match rest.rsplit_once(" LIMIT ") {
        Some((head, n)) => {
            let n: usize = n
                .trim()
                .parse()
                .map_err(|_| invalid(format!("bad LIMIT: {}", n)))?;
            (head, Some(n))
        }
        None => (rest, None),
    };
    let (table, filters) = match rest.split_once(" WHERE ") {
        Some((table, clause)) => (table, parse_filters(clause)?),
        None => (rest, Vec::new()),
    };
    Ok(Command::Select {
        table: table.trim().to_string(),
        filters,
        limit,
    })
}

fn parse_filters(clause: &str) -> Result<Vec<String>, StoreError> {
    clause
        .split(" AND ")
        .map(|fragment| {
            fragment
                .trim()
                .strip_suffix(" = ?")
                .map(|column| column.trim().to_string())
                .ok_or_else(|| invalid(format!("unsupported relation: {}", fragment)))
        })
        .collect()
}

fn parse_insert(rest: &str) -> Result<Command, StoreError> {
    let (table, rest) = rest
        .split_once(" (")
        .ok_or_else(|| invalid("INSERT requires a column list"))?;
    let (columns, placeholders) = rest
        .split_once(") VALUES (")
        .ok_or_else(|| invalid("INSERT requires VALUES"))?;
    let columns: Vec<String> = columns.split(',').map(|c| c.trim().to_string()).collect();
    let placeholders = placeholders.trim_end_matches(')').split(',').count();
    if placeholders != columns.len() {
        return Err(invalid(format!(
            "{} columns but {} values",
            columns.len(),
            placeholders
        )));
    }
    Ok(Command::Insert {
        table: table.trim().to_string(),
        columns,
    })
}

/// Key columns from `... PRIMARY KEY ((a,b),c))`, partition keys first
fn parse_primary_key(body: &str) -> Result<Vec<String>, StoreError> {
    let start = body
        .find("PRIMARY KEY (")
        .ok_or_else(|| invalid("CREATE TABLE requires a PRIMARY KEY"))?
        + "PRIMARY KEY (".len();
    let mut depth = 1;
    let mut end = None;
    for (i, ch) in body[start..].char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    end = Some(start + i);
                    break;
                }
            }
            _ => {}
        }
    }
    let end = end.ok_or_else(|| invalid("unbalanced PRIMARY KEY clause"))?;
    Ok(body[start..end]
        .split(|c: char| c == ',' || c == '(' || c == ')')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect())
}

// ============================================================================
// MemoryStore
// ============================================================================

/// Prepared statement handle of [`MemoryStore`]
#[derive(Debug, Clone)]
pub struct MemoryStatement {
    text: Arc<str>,
    command: Arc<Command>,
}

impl MemoryStatement {
    /// Statement text as prepared
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// One executed statement, as seen by the store
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedStatement {
    /// Statement text
    pub text: String,
    /// Bound values, in placeholder order
    pub values: Vec<Value>,
    /// Options passed with the call
    pub options: ExecuteOptions,
}

#[derive(Debug, Default)]
struct MemTable {
    key: Vec<String>,
    rows: Vec<HashMap<String, Value>>,
}

impl MemTable {
    fn matches(row: &HashMap<String, Value>, filters: &[String], values: &[Value]) -> bool {
        filters
            .iter()
            .zip(values)
            .all(|(column, value)| row.get(column).unwrap_or(&Value::Null) == value)
    }
}

#[derive(Debug, Default)]
struct State {
    keyspaces: Vec<String>,
    tables: HashMap<String, MemTable>,
    executed: Vec<ExecutedStatement>,
    fail_execute: VecDeque<StoreError>,
    fail_prepare: VecDeque<StoreError>,
}

/// In-memory [`StoreClient`] for tests
///
/// Counts `prepare` calls, records every executed statement with its bound
/// values, and can be told to fail upcoming calls.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    prepares: AtomicUsize,
}

impl MemoryStore {
    /// Empty store with no keyspaces or tables
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `prepare` calls
    pub fn prepare_count(&self) -> usize {
        self.prepares.load(Ordering::SeqCst)
    }

    /// Every executed statement, oldest first
    pub fn executed(&self) -> Vec<ExecutedStatement> {
        self.state.lock().executed.clone()
    }

    /// Most recently executed statement
    pub fn last_executed(&self) -> Option<ExecutedStatement> {
        self.state.lock().executed.last().cloned()
    }

    /// Forget the execution log
    pub fn clear_log(&self) {
        self.state.lock().executed.clear();
    }

    /// Fail the next `execute` (or unprepared execute) with `error`
    ///
    /// Calls queue up: `n` calls fail the next `n` executions.
    pub fn fail_next_execute(&self, error: StoreError) {
        self.state.lock().fail_execute.push_back(error);
    }

    /// Fail the next `prepare` with `error`
    pub fn fail_next_prepare(&self, error: StoreError) {
        self.state.lock().fail_prepare.push_back(error);
    }

    /// Keyspaces created so far
    pub fn keyspaces(&self) -> Vec<String> {
        self.state.lock().keyspaces.clone()
    }

    /// Whether `table` (qualified name) exists
    pub fn has_table(&self, table: &str) -> bool {
        self.state.lock().tables.contains_key(table)
    }

    /// Stored rows of `table`, in insertion order
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.state
            .lock()
            .tables
            .get(table)
            .map(|t| {
                t.rows
                    .iter()
                    .map(|r| r.iter().map(|(k, v)| (k.as_str(), v.clone())).collect())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn run(
        &self,
        text: &str,
        command: &Command,
        values: &[Value],
        options: &ExecuteOptions,
    ) -> Result<Vec<Row>, StoreError> {
        let mut state = self.state.lock();
        if let Some(err) = state.fail_execute.pop_front() {
            return Err(err);
        }
        if values.len() != command.placeholders() {
            return Err(invalid(format!(
                "expected {} bind values, got {}",
                command.placeholders(),
                values.len()
            )));
        }
        state.executed.push(ExecutedStatement {
            text: text.to_string(),
            values: values.to_vec(),
            options: *options,
        });

        match command {
            Command::Select {
                table,
                filters,
                limit,
            } => {
                let t = table_ref(&state.tables, table)?;
                let cap = match (*limit, options.limit) {
                    (Some(a), Some(b)) => a.min(b),
                    (a, b) => a.or(b).unwrap_or(usize::MAX),
                };
                Ok(t.rows
                    .iter()
                    .filter(|row| MemTable::matches(row, filters, values))
                    .take(cap)
                    .map(|row| row.iter().map(|(k, v)| (k.as_str(), v.clone())).collect())
                    .collect())
            }
            Command::Count { table } => {
                let t = table_ref(&state.tables, table)?;
                Ok(vec![Row::new().with("count", t.rows.len() as i64)])
            }
            Command::Insert { table, columns } => {
                let t = table_mut(&mut state.tables, table)?;
                upsert(t, columns, values)?;
                Ok(Vec::new())
            }
            Command::Delete { table, filters } => {
                let t = table_mut(&mut state.tables, table)?;
                t.rows.retain(|row| !MemTable::matches(row, filters, values));
                Ok(Vec::new())
            }
            Command::CreateKeyspace {
                keyspace,
                if_not_exists,
            } => {
                if state.keyspaces.contains(keyspace) {
                    if *if_not_exists {
                        return Ok(Vec::new());
                    }
                    return Err(invalid(format!("keyspace {} already exists", keyspace)));
                }
                state.keyspaces.push(keyspace.clone());
                Ok(Vec::new())
            }
            Command::CreateTable {
                table,
                key,
                if_not_exists,
            } => {
                if state.tables.contains_key(table) {
                    if *if_not_exists {
                        return Ok(Vec::new());
                    }
                    return Err(invalid(format!("table {} already exists", table)));
                }
                state.tables.insert(
                    table.clone(),
                    MemTable {
                        key: key.clone(),
                        rows: Vec::new(),
                    },
                );
                Ok(Vec::new())
            }
            Command::Truncate { table } => {
                table_mut(&mut state.tables, table)?.rows.clear();
                Ok(Vec::new())
            }
            Command::DropTable { table, if_exists } => {
                if state.tables.remove(table).is_none() && !*if_exists {
                    return Err(invalid(format!("unconfigured table {}", table)));
                }
                Ok(Vec::new())
            }
        }
    }
}

fn table_ref<'a>(
    tables: &'a HashMap<String, MemTable>,
    table: &str,
) -> Result<&'a MemTable, StoreError> {
    tables
        .get(table)
        .ok_or_else(|| invalid(format!("unconfigured table {}", table)))
}

fn table_mut<'a>(
    tables: &'a mut HashMap<String, MemTable>,
    table: &str,
) -> Result<&'a mut MemTable, StoreError> {
    tables
        .get_mut(table)
        .ok_or_else(|| invalid(format!("unconfigured table {}", table)))
}

fn upsert(table: &mut MemTable, columns: &[String], values: &[Value]) -> Result<(), StoreError> {
    let assigned: HashMap<&str, &Value> = columns
        .iter()
        .map(String::as_str)
        .zip(values.iter())
        .collect();

    let mut key_values = Vec::with_capacity(table.key.len());
    for column in &table.key {
        match assigned.get(column.as_str()) {
            Some(value) if !value.is_null() => key_values.push((column.clone(), (*value).clone())),
            _ => {
                return Err(invalid(format!(
                    "missing value for primary key column {}",
                    column
                )))
            }
        }
    }

    let existing = table.rows.iter().position(|row| {
        key_values
            .iter()
            .all(|(column, value)| row.get(column) == Some(value))
    });
    let idx = match existing {
        Some(idx) => idx,
        None => {
            table.rows.push(HashMap::new());
            table.rows.len() - 1
        }
    };
    let row = &mut table.rows[idx];

    for (column, value) in assigned {
        if value.is_null() {
            row.remove(column);
        } else {
            row.insert(column.to_string(), value.clone());
        }
    }
    Ok(())
}

impl StoreClient for MemoryStore {
    type Statement = MemoryStatement;
    type Rows = std::vec::IntoIter<Result<Row, StoreError>>;

    fn prepare(&self, query: &str) -> Result<Self::Statement, StoreError> {
        if let Some(err) = self.state.lock().fail_prepare.pop_front() {
            return Err(err);
        }
        let command = parse(query)?;
        self.prepares.fetch_add(1, Ordering::SeqCst);
        Ok(MemoryStatement {
            text: Arc::from(query),
            command: Arc::new(command),
        })
    }

    fn execute(
        &self,
        statement: &Self::Statement,
        values: &[Value],
        options: &ExecuteOptions,
    ) -> Result<Self::Rows, StoreError> {
        let rows = self.run(&statement.text, &statement.command, values, options)?;
        Ok(rows.into_iter().map(Ok).collect::<Vec<_>>().into_iter())
    }

    fn execute_unprepared(
        &self,
        query: &str,
        options: &ExecuteOptions,
    ) -> Result<Self::Rows, StoreError> {
        let command = parse(query)?;
        let rows = self.run(query, &command, &[], options)?;
        Ok(rows.into_iter().map(Ok).collect::<Vec<_>>().into_iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_table() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .execute_unprepared(
                "CREATE TABLE ks.t (p text, c text, v int, PRIMARY KEY (p,c));",
                &ExecuteOptions::default(),
            )
            .unwrap();
        store
    }

    #[test]
    fn test_parse_primary_key_shapes() {
        assert_eq!(
            parse_primary_key("a text, PRIMARY KEY ((a,b),c))").unwrap(),
            vec!["a", "b", "c"]
        );
        assert_eq!(
            parse_primary_key("a text, PRIMARY KEY (a))").unwrap(),
            vec!["a"]
        );
    }

    #[test]
    fn test_parse_select() {
        assert_eq!(
            parse("SELECT * FROM ks.t WHERE p = ? AND c = ? LIMIT 3;").unwrap(),
            Command::Select {
                table: "ks.t".into(),
                filters: vec!["p".into(), "c".into()],
                limit: Some(3),
            }
        );
        assert!(parse("SELECT * FROM ks.t WHERE p > ?;").is_err());
        assert!(parse("UPDATE ks.t SET v = 1;").is_err());
    }

    #[test]
    fn test_upsert_and_tombstone() {
        let store = store_with_table();
        let insert = store.prepare("INSERT INTO ks.t (p,c,v) VALUES (?,?,?);").unwrap();
        let opts = ExecuteOptions::default();
        store
            .execute(&insert, &["a".into(), "x".into(), Value::Int(1)], &opts)
            .unwrap();
        store
            .execute(&insert, &["a".into(), "x".into(), Value::Null], &opts)
            .unwrap();

        let rows = store.rows("ks.t");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("v"), None);
        assert_eq!(rows[0].get("p"), Some(&Value::from("a")));
    }

    #[test]
    fn test_insert_requires_key() {
        let store = store_with_table();
        let insert = store.prepare("INSERT INTO ks.t (p,v) VALUES (?,?);").unwrap();
        let err = store
            .execute(&insert, &["a".into(), Value::Int(1)], &ExecuteOptions::default())
            .unwrap_err();
        assert!(matches!(err, StoreError::Invalid(_)));
    }

    #[test]
    fn test_unknown_table() {
        let store = MemoryStore::new();
        let select = store.prepare("SELECT * FROM ks.nope;").unwrap();
        assert!(store
            .execute(&select, &[], &ExecuteOptions::default())
            .is_err());
    }

    #[test]
    fn test_failure_injection() {
        let store = store_with_table();
        store.fail_next_prepare(StoreError::NoHostsAvailable("down".into()));
        assert!(store.prepare("SELECT COUNT(*) FROM ks.t;").is_err());
        let count = store.prepare("SELECT COUNT(*) FROM ks.t;").unwrap();
        assert_eq!(store.prepare_count(), 1);

        store.fail_next_execute(StoreError::Timeout("slow".into()));
        assert!(store.execute(&count, &[], &ExecuteOptions::default()).is_err());
        let mut rows = store.execute(&count, &[], &ExecuteOptions::default()).unwrap();
        assert_eq!(rows.next().unwrap().unwrap().get("count"), Some(&Value::Int(0)));
    }
}
