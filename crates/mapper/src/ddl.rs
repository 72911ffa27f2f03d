//! Schema statements for a mapped table
//!
//! Column types come from [`FieldType::store_type`]: `json` payloads are
//! stored as `text`, so `set<json>` becomes `set<text>`. Ignored fields
//! have no column.
//!
//! [`FieldType::store_type`]: keyline_model::FieldType::store_type

use keyline_model::TableSchema;
use serde::{Deserialize, Serialize};

/// Options for `CREATE KEYSPACE`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyspaceOptions {
    /// Replication map literal
    pub replication: String,
    /// Whether writes go through the commit log
    pub durable_writes: bool,
    /// Emit `IF NOT EXISTS`
    pub if_not_exists: bool,
}

impl Default for KeyspaceOptions {
    fn default() -> Self {
        KeyspaceOptions {
            replication: "{'class': 'SimpleStrategy', 'replication_factor': '1'}".to_string(),
            durable_writes: true,
            if_not_exists: false,
        }
    }
}

/// `CREATE KEYSPACE` statement
pub fn create_keyspace_statement(keyspace: &str, options: &KeyspaceOptions) -> String {
    format!(
        "CREATE KEYSPACE {}{} WITH replication = {} AND durable_writes = {};",
        if options.if_not_exists { "IF NOT EXISTS " } else { "" },
        keyspace,
        options.replication,
        options.durable_writes
    )
}

/// `CREATE TABLE` statement
///
/// A composite partition key is parenthesised: `PRIMARY KEY ((a,b),c)`.
pub fn create_table_statement(schema: &TableSchema, if_not_exists: bool) -> String {
    let mut columns: Vec<String> = schema
        .persisted_fields()
        .filter_map(|f| f.field_type().store_type().map(|ty| format!("{} {}", f.name(), ty)))
        .collect();

    let key = schema.key();
    let partition = key.partition().join(",");
    let mut key_parts = vec![if key.partition().len() > 1 {
        format!("({})", partition)
    } else {
        partition
    }];
    key_parts.extend(key.clustering().iter().cloned());
    columns.push(format!("PRIMARY KEY ({})", key_parts.join(",")));

    let mut statement = format!(
        "CREATE TABLE {}{} ({})",
        if if_not_exists { "IF NOT EXISTS " } else { "" },
        schema.qualified_name(),
        columns.join(", ")
    );
    if !schema.properties().is_empty() {
        statement.push_str(" WITH ");
        statement.push_str(&schema.properties().join(" AND "));
    }
    statement.push(';');
    statement
}

/// `TRUNCATE` statement
pub fn truncate_statement(schema: &TableSchema) -> String {
    format!("TRUNCATE {};", schema.qualified_name())
}

/// `DROP TABLE IF EXISTS` statement
pub fn drop_table_statement(schema: &TableSchema) -> String {
    format!("DROP TABLE IF EXISTS {};", schema.qualified_name())
}
