//! Shared fixtures for table gateway tests

#![allow(dead_code)]

use keyline_mapper::testing::MemoryStore;
use keyline_mapper::Table;
use keyline_model::TableSchema;
use std::sync::Arc;

/// Table keyed by a single partition key
pub fn single_key_schema() -> TableSchema {
    TableSchema::builder("model_test")
        .keyspace("keyline_test")
        .key_field("uuid_field", "text")
        .field("text_field", "text")
        .field("int_field", "int")
        .field("double_field", "double")
        .field("boolean_field", "boolean")
        .field("timestamp_field", "timestamp")
        .field("list_field", "list<JSON>")
        .field("set_field", "set<JSON>")
        .field("set_text_field", "set<TEXT>")
        .field("map_field", "map<JSON, JSON>")
        .field("map_text_field", "map<TEXT, TEXT>")
        .field("scratch", "ignored")
        .build()
        .expect("valid schema")
}

/// Table with one partition key and one clustering key
pub fn multi_key_schema() -> TableSchema {
    TableSchema::builder("multi_key_model_test")
        .keyspace("keyline_test")
        .field("uuid_field", "text")
        .field("another_uuid_field", "text")
        .field("text_field", "text")
        .field("int_field", "int")
        .field("set_field", "set<JSON>")
        .primary_key(["uuid_field"], ["another_uuid_field"])
        .build()
        .expect("valid schema")
}

/// A created table over a fresh in-memory store
pub fn table(schema: TableSchema) -> (Arc<MemoryStore>, Table<Arc<MemoryStore>>) {
    let store = Arc::new(MemoryStore::new());
    let table = Table::new(Arc::clone(&store), schema);
    table.create_table(true).expect("create table");
    store.clear_log();
    (store, table)
}

/// Install a test-friendly tracing subscriber once
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}
