//! Keyline - typed record mapping for wide-column stores
//!
//! Keyline maps application records onto rows of a partitioned, clustered
//! table. It coerces every field through a codec chosen by its declared
//! type, rejects queries whose constraints are not a legal primary-key
//! prefix before they reach the store, and prepares each distinct query
//! shape once.
//!
//! # Quick Start
//!
//! ```
//! use keyline::testing::MemoryStore;
//! use keyline::{ConstraintSet, Table, TableSchema, Value};
//! use std::sync::Arc;
//!
//! let schema = TableSchema::builder("users")
//!     .keyspace("app")
//!     .field("org", "text")
//!     .field("id", "text")
//!     .field("profile", "json")
//!     .primary_key(["org"], ["id"])
//!     .build()?;
//!
//! let table = Table::new(Arc::new(MemoryStore::new()), schema);
//! table.create_table(true)?;
//!
//! let user = table.record([
//!     ("org", Value::from("acme")),
//!     ("id", Value::from("u1")),
//!     ("profile", Value::object([("name", "Ada")])),
//! ])?;
//! table.save(&user)?;
//!
//! let found = table.get(&ConstraintSet::new().with("org", "acme").with("id", "u1"))?;
//! assert!(found.is_some());
//! # Ok::<(), keyline::Error>(())
//! ```
//!
//! # Architecture
//!
//! - `keyline-model`: values, field types, the codec registry, schemas and records
//! - `keyline-query`: constraint validation, query planning, the statement cache
//! - `keyline-mapper`: the store client seam, the table gateway, retry and config
//!
//! A store driver plugs in by implementing [`StoreClient`].

pub use keyline_mapper::testing;
pub use keyline_mapper::{
    ExecuteOptions, FindOptions, KeyspaceOptions, MapperConfig, Records, RequestOptions,
    RetryConfig, RetryingClient, SaveOptions, StoreClient, Table, CONFIG_FILE_NAME,
};
pub use keyline_model::codec;
pub use keyline_model::{
    ElementType, Error, FieldDef, FieldType, KeySchema, KeyViolation, Record, Result, Row,
    StoreError, TableSchema, Timestamp, Value,
};
pub use keyline_query::{ConstraintSet, Operation, PreparedQuery, QueryPlanner, StatementCache};
