//! Testing utilities for table mappings
//!
//! - **MemoryStore**: an in-memory [`StoreClient`](crate::StoreClient) that
//!   understands the statements keyline emits, with call counting and
//!   failure injection
//!
//! # Example
//!
//! ```
//! use keyline_mapper::testing::MemoryStore;
//! use keyline_mapper::Table;
//! use keyline_model::TableSchema;
//! use std::sync::Arc;
//!
//! let schema = TableSchema::builder("users")
//!     .keyspace("app")
//!     .key_field("id", "text")
//!     .field("profile", "json")
//!     .build()
//!     .unwrap();
//! let store = Arc::new(MemoryStore::new());
//! let table = Table::new(Arc::clone(&store), schema);
//! table.create_table(true).unwrap();
//! assert_eq!(table.count().unwrap(), 0);
//! ```

mod memory_store;

pub use memory_store::{ExecutedStatement, MemoryStatement, MemoryStore};
