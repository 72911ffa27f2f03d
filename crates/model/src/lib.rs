//! Data model for keyline
//!
//! This crate defines the foundational types used throughout the system:
//! - Value: Unified value enum for application and storage values
//! - Timestamp: Microsecond-precision instant used by `timestamp` fields
//! - FieldType / FieldDef: Declared semantic types of table columns
//! - TableSchema / KeySchema: Immutable table mapping with its composite key
//! - codec: Per-type encode/decode rules (the codec registry)
//! - Record: Typed row built through the codec registry
//! - Row: Raw row returned by a store client
//! - Error: Error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod error;
pub mod field;
pub mod json;
pub mod record;
pub mod row;
pub mod schema;
pub mod timestamp;
pub mod value;

pub use error::{Error, KeyViolation, Result, StoreError};
pub use field::{ElementType, FieldDef, FieldType};
pub use record::{Record, RecordIter};
pub use row::Row;
pub use schema::{KeySchema, TableSchema, TableSchemaBuilder};
pub use timestamp::{Timestamp, TimestampParseError};
pub use value::Value;
