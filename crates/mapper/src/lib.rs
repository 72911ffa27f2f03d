//! Table gateway for keyline
//!
//! This crate executes planned statements against an external store:
//! - StoreClient: the seam to the cluster connection and protocol driver
//! - Table: get / find / save / delete / count for one mapped table
//! - RetryingClient: opt-in bounded retry around transient store errors
//! - ddl: schema statements derived from a table schema
//! - MapperConfig: settings loaded from `keyline.toml`
//! - testing: an in-memory store for tests

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod ddl;
pub mod retry;
pub mod table;
pub mod testing;

pub use client::{ExecuteOptions, StoreClient};
pub use config::{MapperConfig, CONFIG_FILE_NAME};
pub use ddl::KeyspaceOptions;
pub use retry::{RetryConfig, RetryingClient};
pub use table::{FindOptions, Records, RequestOptions, SaveOptions, Table};
