//! Store client seam
//!
//! keyline never speaks a wire protocol. Everything it needs from the
//! cluster connection is captured by [`StoreClient`]: prepare a statement,
//! execute a prepared statement with bind values, and run an unprepared
//! statement for schema changes.

use keyline_model::{Row, StoreError, Value};
use std::sync::Arc;
use std::time::Duration;

/// Per-call execution options passed through to the driver
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecuteOptions {
    /// Maximum number of rows the caller will consume
    pub limit: Option<usize>,
    /// Request timeout
    pub timeout: Option<Duration>,
}

/// A connection to a wide-column store
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; a table mapping shares one client
/// across every caller.
pub trait StoreClient: Send + Sync {
    /// Opaque prepared-statement handle
    type Statement: Clone + Send + Sync;

    /// Result set; rows are produced as the iterator is consumed
    type Rows: Iterator<Item = Result<Row, StoreError>>;

    /// Prepare statement text
    fn prepare(&self, query: &str) -> Result<Self::Statement, StoreError>;

    /// Execute a prepared statement with one value per placeholder
    fn execute(
        &self,
        statement: &Self::Statement,
        values: &[Value],
        options: &ExecuteOptions,
    ) -> Result<Self::Rows, StoreError>;

    /// Execute statement text without preparing it (schema changes)
    fn execute_unprepared(
        &self,
        query: &str,
        options: &ExecuteOptions,
    ) -> Result<Self::Rows, StoreError>;
}

impl<C: StoreClient + ?Sized> StoreClient for Arc<C> {
    type Statement = C::Statement;
    type Rows = C::Rows;

    fn prepare(&self, query: &str) -> Result<Self::Statement, StoreError> {
        (**self).prepare(query)
    }

    fn execute(
        &self,
        statement: &Self::Statement,
        values: &[Value],
        options: &ExecuteOptions,
    ) -> Result<Self::Rows, StoreError> {
        (**self).execute(statement, values, options)
    }

    fn execute_unprepared(
        &self,
        query: &str,
        options: &ExecuteOptions,
    ) -> Result<Self::Rows, StoreError> {
        (**self).execute_unprepared(query, options)
    }
}
