//! Bounded retry around transient store errors
//!
//! Retrying is a client concern, not a table concern: [`RetryingClient`]
//! wraps any [`StoreClient`] and is itself a `StoreClient`, so a table
//! opts in by being built over the wrapper. Key violations and codec
//! errors never reach this layer; only [`StoreError`]s do, and only the
//! transient ones are retried.

use crate::client::{ExecuteOptions, StoreClient};
use keyline_model::{StoreError, Value};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, warn};

// ============================================================================
// Retry Configuration
// ============================================================================

/// Configuration for store retry behavior
///
/// # Example
/// ```
/// use keyline_mapper::RetryConfig;
///
/// let config = RetryConfig::new()
///     .with_max_retries(5)
///     .with_base_delay_ms(10)
///     .with_max_delay_ms(200);
/// assert_eq!(config.max_retries, 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (0 = no retries)
    pub max_retries: usize,
    /// Base delay between retries in milliseconds (exponential backoff)
    pub base_delay_ms: u64,
    /// Maximum delay between retries in milliseconds
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 10,
            max_delay_ms: 100,
        }
    }
}

impl RetryConfig {
    /// Create a new RetryConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a RetryConfig with no retries
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Set maximum number of retries
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set base delay for exponential backoff
    pub fn with_base_delay_ms(mut self, base_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self
    }

    /// Set maximum delay between retries
    pub fn with_max_delay_ms(mut self, max_delay_ms: u64) -> Self {
        self.max_delay_ms = max_delay_ms;
        self
    }

    /// Calculate delay for a given attempt (exponential backoff)
    pub(crate) fn calculate_delay(&self, attempt: usize) -> Duration {
        // Cap the shift to prevent overflow (1 << 63 is the max for u64)
        let shift = attempt.min(63);
        let multiplier = 1u64 << shift;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier);
        Duration::from_millis(delay_ms.min(self.max_delay_ms))
    }
}

// ============================================================================
// RetryingClient
// ============================================================================

/// A [`StoreClient`] that retries transient failures of the wrapped client
#[derive(Debug, Clone)]
pub struct RetryingClient<C> {
    inner: C,
    config: RetryConfig,
}

impl<C: StoreClient> RetryingClient<C> {
    /// Wrap `inner` with the given backoff
    pub fn new(inner: C, config: RetryConfig) -> Self {
        RetryingClient { inner, config }
    }

    /// The wrapped client
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Backoff in use
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    fn with_retry<T, F>(&self, op: &'static str, mut f: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Result<T, StoreError>,
    {
        let max = self.config.max_retries;
        let mut attempt = 0;
        loop {
            match f() {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < max => {
                    let delay = self.config.calculate_delay(attempt);
                    attempt += 1;
                    warn!(
                        target: "keyline::retry",
                        op,
                        attempt,
                        max,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient store error, retrying"
                    );
                    std::thread::sleep(delay);
                }
                Err(e) => {
                    if e.is_transient() {
                        error!(target: "keyline::retry", op, attempts = attempt + 1, error = %e, "Retries exhausted");
                    }
                    return Err(e);
                }
            }
        }
    }
}

impl<C: StoreClient> StoreClient for RetryingClient<C> {
    type Statement = C::Statement;
    type Rows = C::Rows;

    fn prepare(&self, query: &str) -> Result<Self::Statement, StoreError> {
        self.with_retry("prepare", || self.inner.prepare(query))
    }

    fn execute(
        &self,
        statement: &Self::Statement,
        values: &[Value],
        options: &ExecuteOptions,
    ) -> Result<Self::Rows, StoreError> {
        self.with_retry("execute", || self.inner.execute(statement, values, options))
    }

    fn execute_unprepared(
        &self,
        query: &str,
        options: &ExecuteOptions,
    ) -> Result<Self::Rows, StoreError> {
        self.with_retry("execute", || self.inner.execute_unprepared(query, options))
    }
}
