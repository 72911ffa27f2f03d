//! Error types for keyline
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Errors fall in three groups:
//! - coercion errors (`Decode`, `Encode`, `UnknownField`) raised by the codec
//!   registry and records
//! - key violations, raised before any store call is attempted
//! - store errors, passed through unmodified from the store client

use thiserror::Error;

/// Result type alias for keyline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for keyline
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A stored value could not be decoded for its declared type
    #[error("decode error on field '{field}' ({field_type}): {reason}")]
    Decode {
        /// Field being decoded
        field: String,
        /// Declared semantic type of the field
        field_type: String,
        /// What went wrong
        reason: String,
    },

    /// An application value does not fit its declared type
    #[error("encode error on field '{field}' ({field_type}): {reason}")]
    Encode {
        /// Field being encoded
        field: String,
        /// Declared semantic type of the field
        field_type: String,
        /// What went wrong
        reason: String,
    },

    /// Field name is not declared on the table
    #[error("unknown field: {field}")]
    UnknownField {
        /// The undeclared name
        field: String,
    },

    /// Constraint set is not a legal primary-key prefix
    #[error(transparent)]
    Violation(#[from] KeyViolation),

    /// Error raised by the store client
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Schema declaration is inconsistent
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether this error is a constraint-shape violation
    pub fn is_violation(&self) -> bool {
        matches!(self, Error::Violation(_))
    }

    /// Get the key violation, if this is one
    pub fn violation(&self) -> Option<&KeyViolation> {
        match self {
            Error::Violation(v) => Some(v),
            _ => None,
        }
    }
}

/// Constraint-shape violations against a table's primary key
///
/// Each variant names the offending field(s) so callers can correct the
/// query shape. Violations are never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyViolation {
    /// More constrained fields than the primary key has components
    #[error("too many keys requested ({}): the primary key has {max} components", .fields.join(", "))]
    TooManyKeys {
        /// Every requested field, in caller order
        fields: Vec<String>,
        /// Number of primary-key components
        max: usize,
    },

    /// A partition-key component is not constrained
    #[error("missing partition key: {} required", .fields.join(", "))]
    MissingPartitionKey {
        /// Partition-key components absent from the constraint set
        fields: Vec<String>,
    },

    /// A constrained field is not part of the primary key
    #[error("unknown primary key: {}", .fields.join(", "))]
    UnknownPrimaryKey {
        /// Constrained fields outside the primary key
        fields: Vec<String>,
    },

    /// A clustering key is constrained while an earlier one is open
    #[error("missing clustering key: {} required before '{constrained}' (order matters)", .fields.join(", "))]
    MissingClusteringKey {
        /// Open clustering components preceding `constrained`
        fields: Vec<String>,
        /// The last constrained clustering component
        constrained: String,
    },
}

impl KeyViolation {
    /// Get a stable reason code
    pub fn reason_code(&self) -> &'static str {
        match self {
            KeyViolation::TooManyKeys { .. } => "too_many_keys",
            KeyViolation::MissingPartitionKey { .. } => "missing_partition_key",
            KeyViolation::UnknownPrimaryKey { .. } => "unknown_primary_key",
            KeyViolation::MissingClusteringKey { .. } => "missing_clustering_key",
        }
    }

    /// Field names this violation is about
    pub fn fields(&self) -> &[String] {
        match self {
            KeyViolation::TooManyKeys { fields, .. }
            | KeyViolation::MissingPartitionKey { fields }
            | KeyViolation::UnknownPrimaryKey { fields }
            | KeyViolation::MissingClusteringKey { fields, .. } => fields,
        }
    }
}

/// Errors surfaced by a store client
///
/// Keyline never wraps or retries these; they reach the caller as
/// [`Error::Store`]. The retry layer in the mapper crate uses
/// [`StoreError::is_transient`] to decide what it may retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Connection or I/O failure
    #[error("connectivity error: {0}")]
    Connectivity(String),

    /// No coordinator node could be reached
    #[error("no hosts available: {0}")]
    NoHostsAvailable(String),

    /// Request did not complete before its deadline
    #[error("timeout: {0}")]
    Timeout(String),

    /// Cluster is shedding load
    #[error("overloaded: {0}")]
    Overload(String),

    /// Statement failed while executing
    #[error("execution error: {0}")]
    Execution(String),

    /// Server-side failure
    #[error("server error: {0}")]
    Server(String),

    /// Driver-internal failure
    #[error("internal error: {0}")]
    Internal(String),

    /// Statement rejected (syntax, unknown table, bad bind count)
    #[error("invalid statement: {0}")]
    Invalid(String),
}

impl StoreError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        !matches!(self, StoreError::Invalid(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_decode() {
        let err = Error::Decode {
            field: "payload".to_string(),
            field_type: "json".to_string(),
            reason: "expected value at line 1 column 1".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("payload"));
        assert!(msg.contains("json"));
    }

    #[test]
    fn test_violation_names_fields() {
        let v = KeyViolation::MissingClusteringKey {
            fields: vec!["c1".to_string()],
            constrained: "c2".to_string(),
        };
        let msg = v.to_string();
        assert!(msg.contains("c1"));
        assert!(msg.contains("c2"));
        assert_eq!(v.reason_code(), "missing_clustering_key");
        assert_eq!(v.fields(), &["c1".to_string()]);
    }

    #[test]
    fn test_violation_converts_into_error() {
        let err: Error = KeyViolation::UnknownPrimaryKey {
            fields: vec!["x".to_string()],
        }
        .into();
        assert!(err.is_violation());
        assert!(matches!(
            err.violation(),
            Some(KeyViolation::UnknownPrimaryKey { .. })
        ));
    }

    #[test]
    fn test_store_error_passes_through() {
        let err: Error = StoreError::Timeout("read timed out".to_string()).into();
        assert_eq!(err.to_string(), "timeout: read timed out");
        assert!(matches!(err, Error::Store(StoreError::Timeout(_))));
    }

    #[test]
    fn test_store_error_transience() {
        assert!(StoreError::Timeout(String::new()).is_transient());
        assert!(StoreError::NoHostsAvailable(String::new()).is_transient());
        assert!(StoreError::Execution(String::new()).is_transient());
        assert!(StoreError::Internal(String::new()).is_transient());
        assert!(!StoreError::Invalid(String::new()).is_transient());
    }
}
