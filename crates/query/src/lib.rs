//! Query planning for keyline
//!
//! This crate turns caller-supplied key constraints into prepared
//! statements:
//! - ConstraintSet: insertion-ordered field → value constraints
//! - validation: legality of a constraint set against a composite key
//! - planner: canonical cache keys and statement text per operation
//! - cache: the per-table statement cache of prepared handles
//!
//! Nothing here talks to a store. Preparation is delegated to a closure
//! supplied by the caller, so the planner is generic over the driver's
//! prepared-statement handle type.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod constraint;
pub mod planner;
pub mod validation;

pub use cache::{PreparedQuery, StatementCache};
pub use constraint::ConstraintSet;
pub use planner::{cache_key, Operation, QueryPlan, QueryPlanner};
pub use validation::validate;
