//! Error types for the searchable map.
//!
//! Absent keys are never errors: lookups return `None` and removals of
//! missing keys are no-ops. Errors are reserved for invalid arguments and for
//! structural checks on the tree.

use thiserror::Error;

/// Errors raised by [`SearchableMap`](crate::SearchableMap) and
/// [`RadixTree`](crate::RadixTree).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// A fuzzy search was requested with a negative edit distance.
    #[error("maximum edit distance must be non-negative, got {0}")]
    NegativeEditDistance(i64),

    /// The radix tree violates one of its structural invariants.
    #[error("corrupt radix tree: {0}")]
    CorruptTree(String),
}

/// Result alias used throughout the crate.
pub type Result<T, E = SearchError> = core::result::Result<T, E>;
