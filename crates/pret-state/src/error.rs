//! Error types for aggregate state transitions.

use thiserror::Error;

use crate::aggregate::AggregateState;

/// The caller's observed state no longer matches the stored state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{operation} rejected: expected {expected}, stored state is {actual}")]
pub struct StateConflictError {
    /// The transition that was attempted.
    pub operation: &'static str,
    /// What the caller said it observed.
    pub expected: String,
    /// What is actually stored. Re-read this before retrying.
    pub actual: AggregateState,
}

/// Error in an aggregate state transition.
#[derive(Error, Debug)]
pub enum StateError {
    /// Optimistic precondition failed.
    #[error(transparent)]
    Conflict(#[from] StateConflictError),

    /// The proof backing a `verify` transition did not verify.
    #[error("proof rejected: {0}")]
    ProofRejected(String),

    /// A counter would overflow.
    #[error("counter {counter} would overflow")]
    CounterOverflow {
        /// Counter name.
        counter: &'static str,
    },

    /// The durable store failed.
    #[error("state storage error: {0}")]
    Storage(String),

    /// Persisted state could not be decoded.
    #[error("state serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StateError {
    /// True for optimistic-concurrency conflicts.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}
