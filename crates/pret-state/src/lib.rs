//! # pret-state — Aggregate Compliance State Machine
//!
//! A single persistent tuple `(compliant, total_verifications,
//! total_entities, last_verification_time)` that only moves when a proof
//! verifies.
//!
//! ## Transitions
//!
//! - **verify(proof, expected)**: requires `proof.verify()` and that
//!   `expected` equals the stored state. Sets the flag from the proof,
//!   increments both counters, records the proof timestamp.
//! - **reset_compliance(expected_flag)**: clears the flag.
//! - **reset_counters(expected_totals)**: zeroes the counters and the
//!   timestamp, leaves the flag alone.
//!
//! There is no terminal state.
//!
//! ## Concurrency
//!
//! Every transition is a compare-and-swap executed under the store's
//! write lock. Of several callers that observed the same prior state,
//! exactly one commits. The rest receive [`StateConflictError`] and must
//! re-read before retrying; the machine never retries on their behalf.
//!
//! Repeat verifications of the same entity each increment
//! `total_entities`. De-duplication, where wanted, belongs to the caller.

pub mod aggregate;
pub mod error;
pub mod store;

pub use aggregate::{AggregateState, AggregateStateMachine, Totals};
pub use error::{StateConflictError, StateError};
pub use store::{AggregateStore, FileAggregateStore, InMemoryAggregateStore};
