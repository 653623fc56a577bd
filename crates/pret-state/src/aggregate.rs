//! # Aggregate State
//!
//! The state tuple, its pure transition functions, and the machine that
//! applies them through a compare-and-swap store.

use serde::{Deserialize, Serialize};

use pret_core::{PublicOutput, VerifiableClaim};

use crate::error::{StateConflictError, StateError};
use crate::store::AggregateStore;

/// Persistent aggregate compliance state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AggregateState {
    /// Outcome of the most recent accepted proof.
    pub compliant: bool,
    /// Accepted proofs since the last counter reset.
    pub total_verifications: u64,
    /// Entities verified since the last counter reset. Not de-duplicated.
    pub total_entities: u64,
    /// Timestamp of the most recent accepted proof, epoch seconds.
    pub last_verification_time: u64,
}

/// The counter part of the state, used as the guard for `reset_counters`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Totals {
    pub total_verifications: u64,
    pub total_entities: u64,
    pub last_verification_time: u64,
}

impl AggregateState {
    /// `(false, 0, 0, 0)`.
    pub const INITIAL: Self = Self {
        compliant: false,
        total_verifications: 0,
        total_entities: 0,
        last_verification_time: 0,
    };

    /// Build a state from its four components.
    pub fn new(
        compliant: bool,
        total_verifications: u64,
        total_entities: u64,
        last_verification_time: u64,
    ) -> Self {
        Self {
            compliant,
            total_verifications,
            total_entities,
            last_verification_time,
        }
    }

    /// The counter components.
    pub fn totals(&self) -> Totals {
        Totals {
            total_verifications: self.total_verifications,
            total_entities: self.total_entities,
            last_verification_time: self.last_verification_time,
        }
    }

    /// State after accepting a proof with `output`.
    pub fn after_verification(&self, output: &PublicOutput) -> Result<Self, StateError> {
        Ok(Self {
            compliant: output.is_compliant,
            total_verifications: self
                .total_verifications
                .checked_add(1)
                .ok_or(StateError::CounterOverflow {
                    counter: "total_verifications",
                })?,
            total_entities: self
                .total_entities
                .checked_add(1)
                .ok_or(StateError::CounterOverflow {
                    counter: "total_entities",
                })?,
            last_verification_time: output.verification_timestamp,
        })
    }

    /// State with the compliance flag cleared.
    pub fn with_compliance_reset(&self) -> Self {
        Self {
            compliant: false,
            ..*self
        }
    }

    /// State with counters and timestamp zeroed, flag kept.
    pub fn with_counters_reset(&self) -> Self {
        Self {
            compliant: self.compliant,
            ..Self::INITIAL
        }
    }
}

impl std::fmt::Display for AggregateState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.compliant,
            self.total_verifications,
            self.total_entities,
            self.last_verification_time
        )
    }
}

impl std::fmt::Display for Totals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "(_, {}, {}, {})",
            self.total_verifications, self.total_entities, self.last_verification_time
        )
    }
}

// ─── State machine ──────────────────────────────────────────────────

/// Applies guarded transitions to a store.
#[derive(Debug)]
pub struct AggregateStateMachine<S> {
    store: S,
}

impl<S: AggregateStore> AggregateStateMachine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read the stored state.
    pub fn current(&self) -> Result<AggregateState, StateError> {
        self.store.load()
    }

    /// Record a verified proof.
    ///
    /// Rejected with no effect when the proof fails to verify or when
    /// `expected` is not the stored state.
    pub fn verify<C: VerifiableClaim + ?Sized>(
        &self,
        proof: &C,
        expected: &AggregateState,
    ) -> Result<AggregateState, StateError> {
        if !proof.verify() {
            tracing::warn!(
                expected = %expected,
                "verify transition rejected: proof did not verify"
            );
            return Err(StateError::ProofRejected(
                "proof failed verification against the active key".into(),
            ));
        }
        let output = proof.public_output();
        let expected = *expected;
        self.commit("verify", |current| {
            if *current != expected {
                return Err(StateConflictError {
                    operation: "verify",
                    expected: expected.to_string(),
                    actual: *current,
                }
                .into());
            }
            current.after_verification(&output)
        })
    }

    /// Clear the compliance flag if it still equals `expected_flag`.
    pub fn reset_compliance(&self, expected_flag: bool) -> Result<AggregateState, StateError> {
        self.commit("reset_compliance", |current| {
            if current.compliant != expected_flag {
                return Err(StateConflictError {
                    operation: "reset_compliance",
                    expected: format!("compliant = {expected_flag}"),
                    actual: *current,
                }
                .into());
            }
            Ok(current.with_compliance_reset())
        })
    }

    /// Zero the counters if they still equal `expected`.
    pub fn reset_counters(&self, expected: &Totals) -> Result<AggregateState, StateError> {
        let expected = *expected;
        self.commit("reset_counters", |current| {
            if current.totals() != expected {
                return Err(StateConflictError {
                    operation: "reset_counters",
                    expected: expected.to_string(),
                    actual: *current,
                }
                .into());
            }
            Ok(current.with_counters_reset())
        })
    }

    fn commit(
        &self,
        operation: &'static str,
        f: impl FnOnce(&AggregateState) -> Result<AggregateState, StateError>,
    ) -> Result<AggregateState, StateError> {
        match self.store.try_update(f) {
            Ok(next) => {
                tracing::info!(operation, state = %next, "aggregate state committed");
                Ok(next)
            }
            Err(StateError::Conflict(conflict)) => {
                metrics::counter!("pret_state_conflicts_total", "operation" => operation)
                    .increment(1);
                tracing::debug!(operation, actual = %conflict.actual, "aggregate state conflict");
                Err(StateError::Conflict(conflict))
            }
            Err(other) => Err(other),
        }
    }
}
