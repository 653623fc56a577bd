//! # Proof Public Output
//!
//! The only facts a compliance proof discloses: whether the predicate held,
//! and when the verification was performed.

use serde::{Deserialize, Serialize};

/// Public output of a compliance proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicOutput {
    /// Whether every clause of the predicate held.
    pub is_compliant: bool,
    /// Verification time in Unix epoch seconds.
    pub verification_timestamp: u64,
}

/// A proof that can check itself and report its public output.
///
/// The aggregate state machine only accepts transitions backed by a value
/// of this trait whose `verify()` succeeds. Implementations bind the proof
/// to the verification key it must be checked against.
pub trait VerifiableClaim {
    /// Check the proof. Must be deterministic.
    fn verify(&self) -> bool;

    /// The public output carried by the proof.
    fn public_output(&self) -> PublicOutput;
}
