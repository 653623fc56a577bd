//! # Proof System Trait
//!
//! Defines the interface to the proving capability. Backends differ in how
//! they build and check proofs; they agree on the circuit they are handed
//! and on the artifact they return.
//!
//! ## Security Invariant
//!
//! Keys come from [`ProofSystem::setup`] over a deployment's verification
//! key reference. A proof only verifies under the verifying key derived
//! from the same reference it was proved under. Verification is a pure
//! function with no side effects.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use pret_core::{PublicOutput, VerifiableClaim};
use pret_crypto::Commitment;

use crate::circuit::ComplianceCircuit;

/// Error during key setup or proof generation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProofError {
    /// The circuit inputs are invalid or missing.
    #[error("invalid circuit inputs: {0}")]
    InvalidInputs(String),
    /// Proof generation failed internally.
    #[error("proof generation failed: {0}")]
    GenerationFailed(String),
}

/// Error during proof verification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    /// The proof is structurally malformed.
    #[error("malformed proof: {0}")]
    MalformedProof(String),
    /// The proof was produced under a different key.
    #[error("key mismatch: proof bound to {proof_key}, verifier holds {verifier_key}")]
    KeyMismatch {
        /// Key reference recorded in the proof.
        proof_key: String,
        /// Key reference held by the verifier.
        verifier_key: String,
    },
}

/// The artifact every backend produces.
///
/// Everything except `bytes` is public. `bytes` is opaque to callers and
/// meaningful only to the backend named in `system`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceProof {
    /// Backend identifier.
    pub system: String,
    /// Verification key reference the proof was produced under.
    pub key_ref: String,
    /// Predicate name.
    pub predicate: String,
    /// Commitment to the record the proof speaks about.
    pub commitment: Commitment,
    /// The disclosed output.
    pub public_output: PublicOutput,
    /// Backend-specific proof bytes, hex encoded.
    pub bytes: String,
}

/// Interface to a proving backend.
pub trait ProofSystem: Send + Sync {
    /// Key used to produce proofs.
    type ProvingKey: Send + Sync;
    /// Key used to check proofs. Cheap to clone for distribution.
    type VerifyingKey: Clone + Send + Sync;

    /// Backend identifier recorded in every proof.
    fn name(&self) -> &'static str;

    /// Derive the key pair for a verification key reference.
    ///
    /// # Errors
    ///
    /// Returns [`ProofError::InvalidInputs`] if the reference is empty or not
    /// understood by this backend.
    fn setup(&self, key_ref: &str) -> Result<(Self::ProvingKey, Self::VerifyingKey), ProofError>;

    /// Evaluate the circuit's predicate and produce a proof of the outcome.
    fn prove(
        &self,
        pk: &Self::ProvingKey,
        circuit: &ComplianceCircuit,
    ) -> Result<ComplianceProof, ProofError>;

    /// Check a proof.
    ///
    /// `Ok(false)` means well-formed but invalid.
    fn verify(&self, vk: &Self::VerifyingKey, proof: &ComplianceProof) -> Result<bool, VerifyError>;
}

/// A proof paired with the backend and key that must check it.
pub struct BoundProof<'a, P: ProofSystem> {
    system: &'a P,
    vk: &'a P::VerifyingKey,
    proof: &'a ComplianceProof,
}

impl<'a, P: ProofSystem> BoundProof<'a, P> {
    pub fn new(system: &'a P, vk: &'a P::VerifyingKey, proof: &'a ComplianceProof) -> Self {
        Self { system, vk, proof }
    }

    pub fn proof(&self) -> &ComplianceProof {
        self.proof
    }
}

impl<P: ProofSystem> VerifiableClaim for BoundProof<'_, P> {
    fn verify(&self) -> bool {
        self.system.verify(self.vk, self.proof).unwrap_or(false)
    }

    fn public_output(&self) -> PublicOutput {
        self.proof.public_output
    }
}
