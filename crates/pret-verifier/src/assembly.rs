//! # Proof Assembly Service
//!
//! Turns a validated record and a predicate into a proof from the
//! proving backend. Key derivation and proving run on the blocking pool
//! since real backends are CPU-bound.

use std::sync::Arc;

use thiserror::Error;

use pret_core::{ComplianceRecord, EncodingError, Timestamp, MAX_RECORD_ARITY};
use pret_crypto::Commitment;
use pret_deploy::DeploymentEntry;
use pret_zkp::{
    ComplianceCircuit, ComplianceProof, CompliancePredicate, PredicateEvaluation, ProofError,
    ProofSystem, VerifyError,
};

/// Any failure while assembling or checking a proof.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProofAssemblyError {
    /// The record did not fit the bounded encoding.
    #[error("encoding failed: {0}")]
    Encoding(#[from] EncodingError),

    /// Keys could not be derived from the deployment's key reference.
    #[error("key setup failed: {0}")]
    Setup(ProofError),

    /// The backend failed to produce a proof.
    #[error(transparent)]
    Proving(ProofError),

    /// The backend could not check a proof.
    #[error(transparent)]
    Verification(#[from] VerifyError),

    /// The proof did not verify against the active key.
    #[error("proof rejected: {0}")]
    Rejected(String),

    /// The proving task was cancelled or panicked.
    #[error("proving task did not complete: {0}")]
    Interrupted(String),
}

/// A proof together with what was learned while building it.
#[derive(Debug, Clone)]
pub struct AssembledProof {
    pub proof: ComplianceProof,
    pub evaluation: PredicateEvaluation,
    pub commitment: Commitment,
}

impl AssembledProof {
    pub fn is_compliant(&self) -> bool {
        self.proof.public_output.is_compliant
    }

    /// Percentage of satisfied predicate clauses.
    pub fn compliance_score(&self) -> u8 {
        self.evaluation.score()
    }

    pub fn verification_time(&self) -> u64 {
        self.proof.public_output.verification_timestamp
    }
}

/// Builds proofs with a shared backend.
pub struct ProofAssemblyService<P> {
    system: Arc<P>,
}

impl<P> Clone for ProofAssemblyService<P> {
    fn clone(&self) -> Self {
        Self {
            system: Arc::clone(&self.system),
        }
    }
}

impl<P: ProofSystem + 'static> ProofAssemblyService<P> {
    pub fn new(system: P) -> Self {
        Self {
            system: Arc::new(system),
        }
    }

    pub fn from_shared(system: Arc<P>) -> Self {
        Self { system }
    }

    pub fn system(&self) -> &P {
        &self.system
    }

    /// Encode, commit and prove `predicate` over `record` at `at`, under the
    /// key of `deployment`.
    pub async fn assemble(
        &self,
        record: &ComplianceRecord,
        predicate: &CompliancePredicate,
        deployment: &DeploymentEntry,
        at: Timestamp,
    ) -> Result<AssembledProof, ProofAssemblyError> {
        let circuit = ComplianceCircuit::for_record(record, predicate.clone(), at);
        if circuit.inputs.len() > MAX_RECORD_ARITY {
            tracing::error!(
                entity = %record.identifier(),
                len = circuit.inputs.len(),
                "bounded encoding exceeded its arity cap"
            );
            return Err(EncodingError::ArityExceeded {
                len: circuit.inputs.len(),
                cap: MAX_RECORD_ARITY,
            }
            .into());
        }
        let evaluation = circuit.evaluate();
        let commitment = circuit.commitment;

        let system = Arc::clone(&self.system);
        let key_ref = deployment.verification_key_ref.clone();
        let proof = tokio::task::spawn_blocking(move || {
            let (pk, _) = system.setup(&key_ref).map_err(ProofAssemblyError::Setup)?;
            system
                .prove(&pk, &circuit)
                .map_err(ProofAssemblyError::Proving)
        })
        .await
        .map_err(|e| ProofAssemblyError::Interrupted(e.to_string()))??;

        tracing::debug!(
            entity = %record.identifier(),
            predicate = predicate.name(),
            commitment = %commitment,
            is_compliant = proof.public_output.is_compliant,
            "proof assembled"
        );
        Ok(AssembledProof {
            proof,
            evaluation,
            commitment,
        })
    }

    /// The verifying key for `deployment`.
    pub fn verifying_key(
        &self,
        deployment: &DeploymentEntry,
    ) -> Result<P::VerifyingKey, ProofAssemblyError> {
        self.system
            .setup(&deployment.verification_key_ref)
            .map(|(_, vk)| vk)
            .map_err(ProofAssemblyError::Setup)
    }
}
