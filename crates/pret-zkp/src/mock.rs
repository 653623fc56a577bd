//! # Mock Proof System
//!
//! A deterministic, transparent proof system for offline use and tests.
//! Produces SHA-256-based "proofs" that are verifiable but provide **no
//! zero-knowledge guarantees**.
//!
//! ## How It Works
//!
//! - `setup(key_ref)` derives a key secret `SHA256("pret-mock-key/v1" || key_ref)`.
//!   Proving and verifying keys share it.
//! - `prove()` evaluates the predicate over the witness and returns
//!   `SHA256(secret || canonical(statement))`, where the statement holds the
//!   key reference, predicate name, commitment and public output.
//! - `verify()` recomputes the digest and checks equality.
//!
//! Changing the key reference changes the secret, so proofs from an earlier
//! deployment fail against the current one.

use serde_json::json;
use sha2::{Digest, Sha256};

use pret_core::{CanonicalBytes, PublicOutput, MAX_RECORD_ARITY};

use crate::circuit::ComplianceCircuit;
use crate::traits::{ComplianceProof, ProofError, ProofSystem, VerifyError};

const SYSTEM_NAME: &str = "mock-sha256";
const KEY_DOMAIN: &[u8] = b"pret-mock-key/v1";

/// Mock proving key.
#[derive(Debug, Clone)]
pub struct MockProvingKey {
    key_ref: String,
    secret: [u8; 32],
}

/// Mock verifying key. Carries the same secret as the proving key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockVerifyingKey {
    key_ref: String,
    secret: [u8; 32],
}

impl MockVerifyingKey {
    pub fn key_ref(&self) -> &str {
        &self.key_ref
    }
}

/// Deterministic mock backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockProofSystem;

impl MockProofSystem {
    fn digest(
        secret: &[u8; 32],
        key_ref: &str,
        predicate: &str,
        commitment: &str,
        output: &PublicOutput,
    ) -> Result<String, ProofError> {
        let statement = json!({
            "key_ref": key_ref,
            "predicate": predicate,
            "commitment": commitment,
            "public_output": output,
        });
        let canonical = CanonicalBytes::new(&statement)
            .map_err(|e| ProofError::GenerationFailed(e.to_string()))?;
        let mut hasher = Sha256::new();
        hasher.update(secret);
        hasher.update(canonical.as_bytes());
        Ok(hasher
            .finalize()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect())
    }
}

impl ProofSystem for MockProofSystem {
    type ProvingKey = MockProvingKey;
    type VerifyingKey = MockVerifyingKey;

    fn name(&self) -> &'static str {
        SYSTEM_NAME
    }

    fn setup(&self, key_ref: &str) -> Result<(MockProvingKey, MockVerifyingKey), ProofError> {
        let key_ref = key_ref.trim();
        if key_ref.is_empty() {
            return Err(ProofError::InvalidInputs(
                "verification key reference is empty".into(),
            ));
        }
        let mut hasher = Sha256::new();
        hasher.update(KEY_DOMAIN);
        hasher.update(key_ref.as_bytes());
        let secret: [u8; 32] = hasher.finalize().into();
        Ok((
            MockProvingKey {
                key_ref: key_ref.to_string(),
                secret,
            },
            MockVerifyingKey {
                key_ref: key_ref.to_string(),
                secret,
            },
        ))
    }

    fn prove(
        &self,
        pk: &MockProvingKey,
        circuit: &ComplianceCircuit,
    ) -> Result<ComplianceProof, ProofError> {
        if circuit.inputs.len() > MAX_RECORD_ARITY {
            return Err(ProofError::InvalidInputs(format!(
                "{} inputs exceed arity {MAX_RECORD_ARITY}",
                circuit.inputs.len()
            )));
        }
        if circuit.predicate.clauses().is_empty() {
            return Err(ProofError::InvalidInputs("predicate has no clauses".into()));
        }

        let evaluation = circuit.evaluate();
        let public_output = PublicOutput {
            is_compliant: evaluation.is_compliant(),
            verification_timestamp: circuit.verification_timestamp,
        };
        let commitment_hex = circuit.commitment.to_hex();
        let bytes = Self::digest(
            &pk.secret,
            &pk.key_ref,
            circuit.predicate.name(),
            &commitment_hex,
            &public_output,
        )?;

        Ok(ComplianceProof {
            system: SYSTEM_NAME.to_string(),
            key_ref: pk.key_ref.clone(),
            predicate: circuit.predicate.name().to_string(),
            commitment: circuit.commitment,
            public_output,
            bytes,
        })
    }

    fn verify(&self, vk: &MockVerifyingKey, proof: &ComplianceProof) -> Result<bool, VerifyError> {
        if proof.system != SYSTEM_NAME {
            return Err(VerifyError::MalformedProof(format!(
                "proof from backend {:?}, expected {SYSTEM_NAME:?}",
                proof.system
            )));
        }
        if proof.bytes.len() != 64 || !proof.bytes.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(VerifyError::MalformedProof(
                "proof bytes must be 64 hex chars".into(),
            ));
        }
        if proof.key_ref != vk.key_ref {
            return Err(VerifyError::KeyMismatch {
                proof_key: proof.key_ref.clone(),
                verifier_key: vk.key_ref.clone(),
            });
        }
        let expected = Self::digest(
            &vk.secret,
            &vk.key_ref,
            &proof.predicate,
            &proof.commitment.to_hex(),
            &proof.public_output,
        )
        .map_err(|e| VerifyError::MalformedProof(e.to_string()))?;
        Ok(expected == proof.bytes.to_ascii_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::CompliancePredicate;
    use crate::traits::BoundProof;
    use pret_core::{ComplianceRecord, EntityKey, FieldSlot, RecordKind, Timestamp, VerifiableClaim};

    fn circuit(status: &str) -> ComplianceCircuit {
        let at = Timestamp::parse("2026-01-15T12:00:00Z").unwrap();
        let record = ComplianceRecord::new(
            EntityKey::new("506700GE1G29325QX363").unwrap(),
            RecordKind::Gleif,
            at,
        )
        .with_attribute(FieldSlot::ENTITY_STATUS, status)
        .with_attribute(FieldSlot::REGISTRATION_STATUS, "ISSUED");
        ComplianceCircuit::for_record(&record, CompliancePredicate::gleif_active(), at)
    }

    #[test]
    fn test_prove_and_verify() {
        let sys = MockProofSystem;
        let (pk, vk) = sys.setup("vk-testnet-1").unwrap();
        let proof = sys.prove(&pk, &circuit("ACTIVE")).unwrap();
        assert_eq!(proof.bytes.len(), 64);
        assert!(proof.public_output.is_compliant);
        assert_eq!(proof.public_output.verification_timestamp, 1_768_478_400);
        assert!(sys.verify(&vk, &proof).unwrap());
    }

    #[test]
    fn test_non_compliant_outcome_is_still_a_valid_proof() {
        let sys = MockProofSystem;
        let (pk, vk) = sys.setup("vk-testnet-1").unwrap();
        let proof = sys.prove(&pk, &circuit("INACTIVE")).unwrap();
        assert!(!proof.public_output.is_compliant);
        assert!(sys.verify(&vk, &proof).unwrap());
    }

    #[test]
    fn test_prove_is_deterministic() {
        let sys = MockProofSystem;
        let (pk, _) = sys.setup("vk").unwrap();
        assert_eq!(
            sys.prove(&pk, &circuit("ACTIVE")).unwrap(),
            sys.prove(&pk, &circuit("ACTIVE")).unwrap()
        );
    }

    #[test]
    fn test_tampered_output_fails() {
        let sys = MockProofSystem;
        let (pk, vk) = sys.setup("vk").unwrap();
        let mut proof = sys.prove(&pk, &circuit("INACTIVE")).unwrap();
        proof.public_output.is_compliant = true;
        assert!(!sys.verify(&vk, &proof).unwrap());
    }

    #[test]
    fn test_stale_key_rejected() {
        let sys = MockProofSystem;
        let (old_pk, _) = sys.setup("vk-deploy-1").unwrap();
        let (_, new_vk) = sys.setup("vk-deploy-2").unwrap();
        let proof = sys.prove(&old_pk, &circuit("ACTIVE")).unwrap();
        assert!(matches!(
            sys.verify(&new_vk, &proof),
            Err(VerifyError::KeyMismatch { .. })
        ));
        assert!(!BoundProof::new(&sys, &new_vk, &proof).verify());
    }

    #[test]
    fn test_relabelled_key_ref_fails() {
        let sys = MockProofSystem;
        let (old_pk, _) = sys.setup("vk-deploy-1").unwrap();
        let (_, new_vk) = sys.setup("vk-deploy-2").unwrap();
        let mut proof = sys.prove(&old_pk, &circuit("ACTIVE")).unwrap();
        proof.key_ref = "vk-deploy-2".into();
        assert!(!sys.verify(&new_vk, &proof).unwrap());
    }

    #[test]
    fn test_empty_key_ref_rejected() {
        assert!(matches!(
            MockProofSystem.setup("  "),
            Err(ProofError::InvalidInputs(_))
        ));
    }

    #[test]
    fn test_malformed_bytes() {
        let sys = MockProofSystem;
        let (pk, vk) = sys.setup("vk").unwrap();
        let mut proof = sys.prove(&pk, &circuit("ACTIVE")).unwrap();
        proof.bytes = "xyz".into();
        assert!(matches!(
            sys.verify(&vk, &proof),
            Err(VerifyError::MalformedProof(_))
        ));
    }

    #[test]
    fn test_bound_proof_exposes_output() {
        let sys = MockProofSystem;
        let (pk, vk) = sys.setup("vk").unwrap();
        let proof = sys.prove(&pk, &circuit("ACTIVE")).unwrap();
        let bound = BoundProof::new(&sys, &vk, &proof);
        assert!(bound.verify());
        assert_eq!(bound.public_output(), proof.public_output);
    }
}
