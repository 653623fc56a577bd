//! # Compliance Circuit
//!
//! The statement handed to a proving backend: "the record committed to by
//! `commitment` satisfies `predicate` at `verification_timestamp`".
//!
//! Public: commitment, timestamp, predicate. Private: the bounded envelope
//! fields and the slot-keyed attributes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use pret_core::{encode_record, BoundedFields, ComplianceRecord, FieldSlot, Timestamp};
use pret_crypto::{commit_record, Commitment};

use crate::predicate::{CompliancePredicate, PredicateEvaluation};

/// A compliance statement with its witness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceCircuit {
    /// Record commitment (public).
    pub commitment: Commitment,
    /// Verification time in epoch seconds (public).
    pub verification_timestamp: u64,
    /// Predicate being proved (public).
    pub predicate: CompliancePredicate,
    /// Encoded envelope fields (private).
    pub inputs: BoundedFields,
    /// Attribute witness (private).
    pub attributes: BTreeMap<FieldSlot, String>,
}

impl ComplianceCircuit {
    /// Build the circuit for `record` at time `at`.
    pub fn for_record(
        record: &ComplianceRecord,
        predicate: CompliancePredicate,
        at: Timestamp,
    ) -> Self {
        Self {
            commitment: commit_record(record),
            verification_timestamp: at.epoch_secs_unsigned(),
            predicate,
            inputs: encode_record(record),
            attributes: record.attributes().clone(),
        }
    }

    /// Evaluate the predicate over the witness.
    ///
    /// Dates compare against the circuit's own timestamp, never the wall
    /// clock, so the outcome is a pure function of the circuit.
    pub fn evaluate(&self) -> PredicateEvaluation {
        let at = i64::try_from(self.verification_timestamp)
            .ok()
            .and_then(|secs| Timestamp::from_epoch_secs(secs).ok());
        match at {
            Some(at) => self.predicate.evaluate(&self.attributes, at),
            None => PredicateEvaluation {
                satisfied: 0,
                total: self.predicate.clauses().len(),
                failed: vec!["verification timestamp out of range".into()],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pret_core::{EntityKey, RecordKind};

    #[test]
    fn test_circuit_binds_record_and_time() {
        let at = Timestamp::parse("2026-02-01T00:00:00Z").unwrap();
        let record = ComplianceRecord::new(
            EntityKey::new("L72900MH1995PLC084781").unwrap(),
            RecordKind::CorporateRegistration,
            at,
        )
        .with_attribute(FieldSlot::COMPANY_STATUS, "Active")
        .with_attribute(FieldSlot::DATE_OF_INCORPORATION, "19/01/1995");

        let circuit = ComplianceCircuit::for_record(
            &record,
            CompliancePredicate::corporate_registration_active(),
            at,
        );
        assert_eq!(circuit.commitment, commit_record(&record));
        assert_eq!(circuit.verification_timestamp, at.epoch_secs_unsigned());
        assert_eq!(circuit.inputs.len(), pret_core::MAX_RECORD_ARITY);
        assert!(circuit.evaluate().is_compliant());
    }
}
