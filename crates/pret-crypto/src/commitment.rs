//! # Commitments
//!
//! ## Algorithm
//!
//! Domain-separated SHA-256:
//! - Commit: `SHA256(0x00 || n || e_0 || ... || e_{n-1})` where `n` is the
//!   element count as one byte and each `e_i` is 8 bytes big-endian. Inputs
//!   longer than the arity cap are sliced, never expanded.
//! - Combine: `SHA256(0x01 || left || right)`.
//!
//! The element count is part of the transcript, so `[0]` and `[0, 0]` do
//! not collide.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use pret_core::encoding::{encode_attributes, encode_record, EncodedVector, FieldElement};
use pret_core::{ComplianceRecord, FieldSlot, MAX_RECORD_ARITY};

use crate::error::CryptoError;

const LEAF_TAG: u8 = 0x00;
const NODE_TAG: u8 = 0x01;

/// A 32-byte commitment.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Commitment([u8; 32]);

impl Commitment {
    /// Wrap raw digest bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex, 64 characters.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Parse 64 hex characters.
    pub fn from_hex(hex: &str) -> Result<Self, CryptoError> {
        let hex = hex.trim();
        if hex.len() != 64 || !hex.is_ascii() {
            return Err(CryptoError::InvalidEncoding(format!(
                "expected 64 hex chars, got {}",
                hex.len()
            )));
        }
        let mut out = [0u8; 32];
        for (i, byte) in out.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[2 * i..2 * i + 2], 16)
                .map_err(|e| CryptoError::InvalidEncoding(format!("invalid hex at {i}: {e}")))?;
        }
        Ok(Self(out))
    }
}

impl std::fmt::Debug for Commitment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Commitment({})", self.to_hex())
    }
}

impl std::fmt::Display for Commitment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl TryFrom<String> for Commitment {
    type Error = CryptoError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s)
    }
}

impl From<Commitment> for String {
    fn from(c: Commitment) -> String {
        c.to_hex()
    }
}

/// Commit to at most [`MAX_RECORD_ARITY`] field elements.
pub fn commit(inputs: &[FieldElement]) -> Commitment {
    let bounded = &inputs[..inputs.len().min(MAX_RECORD_ARITY)];
    let mut hasher = Sha256::new();
    hasher.update([LEAF_TAG]);
    // Bounded by MAX_RECORD_ARITY, so the count always fits one byte.
    hasher.update([bounded.len() as u8]);
    for element in bounded {
        hasher.update(element.to_be_bytes());
    }
    Commitment(hasher.finalize().into())
}

/// Combine two commitments into a parent commitment. Order matters.
pub fn combine(left: &Commitment, right: &Commitment) -> Commitment {
    let mut hasher = Sha256::new();
    hasher.update([NODE_TAG]);
    hasher.update(left.0);
    hasher.update(right.0);
    Commitment(hasher.finalize().into())
}

/// Leaf commitment for one slot: the slot number followed by its lanes.
pub fn commit_slot(slot: FieldSlot, vector: &EncodedVector) -> Commitment {
    let mut inputs = Vec::with_capacity(1 + vector.len());
    inputs.push(FieldElement::from(slot.index()));
    inputs.extend_from_slice(vector.lanes());
    commit(&inputs)
}

/// Index-addressable commitment over slot-keyed vectors.
///
/// Leaves are folded in ascending slot order. An empty map commits to the
/// empty input list.
pub fn commit_slots(vectors: &BTreeMap<FieldSlot, EncodedVector>) -> Commitment {
    let leaves: Vec<Commitment> = vectors
        .iter()
        .map(|(slot, vector)| commit_slot(*slot, vector))
        .collect();
    crate::tree::fold_root(&leaves)
}

/// Commitment to a whole record: its envelope fields combined with its
/// slot commitment.
pub fn commit_record(record: &ComplianceRecord) -> Commitment {
    let envelope = commit(encode_record(record).as_slice());
    let attributes = commit_slots(&encode_attributes(record));
    combine(&envelope, &attributes)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn commit_never_expands(values in prop::collection::vec(any::<u32>(), 0..40)) {
            let elements: Vec<FieldElement> = values.into_iter().map(FieldElement::from).collect();
            let cut = elements.len().min(MAX_RECORD_ARITY);
            prop_assert_eq!(commit(&elements), commit(&elements[..cut]));
        }
    }
}
