//! # Constrained Field Encoder
//!
//! Turns variable-length text into fixed-arity numeric vectors that are safe
//! inputs for the commitment hash and the proving backend.
//!
//! ## Encoding Policy
//!
//! `encode(text)` is total and deterministic:
//!
//! 1. Truncate to at most `max_len` characters (default and ceiling 32).
//! 2. Map each character to its code point. Anything above 127 becomes
//!    [`SENTINEL`], so every byte stays 7-bit.
//! 3. Zero-pad the byte buffer to 32 bytes.
//! 4. Pack the buffer big-endian into [`VECTOR_WIDTH`] lanes of 4 bytes.
//!
//! The result is always exactly 8 lanes. Truncation and sentinel
//! substitution are lossy and are not errors. Every lane is below 2^31 and
//! therefore inside the field.
//!
//! ## Record Layout
//!
//! `encode_record` selects lanes from each record attribute in priority
//! order (identifier, timestamp, kind, content, actor), each capped by its
//! quota, until [`MAX_RECORD_ARITY`] elements are taken. Absent attributes
//! still occupy their zero lanes so every element keeps a fixed position.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::EncodingError;
use crate::field_index::FieldSlot;
use crate::record::ComplianceRecord;

/// Number of lanes in an [`EncodedVector`].
pub const VECTOR_WIDTH: usize = 8;

/// Bytes packed into each lane.
pub const BYTES_PER_LANE: usize = 4;

/// Default (and maximum) number of characters retained by [`encode`].
pub const DEFAULT_MAX_LEN: usize = VECTOR_WIDTH * BYTES_PER_LANE;

/// Replacement byte for characters outside 7-bit ASCII.
pub const SENTINEL: u8 = b'?';

/// Arity cap for commitment inputs.
pub const MAX_RECORD_ARITY: usize = 16;

/// Order of the prime field the proving backend works over (2^64 - 2^32 + 1).
pub const FIELD_MODULUS: u64 = 0xffff_ffff_0000_0001;

/// Record attributes in encoding priority order, with their lane quotas.
const RECORD_LAYOUT: [(RecordAttribute, usize); 5] = [
    (RecordAttribute::Identifier, 6),
    (RecordAttribute::Timestamp, 1),
    (RecordAttribute::Kind, 1),
    (RecordAttribute::Content, 6),
    (RecordAttribute::Actor, 2),
];

#[derive(Debug, Clone, Copy)]
enum RecordAttribute {
    Identifier,
    Timestamp,
    Kind,
    Content,
    Actor,
}

// ─── Field elements ─────────────────────────────────────────────────

/// A canonical element of the proving field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldElement(u64);

impl FieldElement {
    /// The zero element.
    pub const ZERO: Self = Self(0);

    /// A field element from a canonical representative. `None` if
    /// `value >= FIELD_MODULUS`.
    pub fn new(value: u64) -> Option<Self> {
        (value < FIELD_MODULUS).then_some(Self(value))
    }

    /// Reduce an arbitrary `u64` into the field.
    pub fn reduce(value: u64) -> Self {
        Self(value % FIELD_MODULUS)
    }

    /// The canonical representative.
    pub fn value(self) -> u64 {
        self.0
    }

    /// Big-endian bytes of the representative.
    pub fn to_be_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl From<u32> for FieldElement {
    fn from(v: u32) -> Self {
        Self(u64::from(v))
    }
}

impl From<u8> for FieldElement {
    fn from(v: u8) -> Self {
        Self(u64::from(v))
    }
}

// ─── Encoded vectors ────────────────────────────────────────────────

/// Exactly [`VECTOR_WIDTH`] field elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EncodedVector([FieldElement; VECTOR_WIDTH]);

impl EncodedVector {
    /// The lanes.
    pub fn lanes(&self) -> &[FieldElement; VECTOR_WIDTH] {
        &self.0
    }

    /// Always [`VECTOR_WIDTH`].
    pub fn len(&self) -> usize {
        VECTOR_WIDTH
    }

    /// Never true; present for API symmetry with slices.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Unpack the lanes back into the 32-byte sanitized buffer.
    pub fn to_bytes(&self) -> [u8; DEFAULT_MAX_LEN] {
        let mut out = [0u8; DEFAULT_MAX_LEN];
        for (lane, chunk) in self.0.iter().zip(out.chunks_mut(BYTES_PER_LANE)) {
            let bytes = lane.0.to_be_bytes();
            chunk.copy_from_slice(&bytes[8 - BYTES_PER_LANE..]);
        }
        out
    }
}

impl std::ops::Index<usize> for EncodedVector {
    type Output = FieldElement;

    fn index(&self, idx: usize) -> &FieldElement {
        &self.0[idx]
    }
}

/// Encode text with the default 32-character limit.
pub fn encode(text: &str) -> EncodedVector {
    encode_with_limit(text, DEFAULT_MAX_LEN)
}

/// Encode text keeping at most `max_len` characters.
///
/// A `max_len` above [`DEFAULT_MAX_LEN`] is clamped, since the vector has
/// no room for more.
pub fn encode_with_limit(text: &str, max_len: usize) -> EncodedVector {
    let limit = max_len.min(DEFAULT_MAX_LEN);
    let mut buf = [0u8; DEFAULT_MAX_LEN];
    for (slot, ch) in buf.iter_mut().zip(text.chars().take(limit)) {
        *slot = sanitize(ch);
    }

    let mut lanes = [FieldElement::ZERO; VECTOR_WIDTH];
    for (lane, chunk) in lanes.iter_mut().zip(buf.chunks(BYTES_PER_LANE)) {
        let mut word = [0u8; BYTES_PER_LANE];
        word.copy_from_slice(chunk);
        *lane = FieldElement::from(u32::from_be_bytes(word));
    }
    EncodedVector(lanes)
}

fn sanitize(ch: char) -> u8 {
    u8::try_from(u32::from(ch))
        .ok()
        .filter(|b| b.is_ascii())
        .unwrap_or(SENTINEL)
}

// ─── Bounded field lists ────────────────────────────────────────────

/// A list of at most [`MAX_RECORD_ARITY`] field elements.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<FieldElement>", into = "Vec<FieldElement>")]
pub struct BoundedFields(Vec<FieldElement>);

impl BoundedFields {
    /// Accept a list that already fits the cap.
    pub fn new(elements: Vec<FieldElement>) -> Result<Self, EncodingError> {
        if elements.len() > MAX_RECORD_ARITY {
            return Err(EncodingError::ArityExceeded {
                len: elements.len(),
                cap: MAX_RECORD_ARITY,
            });
        }
        Ok(Self(elements))
    }

    /// Keep the first [`MAX_RECORD_ARITY`] elements of `elements`.
    pub fn truncating(elements: &[FieldElement]) -> Self {
        Self(elements.iter().take(MAX_RECORD_ARITY).copied().collect())
    }

    pub fn as_slice(&self) -> &[FieldElement] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Vec<FieldElement>> for BoundedFields {
    type Error = EncodingError;

    fn try_from(v: Vec<FieldElement>) -> Result<Self, Self::Error> {
        Self::new(v)
    }
}

impl From<BoundedFields> for Vec<FieldElement> {
    fn from(b: BoundedFields) -> Self {
        b.0
    }
}

/// Encode a record's envelope attributes into a bounded field list.
pub fn encode_record(record: &ComplianceRecord) -> BoundedFields {
    let mut out = Vec::with_capacity(MAX_RECORD_ARITY);
    for (attribute, quota) in RECORD_LAYOUT {
        let remaining = MAX_RECORD_ARITY - out.len();
        if remaining == 0 {
            break;
        }
        let take = quota.min(remaining);
        match attribute {
            RecordAttribute::Identifier => {
                out.extend(encode(record.identifier().as_str()).lanes().iter().take(take));
            }
            RecordAttribute::Timestamp => {
                out.push(FieldElement::reduce(record.observed_at().epoch_secs_unsigned()));
            }
            RecordAttribute::Kind => {
                out.push(FieldElement::reduce(record.kind().code()));
            }
            RecordAttribute::Content => {
                out.extend(encode(record.content().unwrap_or("")).lanes().iter().take(take));
            }
            RecordAttribute::Actor => {
                out.extend(encode(record.actor().unwrap_or("")).lanes().iter().take(take));
            }
        }
    }
    BoundedFields(out)
}

/// Encode every present attribute of a record, keyed by slot.
pub fn encode_attributes(record: &ComplianceRecord) -> BTreeMap<FieldSlot, EncodedVector> {
    record
        .attributes()
        .iter()
        .map(|(slot, value)| (*slot, encode(value)))
        .collect()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn encoded_vector_always_has_eight_lanes(s in ".*", limit in 0usize..64) {
            let v = encode_with_limit(&s, limit);
            prop_assert_eq!(v.lanes().len(), VECTOR_WIDTH);
            for lane in v.lanes() {
                prop_assert!(lane.value() < (1u64 << 31));
            }
        }

        #[test]
        fn truncation_is_deterministic(s in "\\PC{33,80}") {
            let prefix: String = s.chars().take(DEFAULT_MAX_LEN).collect();
            prop_assert_eq!(encode(&s), encode(&prefix));
        }

        #[test]
        fn non_ascii_maps_to_sentinel(
            prefix in "[a-z]{0,10}",
            c in any::<char>().prop_filter("non-ascii", |c| u32::from(*c) > 127),
        ) {
            let text = format!("{prefix}{c}");
            let pos = prefix.chars().count();
            let bytes = encode(&text).to_bytes();
            prop_assert_eq!(bytes[pos], SENTINEL);
        }

        #[test]
        fn ascii_is_preserved(s in "[ -~]{0,32}") {
            let bytes = encode(&s).to_bytes();
            prop_assert_eq!(&bytes[..s.len()], s.as_bytes());
        }
    }
}
