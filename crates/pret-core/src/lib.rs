//! # pret-core — Foundational Types for PRET Compliance Proofs
//!
//! This crate is the leaf of the PRET workspace. It defines the primitives
//! every other crate builds on: the canonical byte pipeline used for all
//! digests, UTC timestamps, validated entity keys and compliance records,
//! and the two components that turn loosely shaped registry data into
//! fixed-arity numeric inputs for commitments and proofs.
//!
//! ## Key Design Principles
//!
//! 1. **Validate at the boundary.** Source payloads (GLEIF, EXIM, corporate
//!    registry) become a [`ComplianceRecord`] with explicit optional fields
//!    before they reach the encoder. Nothing downstream sees raw JSON.
//!
//! 2. **Total, lossy encoding.** [`encode()`] never fails. Text is truncated,
//!    non-ASCII code points are replaced by [`SENTINEL`], and the result is
//!    always exactly [`VECTOR_WIDTH`] lanes.
//!
//! 3. **Stable slots.** The [`field_index`] table maps attribute names to
//!    slots. An assigned slot is never reassigned; the table only grows.
//!
//! 4. **One byte form for hashing.** Structured values that feed a digest
//!    (proof statements, commitment transcripts) go through
//!    [`CanonicalBytes`], so two processes agreeing on a value agree on its
//!    hash.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `pret-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod encoding;
pub mod error;
pub mod field_index;
pub mod identity;
pub mod output;
pub mod record;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use canonical::CanonicalBytes;
pub use encoding::{
    encode, encode_attributes, encode_record, encode_with_limit, BoundedFields, EncodedVector,
    FieldElement, DEFAULT_MAX_LEN, MAX_RECORD_ARITY, SENTINEL, VECTOR_WIDTH,
};
pub use error::{CanonicalizationError, CoreError, EncodingError, FetchError, InputError};
pub use field_index::{FieldSlot, REGISTRY_VERSION};
pub use identity::{extract_cin, extract_company_name, extract_lei, EntityKey, KeyKind};
pub use output::{PublicOutput, VerifiableClaim};
pub use record::{ComplianceRecord, RecordKind};
pub use temporal::Timestamp;
