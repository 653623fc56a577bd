//! # pret-crypto — Compliance Commitment Builder
//!
//! Deterministic commitments over encoded compliance data:
//!
//! - **`commit`** hashes a bounded list (at most 16) of field elements.
//! - **`combine`** hashes two commitments into one, so commitments compose
//!   into binary trees.
//! - **`commit_slots`** builds an index-addressable commitment over a
//!   record's attributes, one leaf per registry slot.
//! - **`CommitmentTree`** folds many entity commitments into one root.
//!
//! ## Security Invariant
//!
//! Commitments are unsalted. Identical inputs always give identical
//! commitments, which is what lets outside callers reproduce and compare
//! them across runs. Hiding comes from the proof layer, which never
//! discloses the committed inputs.
//!
//! Leaf and node hashes are domain-separated (`0x00` / `0x01` prefixes) so a
//! node can never be presented as a leaf.
//!
//! ## Crate Policy
//!
//! - Depends only on `pret-core` internally.
//! - All tests use real SHA-256.

pub mod commitment;
pub mod error;
pub mod tree;

pub use commitment::{combine, commit, commit_record, commit_slots, Commitment};
pub use error::CryptoError;
pub use tree::CommitmentTree;
