//! # pret-zkp — Proving Capability
//!
//! The proving system is consumed as an opaque capability. This crate fixes
//! its interface and supplies what the rest of the workspace needs around it.
//!
//! ## Architecture
//!
//! - **Predicates** (`predicate.rs`): `CompliancePredicate`, a named
//!   conjunction of clauses over registry slots, with the built-in GLEIF,
//!   EXIM and corporate-registration predicates.
//!
//! - **Circuit** (`circuit.rs`): `ComplianceCircuit` bundles the public
//!   statement (record commitment, verification time) with the private
//!   witness (bounded fields, attributes) and the predicate.
//!
//! - **Traits** (`traits.rs`): `ProofSystem` is the interface every backend
//!   satisfies. Keys are derived from a deployment's verification key
//!   reference, so a proof made under one deployment never verifies under
//!   another.
//!
//! - **Mock** (`mock.rs`): `MockProofSystem`, deterministic SHA-256 proofs
//!   with no zero-knowledge property. Used offline and in tests.
//!
//! ## Crate Policy
//!
//! - Depends on `pret-core` and `pret-crypto` internally.
//! - Proof generation and verification are pure: no I/O, no clocks.

pub mod circuit;
#[cfg(feature = "mock")]
pub mod mock;
pub mod predicate;
pub mod traits;

pub use circuit::ComplianceCircuit;
#[cfg(feature = "mock")]
pub use mock::MockProofSystem;
pub use predicate::{Clause, CompliancePredicate, PredicateEvaluation};
pub use traits::{BoundProof, ComplianceProof, ProofError, ProofSystem, VerifyError};
