//! # pret-verifier — Verification Pipeline
//!
//! Drives a record from its data source to an aggregate state transition:
//!
//! ```text
//! ComplianceSource::fetch ─▶ encode + commit ─▶ ProofSystem::prove
//!        │                                            │
//!        ▼                                            ▼
//!   FetchError                    DeploymentRegistry (active key, read
//!                                 per call) ─▶ AggregateStateMachine::verify
//! ```
//!
//! ## Architecture
//!
//! - [`ComplianceSource`]: async data-source seam. [`StaticSource`] and
//!   [`FixtureSource`] ship here; network sources live outside the core.
//! - [`ProofAssemblyService`]: record + predicate ─▶ proof. No partial
//!   proof is ever returned.
//! - [`ComplianceQuery`]: free-text request ─▶ record kind + entity key.
//! - [`ComplianceVerifier`]: one record end to end. Re-reads the
//!   deployment registry on every call and retries state conflicts against
//!   a fresh read, up to a bound.
//! - [`BatchOrchestrator`]: many identifiers with per-entity failure
//!   isolation, bounded parallelism and input-order results.
//!
//! ## Cancellation
//!
//! Fetch and proof assembly are the only suspension points and carry no
//! timeout. Dropping a verification future before the state transition
//! leaves the aggregate state untouched.
//! [`BatchOrchestrator::verify_batch`] owns its entity tasks, so dropping
//! the batch future aborts them too.
//!
//! ## Crate Policy
//!
//! - Errors carry the entity, the failing stage and the cause
//!   ([`VerificationError`]).
//! - No `unwrap()` outside tests.

pub mod assembly;
pub mod batch;
pub mod error;
pub mod query;
pub mod source;
pub mod verifier;

pub use assembly::{AssembledProof, ProofAssemblyError, ProofAssemblyService};
pub use batch::{BatchOrchestrator, BatchResult, EntityResult, DEFAULT_CONCURRENCY, MAX_BATCH_SIZE};
pub use error::{Stage, VerificationError, VerificationErrorKind};
pub use query::ComplianceQuery;
pub use source::{ComplianceSource, FixtureSource, StaticSource};
pub use verifier::{ComplianceVerifier, VerificationOutcome, VerifierSettings, DEFAULT_CONTRACT};
