//! # pret-deploy — Deployment / Environment Registry
//!
//! Holds, per environment, the network parameters, the oracle key table
//! and the deployment table `{address, verification_key_ref, deployed_at,
//! transaction_ref}` that verification reads on every call.
//!
//! ## Architecture
//!
//! - [`Environment`]: the three recognized environments (`local`,
//!   `testnet`, `mainnet`).
//! - [`EnvironmentConfig`] / [`DeploymentEntry`]: the persisted record.
//! - [`RegistryStore`]: durable storage seam, with
//!   [`InMemoryRegistryStore`] and [`FileRegistryStore`].
//! - [`DeploymentRegistry`]: injected registry object. Writers are
//!   serialized; readers see the last completed write.
//!
//! ## Security Invariant
//!
//! Deploy-verify consistency: [`DeploymentRegistry::load`] checks the
//! store's content revision on every call, so a verifier never checks a proof
//! against a verification key that a later deployment replaced. Every
//! destructive update (`save` over an existing record, `clear`,
//! `restore`) snapshots the current record first. Restoring is manual.
//!
//! ## Crate Policy
//!
//! - Depends only on `pret-core` internally.
//! - No `unsafe` code.

pub mod entry;
pub mod environment;
pub mod error;
pub mod registry;
pub mod store;

pub use entry::{DeploymentEntry, EnvironmentConfig, NetworkParams, OracleKey};
pub use environment::Environment;
pub use error::{ConfigError, RegistryError};
pub use registry::DeploymentRegistry;
pub use store::{
    BackupLocation, FileRegistryStore, InMemoryRegistryStore, RegistryStore, Revision,
};
