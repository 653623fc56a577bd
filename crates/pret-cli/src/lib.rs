//! # pret-cli — Operator CLI
//!
//! Provides the `pret` binary over the file-backed stores.
//!
//! ## Subcommands
//!
//! - `pret deploy`: record a deployment (address + verification key).
//! - `pret verify <key>`: verify one entity from its captured payload.
//! - `pret query <text>`: verify the entity a free-text request names.
//! - `pret batch <key>...`: verify up to ten entities.
//! - `pret registry {list,show,backups,backup,restore,clear}`: registry upkeep.
//! - `pret state {show,reset-compliance,reset-counters}`: aggregate state.
//!
//! Source payloads are read from the fixture directory; the CLI makes no
//! network calls. Proofs use the deterministic mock backend.

pub mod config;
pub mod deploy;
pub mod registry;
pub mod state;
pub mod verify;

use std::sync::Arc;

use anyhow::{Context as _, Result};
use serde::Serialize;

use pret_deploy::{DeploymentRegistry, FileRegistryStore};
use pret_state::{AggregateStateMachine, FileAggregateStore};
use pret_verifier::{
    ComplianceVerifier, FixtureSource, ProofAssemblyService, VerifierSettings,
};
use pret_zkp::MockProofSystem;

pub use config::PretConfig;

/// Verifier over the file-backed stores.
pub type CliVerifier = ComplianceVerifier<MockProofSystem, FileAggregateStore, FileRegistryStore>;

/// Everything a command needs, resolved from configuration.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: PretConfig,
}

impl Context {
    pub fn new(config: PretConfig) -> Self {
        Self { config }
    }

    pub fn registry(&self) -> Result<DeploymentRegistry<FileRegistryStore>> {
        let store = FileRegistryStore::open(&self.config.registry_dir).with_context(|| {
            format!(
                "failed to open registry at {}",
                self.config.registry_dir.display()
            )
        })?;
        Ok(DeploymentRegistry::new(store))
    }

    pub fn state_machine(&self) -> Result<AggregateStateMachine<FileAggregateStore>> {
        let store = FileAggregateStore::open(&self.config.state_file).with_context(|| {
            format!(
                "failed to open aggregate state at {}",
                self.config.state_file.display()
            )
        })?;
        Ok(AggregateStateMachine::new(store))
    }

    pub fn fixtures(&self) -> FixtureSource {
        FixtureSource::new(&self.config.fixtures_dir)
    }

    pub fn verifier(&self) -> Result<CliVerifier> {
        Ok(ComplianceVerifier::new(
            ProofAssemblyService::new(MockProofSystem),
            Arc::new(self.state_machine()?),
            Arc::new(self.registry()?),
            VerifierSettings {
                environment: self.config.environment,
                contract: self.config.contract.clone(),
                ..VerifierSettings::default()
            },
        ))
    }
}

/// Pretty-print `value` as JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to render output")?;
    println!("{text}");
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use std::path::Path;

    use super::*;

    /// A context rooted in `dir`.
    pub fn context(dir: &Path) -> Context {
        Context::new(PretConfig {
            registry_dir: dir.join("registry"),
            state_file: dir.join("state").join("aggregate.json"),
            fixtures_dir: dir.join("fixtures"),
            ..PretConfig::default()
        })
    }

    /// Write a GLEIF fixture for `lei` with entity status `status`.
    pub fn write_gleif_fixture(ctx: &Context, lei: &str, status: &str) {
        std::fs::create_dir_all(&ctx.config.fixtures_dir).unwrap();
        let fixture = serde_json::json!({
            "kind": "GLEIF",
            "observed_at": "2026-01-15T12:00:00Z",
            "payload": {
                "data": [{
                    "attributes": {
                        "lei": lei,
                        "entity": {
                            "legalName": { "name": "ACME HOLDINGS LIMITED" },
                            "status": status
                        },
                        "registration": { "status": "ISSUED" }
                    }
                }]
            }
        });
        std::fs::write(
            ctx.config.fixtures_dir.join(format!("{lei}.json")),
            serde_json::to_vec_pretty(&fixture).unwrap(),
        )
        .unwrap();
    }
}
