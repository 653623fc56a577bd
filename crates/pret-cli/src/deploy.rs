//! # Deploy Subcommand
//!
//! Records the address and verification key of a new deployment. Any
//! existing record for the environment is backed up first, and every
//! later verification reads the new pair.

use anyhow::{Context as _, Result};
use clap::Args;
use serde::Serialize;

use pret_core::Timestamp;
use pret_deploy::{BackupLocation, DeploymentEntry, Environment};

use crate::{print_json, Context};

/// Arguments for `pret deploy`.
#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Deployed program address.
    #[arg(long)]
    pub address: String,

    /// Reference of the verification key proofs must check against.
    #[arg(long = "verification-key")]
    pub verification_key_ref: String,

    /// Transaction that performed the deployment.
    #[arg(long)]
    pub transaction: Option<String>,

    /// Contract name (defaults to the configured contract).
    #[arg(long)]
    pub contract: Option<String>,
}

#[derive(Debug, Serialize)]
struct DeployReport<'a> {
    environment: Environment,
    contract: &'a str,
    entry: &'a DeploymentEntry,
    backup: Option<BackupLocation>,
}

/// Execute `pret deploy`.
pub fn run_deploy(args: &DeployArgs, ctx: &Context) -> Result<u8> {
    let environment = ctx.config.environment;
    let contract = args.contract.as_deref().unwrap_or(&ctx.config.contract);

    let mut entry = DeploymentEntry::new(
        args.address.as_str(),
        args.verification_key_ref.as_str(),
        Timestamp::now(),
    )?;
    if let Some(tx) = &args.transaction {
        entry = entry.with_transaction_ref(tx.as_str());
    }

    let registry = ctx.registry()?;
    let backup = registry
        .record_deployment(environment, contract, entry.clone())
        .with_context(|| format!("failed to record deployment for {environment}"))?;

    print_json(&DeployReport {
        environment,
        contract,
        entry: &entry,
        backup,
    })?;
    Ok(0)
}
