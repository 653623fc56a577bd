//! # Verify, Query and Batch Subcommands
//!
//! All three read captured source payloads from the fixture directory, prove
//! against the active deployment of the configured environment, and move
//! the aggregate state.
//!
//! Exit codes: `0` success, `1` command failure, `2` batch completed with
//! at least one failed entity.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Args;

use pret_core::EntityKey;
use pret_verifier::{BatchOrchestrator, ComplianceQuery};

use crate::{print_json, Context};

/// Arguments for `pret verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// LEI, CIN or company name.
    pub key: String,
}

/// Arguments for `pret query`.
#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Free-text request, e.g. "check EXIM status for Palani Trading Company".
    pub text: String,
}

/// Arguments for `pret batch`.
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Identifiers to verify, in order.
    #[arg(required = true)]
    pub keys: Vec<String>,

    /// Entities in flight at once (defaults to the configured bound).
    #[arg(long)]
    pub concurrency: Option<usize>,
}

/// Execute `pret verify`.
pub async fn run_verify(args: &VerifyArgs, ctx: &Context) -> Result<u8> {
    let key = EntityKey::new(&args.key).context("invalid entity identifier")?;
    let verifier = ctx.verifier()?;
    let source = ctx.fixtures();
    let outcome = verifier.verify_entity(&source, &key).await?;
    print_json(&outcome)?;
    Ok(0)
}

/// Execute `pret query`.
pub async fn run_query(args: &QueryArgs, ctx: &Context) -> Result<u8> {
    let query = ComplianceQuery::parse(&args.text).context("could not read the query")?;
    tracing::info!(entity = %query.key, kind = query.kind.as_str(), "query routed");
    let verifier = ctx.verifier()?;
    let outcome = verifier.verify_query(&ctx.fixtures(), &query).await?;
    print_json(&outcome)?;
    Ok(0)
}

/// Execute `pret batch`.
pub async fn run_batch(args: &BatchArgs, ctx: &Context) -> Result<u8> {
    let orchestrator = BatchOrchestrator::new(Arc::new(ctx.verifier()?), Arc::new(ctx.fixtures()))
        .with_max_batch_size(ctx.config.max_batch_size)
        .with_concurrency(args.concurrency.unwrap_or(ctx.config.batch_concurrency));
    let batch = orchestrator.verify_batch(args.keys.as_slice()).await?;
    print_json(&batch)?;
    Ok(if batch.failures == 0 { 0 } else { 2 })
}
