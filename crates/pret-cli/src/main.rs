//! # pret CLI entry point
//!
//! Parses command-line arguments, resolves configuration (file, then
//! `PRET_*` environment, then flags) and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pret_cli::deploy::{run_deploy, DeployArgs};
use pret_cli::registry::{run_registry, RegistryArgs};
use pret_cli::state::{run_state, StateArgs};
use pret_cli::verify::{run_batch, run_query, run_verify, BatchArgs, QueryArgs, VerifyArgs};
use pret_cli::{Context, PretConfig};
use pret_deploy::Environment;

/// PRET: privacy-preserving regulatory compliance verification.
///
/// Proves that an entity meets a compliance predicate without disclosing
/// the record, and tracks the aggregate outcome.
#[derive(Parser, Debug)]
#[command(name = "pret", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Target environment, overriding configuration.
    #[arg(long = "env", global = true)]
    environment: Option<Environment>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Record a deployment for the target environment.
    Deploy(DeployArgs),

    /// Verify one entity.
    Verify(VerifyArgs),

    /// Verify the entity named in a free-text request.
    Query(QueryArgs),

    /// Verify up to ten entities concurrently.
    Batch(BatchArgs),

    /// Deployment registry maintenance.
    Registry(RegistryArgs),

    /// Aggregate state inspection and resets.
    State(StateArgs),
}

fn init_tracing(verbose: u8, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn resolve_config(cli: &Cli) -> Result<PretConfig> {
    let mut config = PretConfig::load(cli.config.as_deref()).context("invalid configuration")?;
    if let Some(environment) = cli.environment {
        config.environment = environment;
    }
    Ok(config)
}

async fn dispatch(command: &Commands, ctx: &Context) -> Result<u8> {
    match command {
        Commands::Deploy(args) => run_deploy(args, ctx),
        Commands::Verify(args) => run_verify(args, ctx).await,
        Commands::Query(args) => run_query(args, ctx).await,
        Commands::Batch(args) => run_batch(args, ctx).await,
        Commands::Registry(args) => run_registry(args, ctx),
        Commands::State(args) => run_state(args, ctx),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let result = match resolve_config(&cli) {
        Ok(config) => {
            tracing::debug!(
                environment = %config.environment,
                registry = %config.registry_dir.display(),
                state = %config.state_file.display(),
                "configuration resolved"
            );
            dispatch(&cli.command, &Context::new(config)).await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pret_cli::registry::RegistryCommand;
    use pret_cli::state::StateCommand;

    #[test]
    fn test_parse_deploy() {
        let cli = Cli::try_parse_from([
            "pret",
            "deploy",
            "--address",
            "pret_compliance_v1.aleo",
            "--verification-key",
            "vk-1",
        ])
        .unwrap();
        match cli.command {
            Commands::Deploy(args) => {
                assert_eq!(args.address, "pret_compliance_v1.aleo");
                assert_eq!(args.verification_key_ref, "vk-1");
                assert!(args.transaction.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_global_env_after_subcommand() {
        let cli = Cli::try_parse_from([
            "pret",
            "verify",
            "506700GE1G29325QX363",
            "--env",
            "TESTNET",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.environment, Some(Environment::Testnet));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_parse_unknown_env_rejected() {
        assert!(Cli::try_parse_from(["pret", "--env", "staging", "state", "show"]).is_err());
    }

    #[test]
    fn test_parse_batch_requires_keys() {
        assert!(Cli::try_parse_from(["pret", "batch"]).is_err());
        let cli = Cli::try_parse_from(["pret", "batch", "A", "B", "--concurrency", "2"]).unwrap();
        match cli.command {
            Commands::Batch(args) => {
                assert_eq!(args.keys, vec!["A", "B"]);
                assert_eq!(args.concurrency, Some(2));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_query_takes_one_text() {
        let cli = Cli::try_parse_from(["pret", "query", "EXIM status for Palani Trading Company"])
            .unwrap();
        match cli.command {
            Commands::Query(args) => {
                assert_eq!(args.text, "EXIM status for Palani Trading Company");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_registry_restore_from() {
        let cli =
            Cli::try_parse_from(["pret", "registry", "restore", "--from", "local/x.json"]).unwrap();
        match cli.command {
            Commands::Registry(args) => assert!(matches!(
                args.command,
                RegistryCommand::Restore { from: Some(_), .. }
            )),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_state_reset_compliance() {
        let cli = Cli::try_parse_from([
            "pret",
            "state",
            "reset-compliance",
            "--expected",
            "true",
        ])
        .unwrap();
        match cli.command {
            Commands::State(args) => assert!(matches!(
                args.command,
                StateCommand::ResetCompliance { expected: Some(true) }
            )),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_env_flag_overrides_config() {
        let cli = Cli::try_parse_from(["pret", "--env", "mainnet", "state", "show"]).unwrap();
        assert_eq!(resolve_config(&cli).unwrap().environment, Environment::Mainnet);
    }
}
