//! # Registry Subcommands
//!
//! Inspect and maintain the deployment registry. Every destructive action
//! writes a backup first; restores are always explicit.

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use serde::Serialize;

use pret_deploy::{BackupLocation, Environment, EnvironmentConfig};

use crate::{print_json, Context};

/// Arguments for `pret registry`.
#[derive(Args, Debug)]
pub struct RegistryArgs {
    #[command(subcommand)]
    pub command: RegistryCommand,
}

/// Registry subcommands. `--env` defaults to the configured environment.
#[derive(Subcommand, Debug)]
pub enum RegistryCommand {
    /// List environments that have a record.
    List,

    /// Print the record for an environment.
    Show {
        #[arg(long = "env")]
        environment: Option<Environment>,
    },

    /// List backups for an environment, oldest first.
    Backups {
        #[arg(long = "env")]
        environment: Option<Environment>,
    },

    /// Snapshot the current record.
    Backup {
        #[arg(long = "env")]
        environment: Option<Environment>,
    },

    /// Replace the record with a backup (the latest unless `--from` is given).
    Restore {
        #[arg(long = "env")]
        environment: Option<Environment>,

        /// Backup location as printed by `backup` or `backups`.
        #[arg(long)]
        from: Option<String>,
    },

    /// Delete the record after snapshotting it.
    Clear {
        #[arg(long = "env")]
        environment: Option<Environment>,
    },
}

#[derive(Debug, Serialize)]
struct RecordReport {
    environment: Environment,
    record: Option<EnvironmentConfig>,
}

#[derive(Debug, Serialize)]
struct BackupReport {
    environment: Environment,
    backups: Vec<BackupLocation>,
}

/// Execute `pret registry`.
pub fn run_registry(args: &RegistryArgs, ctx: &Context) -> Result<u8> {
    let registry = ctx.registry()?;
    let env = |e: &Option<Environment>| e.unwrap_or(ctx.config.environment);

    match &args.command {
        RegistryCommand::List => {
            print_json(&registry.list()?)?;
        }
        RegistryCommand::Show { environment } => {
            let environment = env(environment);
            let record = registry.load(environment)?;
            print_json(&RecordReport {
                environment,
                record,
            })?;
        }
        RegistryCommand::Backups { environment } => {
            let environment = env(environment);
            print_json(&BackupReport {
                environment,
                backups: registry.backups(environment)?,
            })?;
        }
        RegistryCommand::Backup { environment } => {
            let environment = env(environment);
            let location = registry
                .backup(environment)
                .with_context(|| format!("failed to back up {environment}"))?;
            print_json(&BackupReport {
                environment,
                backups: vec![location],
            })?;
        }
        RegistryCommand::Restore { environment, from } => {
            let environment = env(environment);
            let restored = match from {
                Some(location) => {
                    registry.restore(environment, &BackupLocation::new(location.as_str()))
                }
                None => registry.restore_latest(environment),
            }
            .with_context(|| format!("failed to restore {environment}"))?;
            print_json(&RecordReport {
                environment,
                record: Some(restored),
            })?;
        }
        RegistryCommand::Clear { environment } => {
            let environment = env(environment);
            let backup = registry.clear(environment)?;
            print_json(&BackupReport {
                environment,
                backups: backup.into_iter().collect(),
            })?;
        }
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deploy::{run_deploy, DeployArgs};
    use crate::testing::context;

    fn deploy(ctx: &Context, key: &str) {
        let args = DeployArgs {
            address: "pret_compliance_v1.aleo".into(),
            verification_key_ref: key.into(),
            transaction: None,
            contract: None,
        };
        run_deploy(&args, ctx).unwrap();
    }

    fn run(ctx: &Context, command: RegistryCommand) -> Result<u8> {
        run_registry(&RegistryArgs { command }, ctx)
    }

    #[test]
    fn test_clear_then_restore_latest() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        deploy(&ctx, "vk-1");

        run(&ctx, RegistryCommand::Clear { environment: None }).unwrap();
        let registry = ctx.registry().unwrap();
        assert!(!registry.exists(Environment::Local).unwrap());

        run(
            &ctx,
            RegistryCommand::Restore {
                environment: None,
                from: None,
            },
        )
        .unwrap();
        let active = registry
            .active_deployment(Environment::Local, &ctx.config.contract)
            .unwrap();
        assert_eq!(active.verification_key_ref, "vk-1");
    }

    #[test]
    fn test_restore_without_backup_fails() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        let err = run(
            &ctx,
            RegistryCommand::Restore {
                environment: Some(Environment::Testnet),
                from: None,
            },
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("no backup"));
    }

    #[test]
    fn test_restore_from_named_backup() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        deploy(&ctx, "vk-1");
        run(&ctx, RegistryCommand::Backup { environment: None }).unwrap();
        let registry = ctx.registry().unwrap();
        let first = registry.latest_backup(Environment::Local).unwrap().unwrap();
        deploy(&ctx, "vk-2");

        run(
            &ctx,
            RegistryCommand::Restore {
                environment: None,
                from: Some(first.as_str().to_string()),
            },
        )
        .unwrap();
        assert_eq!(
            registry
                .active_deployment(Environment::Local, &ctx.config.contract)
                .unwrap()
                .verification_key_ref,
            "vk-1"
        );
    }

    #[test]
    fn test_backup_of_empty_environment_fails() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        assert!(run(&ctx, RegistryCommand::Backup { environment: None }).is_err());
        assert_eq!(run(&ctx, RegistryCommand::List).unwrap(), 0);
    }
}
