//! Error types for the deployment registry.

use std::path::PathBuf;

use thiserror::Error;

use crate::environment::Environment;

/// A configuration or deployment lookup failed.
///
/// Fatal for the requesting operation and never partially applied.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Not one of `local`, `testnet`, `mainnet`.
    #[error("unknown environment {0:?} (expected local, testnet or mainnet)")]
    UnknownEnvironment(String),

    /// No registry record exists for the environment.
    #[error("no deployment record for environment {environment}")]
    NotDeployed { environment: Environment },

    /// The record exists but does not name the requested contract.
    #[error("no deployment of {contract:?} in environment {environment}")]
    MissingContract {
        environment: Environment,
        contract: String,
    },

    /// A restore was requested but there is nothing to restore.
    #[error("no backup exists for environment {environment}")]
    NoBackup { environment: Environment },

    /// A record was filed under the wrong environment.
    #[error("record belongs to {found}, not {expected}")]
    EnvironmentMismatch {
        expected: Environment,
        found: Environment,
    },

    /// A configuration value failed validation.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Error from a registry operation.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A backup location does not refer to a readable snapshot.
    #[error("backup not found at {0}")]
    BackupNotFound(String),

    /// The create-new guard fired: a backup already exists at this path.
    #[error("backup already exists at {}", .0.display())]
    BackupExists(PathBuf),

    #[error("registry serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("registry io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RegistryError {
    /// The configuration error, if that is what this is.
    pub fn as_config(&self) -> Option<&ConfigError> {
        match self {
            Self::Config(e) => Some(e),
            _ => None,
        }
    }
}
