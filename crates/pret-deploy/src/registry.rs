//! # Deployment Registry
//!
//! An explicitly injected registry over a [`RegistryStore`]. Reads are
//! served from an in-memory cache only while the store's revision for the
//! environment is unchanged. A revision is a digest of the stored record,
//! so any write that changes the record, from this process or another,
//! invalidates the cached copy. The cache saves parsing and validation,
//! not the read itself.
//!
//! Writers hold an exclusive lock for the whole of `save`, `backup`,
//! `clear` and `restore`, including the automatic snapshot that precedes
//! a destructive update.

use std::collections::BTreeMap;

use parking_lot::{Mutex, RwLock};

use pret_core::Timestamp;

use crate::entry::{DeploymentEntry, EnvironmentConfig};
use crate::environment::Environment;
use crate::error::{ConfigError, RegistryError};
use crate::store::{BackupLocation, RegistryStore, Revision};

#[derive(Debug, Clone)]
struct Cached {
    revision: Revision,
    config: EnvironmentConfig,
}

/// Per-environment deployment registry.
#[derive(Debug)]
pub struct DeploymentRegistry<S> {
    store: S,
    cache: RwLock<BTreeMap<Environment, Cached>>,
    writer: Mutex<()>,
}

impl<S: RegistryStore> DeploymentRegistry<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            cache: RwLock::new(BTreeMap::new()),
            writer: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // ── reads ───────────────────────────────────────────────────────

    /// The current record for `environment`, or `None`.
    pub fn load(
        &self,
        environment: Environment,
    ) -> Result<Option<EnvironmentConfig>, RegistryError> {
        let Some(revision) = self.store.revision(environment)? else {
            self.cache.write().remove(&environment);
            return Ok(None);
        };
        if let Some(hit) = self.cache.read().get(&environment) {
            if hit.revision == revision {
                return Ok(Some(hit.config.clone()));
            }
        }
        let config = self.store.read(environment)?;
        let mut cache = self.cache.write();
        match &config {
            Some(cfg) => {
                // Re-stat so a write racing the read is not cached under
                // the older revision.
                if self.store.revision(environment)? == Some(revision) {
                    cache.insert(
                        environment,
                        Cached {
                            revision,
                            config: cfg.clone(),
                        },
                    );
                }
            }
            None => {
                cache.remove(&environment);
            }
        }
        Ok(config)
    }

    pub fn exists(&self, environment: Environment) -> Result<bool, RegistryError> {
        Ok(self.store.revision(environment)?.is_some())
    }

    /// Environments with a record.
    pub fn list(&self) -> Result<Vec<Environment>, RegistryError> {
        self.store.environments()
    }

    /// The deployment that verification for `environment` must target.
    ///
    /// # Errors
    ///
    /// [`ConfigError::NotDeployed`] if the environment has no record,
    /// [`ConfigError::MissingContract`] if the record lacks `contract`.
    pub fn active_deployment(
        &self,
        environment: Environment,
        contract: &str,
    ) -> Result<DeploymentEntry, RegistryError> {
        let config = self
            .load(environment)?
            .ok_or(ConfigError::NotDeployed { environment })?;
        Ok(config.deployment(contract)?.clone())
    }

    /// Snapshots of `environment`, oldest first.
    pub fn backups(&self, environment: Environment) -> Result<Vec<BackupLocation>, RegistryError> {
        self.store.backups(environment)
    }

    /// The most recent snapshot of `environment`, if any.
    pub fn latest_backup(
        &self,
        environment: Environment,
    ) -> Result<Option<BackupLocation>, RegistryError> {
        Ok(self.store.backups(environment)?.pop())
    }

    /// Read a snapshot without restoring it.
    pub fn read_backup(
        &self,
        location: &BackupLocation,
    ) -> Result<EnvironmentConfig, RegistryError> {
        self.store.read_backup(location)
    }

    // ── writes ──────────────────────────────────────────────────────

    /// Replace the record for `environment`.
    ///
    /// An existing record is snapshotted first; the snapshot location is
    /// returned.
    pub fn save(
        &self,
        environment: Environment,
        config: &EnvironmentConfig,
    ) -> Result<Option<BackupLocation>, RegistryError> {
        if config.environment != environment {
            return Err(ConfigError::EnvironmentMismatch {
                expected: environment,
                found: config.environment,
            }
            .into());
        }
        let _writer = self.writer.lock();
        let backup = self.snapshot_existing(environment)?;
        self.store.write(config)?;
        self.cache.write().remove(&environment);
        tracing::info!(
            environment = %environment,
            deployments = config.deployments.len(),
            backup = backup.as_ref().map(|b| b.as_str()),
            "registry record saved"
        );
        Ok(backup)
    }

    /// Record a deployment of `contract`, keeping the rest of the record.
    pub fn record_deployment(
        &self,
        environment: Environment,
        contract: &str,
        entry: DeploymentEntry,
    ) -> Result<Option<BackupLocation>, RegistryError> {
        let _writer = self.writer.lock();
        let current = self.store.read(environment)?;
        let backup = match &current {
            Some(cfg) => Some(self.store.write_backup(cfg, Timestamp::now())?),
            None => None,
        };
        let mut next = current.unwrap_or_else(|| EnvironmentConfig::new(environment));
        tracing::info!(
            environment = %environment,
            contract,
            address = %entry.address,
            verification_key_ref = %entry.verification_key_ref,
            "deployment recorded"
        );
        next.deployments.insert(contract.to_string(), entry);
        self.store.write(&next)?;
        self.cache.write().remove(&environment);
        Ok(backup)
    }

    /// Delete the record for `environment` after snapshotting it.
    ///
    /// Returns the snapshot location, or `None` if there was no record.
    pub fn clear(&self, environment: Environment) -> Result<Option<BackupLocation>, RegistryError> {
        let _writer = self.writer.lock();
        let backup = self.snapshot_existing(environment)?;
        self.store.remove(environment)?;
        self.cache.write().remove(&environment);
        tracing::info!(environment = %environment, "registry record cleared");
        Ok(backup)
    }

    /// Snapshot the current record.
    ///
    /// # Errors
    ///
    /// [`ConfigError::NotDeployed`] if there is nothing to snapshot.
    pub fn backup(&self, environment: Environment) -> Result<BackupLocation, RegistryError> {
        let _writer = self.writer.lock();
        self.snapshot_existing(environment)?
            .ok_or_else(|| ConfigError::NotDeployed { environment }.into())
    }

    /// Replace the record with the snapshot at `location`.
    ///
    /// The current record, if any, is snapshotted first. Never called
    /// implicitly.
    pub fn restore(
        &self,
        environment: Environment,
        location: &BackupLocation,
    ) -> Result<EnvironmentConfig, RegistryError> {
        let _writer = self.writer.lock();
        let snapshot = self.store.read_backup(location)?;
        if snapshot.environment != environment {
            return Err(ConfigError::EnvironmentMismatch {
                expected: environment,
                found: snapshot.environment,
            }
            .into());
        }
        self.snapshot_existing(environment)?;
        self.store.write(&snapshot)?;
        self.cache.write().remove(&environment);
        tracing::warn!(
            environment = %environment,
            location = %location,
            "registry record restored from backup"
        );
        Ok(snapshot)
    }

    /// Restore the most recent snapshot.
    ///
    /// # Errors
    ///
    /// [`ConfigError::NoBackup`] if none exists.
    pub fn restore_latest(
        &self,
        environment: Environment,
    ) -> Result<EnvironmentConfig, RegistryError> {
        let location = self
            .latest_backup(environment)?
            .ok_or(ConfigError::NoBackup { environment })?;
        self.restore(environment, &location)
    }

    fn snapshot_existing(
        &self,
        environment: Environment,
    ) -> Result<Option<BackupLocation>, RegistryError> {
        match self.store.read(environment)? {
            Some(cfg) => {
                let location = self.store.write_backup(&cfg, Timestamp::now())?;
                tracing::debug!(
                    environment = %environment,
                    location = %location,
                    "registry backup written"
                );
                Ok(Some(location))
            }
            None => Ok(None),
        }
    }
}
