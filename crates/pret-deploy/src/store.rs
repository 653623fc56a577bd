//! # Registry Stores
//!
//! Durable storage behind [`DeploymentRegistry`](crate::DeploymentRegistry).
//!
//! [`FileRegistryStore`] layout:
//!
//! ```text
//! <root>/<env>.json
//! <root>/backups/<env>/<compact-utc>-<seq>-<suffix>.json
//! ```
//!
//! Records are replaced by write-then-rename. Backups are opened with
//! `create_new`, so an existing snapshot is never overwritten.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use pret_core::Timestamp;

use crate::entry::EnvironmentConfig;
use crate::environment::Environment;
use crate::error::RegistryError;

/// Opaque identifier of one backup snapshot.
///
/// Locations from the same store sort oldest first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackupLocation(String);

impl BackupLocation {
    pub fn new(location: impl Into<String>) -> Self {
        Self(location.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BackupLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Change marker for a stored record: SHA-256 over the stored bytes, or
/// over a write generation for stores that keep one. Equal revisions mean
/// equal records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Revision([u8; 32]);

impl Revision {
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self(Sha256::digest(bytes).into())
    }

    fn of_generation(generation: u64) -> Self {
        Self::of_bytes(&generation.to_be_bytes())
    }
}

/// Durable home of the per-environment records.
pub trait RegistryStore: Send + Sync {
    /// Read the record for `environment`.
    fn read(&self, environment: Environment) -> Result<Option<EnvironmentConfig>, RegistryError>;

    /// Current revision of the record, `None` if absent.
    fn revision(&self, environment: Environment) -> Result<Option<Revision>, RegistryError>;

    /// Replace the record for `config.environment` in one step.
    fn write(&self, config: &EnvironmentConfig) -> Result<(), RegistryError>;

    /// Delete the record. Returns whether one existed.
    fn remove(&self, environment: Environment) -> Result<bool, RegistryError>;

    /// Environments with a stored record.
    fn environments(&self) -> Result<Vec<Environment>, RegistryError>;

    /// Write an immutable snapshot of `config`.
    fn write_backup(
        &self,
        config: &EnvironmentConfig,
        taken_at: Timestamp,
    ) -> Result<BackupLocation, RegistryError>;

    /// Read a snapshot.
    fn read_backup(&self, location: &BackupLocation) -> Result<EnvironmentConfig, RegistryError>;

    /// Snapshots of `environment`, oldest first.
    fn backups(&self, environment: Environment) -> Result<Vec<BackupLocation>, RegistryError>;
}

fn backup_name(taken_at: Timestamp, seq: usize) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{seq:06}-{}", taken_at.to_compact(), &suffix[..8])
}

// ─── In-memory ──────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct MemoryInner {
    records: BTreeMap<Environment, (EnvironmentConfig, u64)>,
    backups: BTreeMap<BackupLocation, EnvironmentConfig>,
    generation: u64,
}

/// Process-local store for tests and the offline environment.
#[derive(Debug, Default)]
pub struct InMemoryRegistryStore {
    inner: Mutex<MemoryInner>,
}

impl InMemoryRegistryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RegistryStore for InMemoryRegistryStore {
    fn read(&self, environment: Environment) -> Result<Option<EnvironmentConfig>, RegistryError> {
        Ok(self
            .inner
            .lock()
            .records
            .get(&environment)
            .map(|(cfg, _)| cfg.clone()))
    }

    fn revision(&self, environment: Environment) -> Result<Option<Revision>, RegistryError> {
        Ok(self
            .inner
            .lock()
            .records
            .get(&environment)
            .map(|(_, generation)| Revision::of_generation(*generation)))
    }

    fn write(&self, config: &EnvironmentConfig) -> Result<(), RegistryError> {
        let mut inner = self.inner.lock();
        inner.generation += 1;
        let generation = inner.generation;
        inner
            .records
            .insert(config.environment, (config.clone(), generation));
        Ok(())
    }

    fn remove(&self, environment: Environment) -> Result<bool, RegistryError> {
        Ok(self.inner.lock().records.remove(&environment).is_some())
    }

    fn environments(&self) -> Result<Vec<Environment>, RegistryError> {
        Ok(self.inner.lock().records.keys().copied().collect())
    }

    fn write_backup(
        &self,
        config: &EnvironmentConfig,
        taken_at: Timestamp,
    ) -> Result<BackupLocation, RegistryError> {
        let mut inner = self.inner.lock();
        let prefix = format!("memory://{}/", config.environment);
        let seq = inner
            .backups
            .keys()
            .filter(|loc| loc.as_str().starts_with(&prefix))
            .count();
        let location = BackupLocation(format!("{prefix}{}", backup_name(taken_at, seq)));
        if inner.backups.contains_key(&location) {
            return Err(RegistryError::BackupExists(PathBuf::from(location.as_str())));
        }
        inner.backups.insert(location.clone(), config.clone());
        Ok(location)
    }

    fn read_backup(&self, location: &BackupLocation) -> Result<EnvironmentConfig, RegistryError> {
        self.inner
            .lock()
            .backups
            .get(location)
            .cloned()
            .ok_or_else(|| RegistryError::BackupNotFound(location.to_string()))
    }

    fn backups(&self, environment: Environment) -> Result<Vec<BackupLocation>, RegistryError> {
        let prefix = format!("memory://{environment}/");
        Ok(self
            .inner
            .lock()
            .backups
            .keys()
            .filter(|loc| loc.as_str().starts_with(&prefix))
            .cloned()
            .collect())
    }
}

// ─── File-backed ────────────────────────────────────────────────────

/// One JSON document per environment under a root directory.
#[derive(Debug, Clone)]
pub struct FileRegistryStore {
    root: PathBuf,
}

impl FileRegistryStore {
    /// Use `root`, creating it if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, RegistryError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, environment: Environment) -> PathBuf {
        self.root.join(format!("{environment}.json"))
    }

    fn backup_dir(&self, environment: Environment) -> PathBuf {
        self.root.join("backups").join(environment.as_str())
    }
}

impl RegistryStore for FileRegistryStore {
    fn read(&self, environment: Environment) -> Result<Option<EnvironmentConfig>, RegistryError> {
        match fs::read(self.record_path(environment)) {
            Ok(bytes) => {
                let config: EnvironmentConfig = serde_json::from_slice(&bytes)?;
                if config.environment != environment {
                    return Err(crate::ConfigError::EnvironmentMismatch {
                        expected: environment,
                        found: config.environment,
                    }
                    .into());
                }
                Ok(Some(config))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn revision(&self, environment: Environment) -> Result<Option<Revision>, RegistryError> {
        match fs::read(self.record_path(environment)) {
            Ok(bytes) => Ok(Some(Revision::of_bytes(&bytes))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, config: &EnvironmentConfig) -> Result<(), RegistryError> {
        let path = self.record_path(config.environment);
        let tmp = path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&serde_json::to_vec_pretty(config)?)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, environment: Environment) -> Result<bool, RegistryError> {
        match fs::remove_file(self.record_path(environment)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn environments(&self) -> Result<Vec<Environment>, RegistryError> {
        let mut found = Vec::new();
        for env in Environment::all() {
            if self.record_path(*env).is_file() {
                found.push(*env);
            }
        }
        Ok(found)
    }

    fn write_backup(
        &self,
        config: &EnvironmentConfig,
        taken_at: Timestamp,
    ) -> Result<BackupLocation, RegistryError> {
        let dir = self.backup_dir(config.environment);
        fs::create_dir_all(&dir)?;
        let seq = self.backups(config.environment)?.len();
        let path = dir.join(format!("{}.json", backup_name(taken_at, seq)));
        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(RegistryError::BackupExists(path));
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(&serde_json::to_vec_pretty(config)?)?;
        file.sync_all()?;
        Ok(BackupLocation(path.to_string_lossy().into_owned()))
    }

    fn read_backup(&self, location: &BackupLocation) -> Result<EnvironmentConfig, RegistryError> {
        match fs::read(location.as_str()) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(RegistryError::BackupNotFound(location.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn backups(&self, environment: Environment) -> Result<Vec<BackupLocation>, RegistryError> {
        let dir = self.backup_dir(environment);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut locations = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                locations.push(BackupLocation(path.to_string_lossy().into_owned()));
            }
        }
        locations.sort();
        Ok(locations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    #[test]
    fn test_memory_revision_changes_on_write() {
        let store = InMemoryRegistryStore::new();
        let cfg = EnvironmentConfig::new(Environment::Local);
        assert_eq!(store.revision(Environment::Local).unwrap(), None);
        store.write(&cfg).unwrap();
        let r1 = store.revision(Environment::Local).unwrap();
        store.write(&cfg).unwrap();
        let r2 = store.revision(Environment::Local).unwrap();
        assert!(r1.is_some());
        assert_ne!(r1, r2);
    }

    #[test]
    fn test_file_revision_follows_content() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRegistryStore::open(dir.path()).unwrap();
        assert_eq!(store.revision(Environment::Local).unwrap(), None);

        let cfg = EnvironmentConfig::new(Environment::Local);
        store.write(&cfg).unwrap();
        let r1 = store.revision(Environment::Local).unwrap();
        store.write(&cfg).unwrap();
        assert_eq!(store.revision(Environment::Local).unwrap(), r1);

        let path = dir.path().join("local.json");
        let mut bytes = fs::read(&path).unwrap();
        bytes.push(b'\n');
        fs::write(&path, bytes).unwrap();
        assert_ne!(store.revision(Environment::Local).unwrap(), r1);
    }

    #[test]
    fn test_file_layout() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRegistryStore::open(dir.path()).unwrap();
        let cfg = EnvironmentConfig::new(Environment::Testnet);
        store.write(&cfg).unwrap();
        assert!(dir.path().join("testnet.json").is_file());
        assert!(!dir.path().join("testnet.json.tmp").exists());
        assert_eq!(store.environments().unwrap(), vec![Environment::Testnet]);

        let loc = store
            .write_backup(&cfg, ts("2026-01-15T12:00:00Z"))
            .unwrap();
        assert!(loc
            .as_str()
            .contains(&format!("backups{}testnet", std::path::MAIN_SEPARATOR)));
        assert!(loc.as_str().contains("20260115T120000Z-000000-"));
        assert_eq!(store.read_backup(&loc).unwrap(), cfg);
    }

    #[test]
    fn test_backups_sorted_oldest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRegistryStore::open(dir.path()).unwrap();
        let cfg = EnvironmentConfig::new(Environment::Mainnet);
        let a = store.write_backup(&cfg, ts("2026-01-15T12:00:00Z")).unwrap();
        let b = store.write_backup(&cfg, ts("2026-01-15T12:00:00Z")).unwrap();
        let c = store.write_backup(&cfg, ts("2026-01-16T08:00:00Z")).unwrap();
        assert_eq!(store.backups(Environment::Mainnet).unwrap(), vec![a, b, c]);
        assert!(store.backups(Environment::Local).unwrap().is_empty());
    }

    #[test]
    fn test_file_read_absent_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRegistryStore::open(dir.path()).unwrap();
        assert!(store.read(Environment::Local).unwrap().is_none());
        assert!(!store.remove(Environment::Local).unwrap());
        store.write(&EnvironmentConfig::new(Environment::Local)).unwrap();
        assert!(store.remove(Environment::Local).unwrap());
        assert!(store.read(Environment::Local).unwrap().is_none());
    }

    #[test]
    fn test_misfiled_record_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRegistryStore::open(dir.path()).unwrap();
        let json = serde_json::to_vec(&EnvironmentConfig::new(Environment::Mainnet)).unwrap();
        fs::write(dir.path().join("testnet.json"), json).unwrap();
        assert!(matches!(
            store.read(Environment::Testnet),
            Err(RegistryError::Config(crate::ConfigError::EnvironmentMismatch { .. }))
        ));
    }

    #[test]
    fn test_missing_backup() {
        let store = InMemoryRegistryStore::new();
        assert!(matches!(
            store.read_backup(&BackupLocation::new("memory://local/nope")),
            Err(RegistryError::BackupNotFound(_))
        ));
    }
}
