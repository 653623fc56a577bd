//! # CLI Configuration
//!
//! `PretConfig` is read from an optional YAML file, then overridden by
//! `PRET_*` environment variables. Invalid values are rejected, never
//! replaced by defaults.
//!
//! ```yaml
//! environment: testnet
//! registry_dir: .pret/registry
//! state_file: .pret/state/aggregate.json
//! fixtures_dir: fixtures
//! contract: pret_compliance
//! batch_concurrency: 4
//! max_batch_size: 10
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use pret_deploy::{ConfigError, Environment};
use pret_verifier::{DEFAULT_CONCURRENCY, DEFAULT_CONTRACT, MAX_BATCH_SIZE};

/// Resolved CLI configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PretConfig {
    pub environment: Environment,
    pub registry_dir: PathBuf,
    pub state_file: PathBuf,
    pub fixtures_dir: PathBuf,
    pub contract: String,
    pub batch_concurrency: usize,
    pub max_batch_size: usize,
}

impl Default for PretConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Local,
            registry_dir: PathBuf::from(".pret/registry"),
            state_file: PathBuf::from(".pret/state/aggregate.json"),
            fixtures_dir: PathBuf::from("fixtures"),
            contract: DEFAULT_CONTRACT.to_string(),
            batch_concurrency: DEFAULT_CONCURRENCY,
            max_batch_size: MAX_BATCH_SIZE,
        }
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.into(),
    }
}

fn parse_count(field: &str, raw: &str) -> Result<usize, ConfigError> {
    raw.trim()
        .parse::<usize>()
        .map_err(|e| invalid(field, format!("{raw:?}: {e}")))
}

impl PretConfig {
    /// Load from `path` (or defaults) and apply the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        base.with_overrides(|name| std::env::var(name).ok())
    }

    /// Parse a YAML file. Absent fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| invalid("config", format!("{}: {e}", path.display())))?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_yaml::from_str(text).map_err(|e| invalid("config", e.to_string()))?;
        config.validate()
    }

    /// Apply `PRET_*` overrides using `lookup` to read variables.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("PRET_ENV") {
            self.environment = v.parse()?;
        }
        if let Some(v) = lookup("PRET_REGISTRY_DIR") {
            self.registry_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("PRET_STATE_FILE") {
            self.state_file = PathBuf::from(v);
        }
        if let Some(v) = lookup("PRET_FIXTURES_DIR") {
            self.fixtures_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("PRET_CONTRACT") {
            self.contract = v;
        }
        if let Some(v) = lookup("PRET_BATCH_CONCURRENCY") {
            self.batch_concurrency = parse_count("batch_concurrency", &v)?;
        }
        self.validate()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.contract.trim().is_empty() {
            return Err(invalid("contract", "must not be empty"));
        }
        if self.batch_concurrency == 0 {
            return Err(invalid("batch_concurrency", "must be at least 1"));
        }
        if self.max_batch_size == 0 || self.max_batch_size > MAX_BATCH_SIZE {
            return Err(invalid(
                "max_batch_size",
                format!("must be between 1 and {MAX_BATCH_SIZE}"),
            ));
        }
        Ok(self)
    }
}
