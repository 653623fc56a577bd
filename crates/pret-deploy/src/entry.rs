//! # Registry Records
//!
//! One [`EnvironmentConfig`] per environment: network parameters, a
//! name-keyed oracle key table and a name-keyed deployment table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use pret_core::Timestamp;

use crate::environment::Environment;
use crate::error::ConfigError;

/// Network connection parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkParams {
    /// Network identifier, e.g. `"testnet"`.
    pub network_id: String,
    /// Node endpoint. `None` for the offline environment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Default transaction fee in the network's base unit.
    #[serde(default)]
    pub default_fee: u64,
}

impl NetworkParams {
    /// Defaults for `environment`. Endpoints are operator-supplied.
    pub fn for_environment(environment: Environment) -> Self {
        Self {
            network_id: environment.as_str().to_string(),
            endpoint: None,
            default_fee: 0,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }
}

/// A registered oracle signing key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleKey {
    pub public_key: String,
    pub added_at: Timestamp,
}

/// Where a contract was deployed and which key verifies its proofs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentEntry {
    pub address: String,
    pub verification_key_ref: String,
    pub deployed_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_ref: Option<String>,
}

impl DeploymentEntry {
    /// Build an entry, rejecting blank address or key reference.
    pub fn new(
        address: impl Into<String>,
        verification_key_ref: impl Into<String>,
        deployed_at: Timestamp,
    ) -> Result<Self, ConfigError> {
        let address = address.into().trim().to_string();
        let verification_key_ref = verification_key_ref.into().trim().to_string();
        if address.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "address".into(),
                reason: "must not be empty".into(),
            });
        }
        if verification_key_ref.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "verification_key_ref".into(),
                reason: "must not be empty".into(),
            });
        }
        Ok(Self {
            address,
            verification_key_ref,
            deployed_at,
            transaction_ref: None,
        })
    }

    pub fn with_transaction_ref(mut self, tx: impl Into<String>) -> Self {
        self.transaction_ref = Some(tx.into());
        self
    }
}

/// The persisted record for one environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub environment: Environment,
    pub network: NetworkParams,
    #[serde(default)]
    pub oracles: BTreeMap<String, OracleKey>,
    #[serde(default)]
    pub deployments: BTreeMap<String, DeploymentEntry>,
}

impl EnvironmentConfig {
    /// An empty record with default network parameters.
    pub fn new(environment: Environment) -> Self {
        Self {
            environment,
            network: NetworkParams::for_environment(environment),
            oracles: BTreeMap::new(),
            deployments: BTreeMap::new(),
        }
    }

    pub fn with_deployment(mut self, contract: impl Into<String>, entry: DeploymentEntry) -> Self {
        self.deployments.insert(contract.into(), entry);
        self
    }

    pub fn with_oracle(mut self, name: impl Into<String>, key: OracleKey) -> Self {
        self.oracles.insert(name.into(), key);
        self
    }

    /// The deployment of `contract`, or [`ConfigError::MissingContract`].
    pub fn deployment(&self, contract: &str) -> Result<&DeploymentEntry, ConfigError> {
        self.deployments
            .get(contract)
            .ok_or_else(|| ConfigError::MissingContract {
                environment: self.environment,
                contract: contract.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts() -> Timestamp {
        Timestamp::parse("2026-01-15T12:00:00Z").unwrap()
    }

    #[test]
    fn test_entry_rejects_blank_fields() {
        assert!(DeploymentEntry::new(" ", "vk", ts()).is_err());
        assert!(DeploymentEntry::new("pret_v1.aleo", "", ts()).is_err());
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let cfg = EnvironmentConfig::new(Environment::Testnet)
            .with_deployment(
                "pret_compliance",
                DeploymentEntry::new("pret_compliance_v1.aleo", "vk-1", ts())
                    .unwrap()
                    .with_transaction_ref("at1xyz"),
            )
            .with_oracle(
                "gleif",
                OracleKey {
                    public_key: "aleo1oracle".into(),
                    added_at: ts(),
                },
            );
        let json = serde_json::to_string(&cfg).unwrap();
        let back: EnvironmentConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn test_missing_contract() {
        let cfg = EnvironmentConfig::new(Environment::Local);
        assert!(matches!(
            cfg.deployment("pret_compliance"),
            Err(ConfigError::MissingContract { .. })
        ));
    }

    #[test]
    fn test_network_defaults() {
        let params = NetworkParams::for_environment(Environment::Mainnet);
        assert_eq!(params.network_id, "mainnet");
        assert!(params.endpoint.is_none());
        let json = serde_json::to_value(&params).unwrap();
        assert!(json.get("endpoint").is_none());
    }
}
