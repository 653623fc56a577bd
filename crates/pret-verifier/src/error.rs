//! # Verification Errors
//!
//! Every surfaced failure names the entity it concerns (when there is
//! one), the pipeline stage that failed, and the underlying cause.

use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

use pret_core::{EncodingError, FetchError, InputError};
use pret_deploy::{ConfigError, RegistryError};
use pret_state::{StateConflictError, StateError};

use crate::assembly::ProofAssemblyError;

/// Pipeline stage at which a verification failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Input,
    Fetch,
    Encoding,
    Proving,
    State,
    Config,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Fetch => "fetch",
            Self::Encoding => "encoding",
            Self::Proving => "proving",
            Self::State => "state",
            Self::Config => "config",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The cause of a verification failure.
#[derive(Error, Debug, Clone)]
pub enum VerificationErrorKind {
    /// Malformed identifier or oversized batch. No external call was made.
    #[error(transparent)]
    Input(#[from] InputError),

    /// The data source failed for this entity.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Encoder invariant violated. Indicates a defect, not bad data.
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    /// Predicate evaluation, proof construction or proof verification failed.
    #[error(transparent)]
    Proving(#[from] ProofAssemblyError),

    /// Optimistic precondition failed and retries were exhausted.
    #[error(transparent)]
    StateConflict(#[from] StateConflictError),

    /// No usable deployment for the environment.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A durable store failed.
    #[error("storage failure: {0}")]
    Storage(String),

    /// The entity's task ended without producing a result.
    #[error("verification task aborted: {0}")]
    Aborted(String),
}

/// A verification failure with its context.
#[derive(Error, Debug, Clone)]
#[error("{stage} stage failed for {}: {kind}", .entity.as_deref().unwrap_or("<batch>"))]
pub struct VerificationError {
    /// Entity identifier, `None` for batch-level failures.
    pub entity: Option<String>,
    pub stage: Stage,
    #[source]
    pub kind: VerificationErrorKind,
}

impl VerificationError {
    pub fn new(entity: Option<&str>, stage: Stage, kind: impl Into<VerificationErrorKind>) -> Self {
        Self {
            entity: entity.map(str::to_string),
            stage,
            kind: kind.into(),
        }
    }

    /// A failure for `entity`, staged by the kind of cause.
    pub fn for_entity(entity: &str, kind: impl Into<VerificationErrorKind>) -> Self {
        let kind = kind.into();
        let stage = match &kind {
            VerificationErrorKind::Input(_) => Stage::Input,
            VerificationErrorKind::Fetch(_) => Stage::Fetch,
            VerificationErrorKind::Encoding(_) => Stage::Encoding,
            VerificationErrorKind::Proving(_) | VerificationErrorKind::Aborted(_) => Stage::Proving,
            VerificationErrorKind::StateConflict(_) | VerificationErrorKind::Storage(_) => {
                Stage::State
            }
            VerificationErrorKind::Config(_) => Stage::Config,
        };
        Self {
            entity: Some(entity.to_string()),
            stage,
            kind,
        }
    }

    /// Classify a registry failure.
    pub fn from_registry(entity: &str, err: RegistryError) -> Self {
        let kind = match err {
            RegistryError::Config(e) => VerificationErrorKind::Config(e),
            other => VerificationErrorKind::Storage(other.to_string()),
        };
        Self::new(Some(entity), Stage::Config, kind)
    }

    /// Classify a state machine failure.
    pub fn from_state(entity: &str, err: StateError) -> Self {
        let kind = match err {
            StateError::Conflict(c) => VerificationErrorKind::StateConflict(c),
            StateError::ProofRejected(msg) => {
                VerificationErrorKind::Proving(ProofAssemblyError::Rejected(msg))
            }
            other => VerificationErrorKind::Storage(other.to_string()),
        };
        Self::new(Some(entity), Stage::State, kind)
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self.kind, VerificationErrorKind::StateConflict(_))
    }
}

impl Serialize for VerificationError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("VerificationError", 3)?;
        s.serialize_field("entity", &self.entity)?;
        s.serialize_field("stage", &self.stage)?;
        s.serialize_field("cause", &self.kind.to_string())?;
        s.end()
    }
}
