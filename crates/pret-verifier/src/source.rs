//! # Data Sources
//!
//! The authoritative registries are external collaborators reached through
//! [`ComplianceSource`]. Every failure is a per-entity [`FetchError`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;

use pret_core::{ComplianceRecord, EntityKey, FetchError, RecordKind, Timestamp};

/// Fetches the current record for an entity.
#[async_trait]
pub trait ComplianceSource: Send + Sync {
    /// Fetch and validate the record for `key`.
    ///
    /// No timeout is applied; callers impose their own.
    async fn fetch(&self, key: &EntityKey) -> Result<ComplianceRecord, FetchError>;

    /// Fetch the `kind` record for `key`. A record of another kind counts
    /// as not found.
    async fn fetch_kind(
        &self,
        key: &EntityKey,
        kind: RecordKind,
    ) -> Result<ComplianceRecord, FetchError> {
        let record = self.fetch(key).await?;
        if record.kind() != kind {
            return Err(FetchError::NotFound {
                key: format!("{key} ({kind})"),
            });
        }
        Ok(record)
    }
}

// ─── Static ─────────────────────────────────────────────────────────

/// Answers from a fixed table. Keys without an entry are `NotFound`.
#[derive(Debug, Default, Clone)]
pub struct StaticSource {
    answers: HashMap<EntityKey, Result<ComplianceRecord, FetchError>>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(mut self, record: ComplianceRecord) -> Self {
        self.answers.insert(record.identifier().clone(), Ok(record));
        self
    }

    pub fn with_failure(mut self, key: EntityKey, error: FetchError) -> Self {
        self.answers.insert(key, Err(error));
        self
    }
}

#[async_trait]
impl ComplianceSource for StaticSource {
    async fn fetch(&self, key: &EntityKey) -> Result<ComplianceRecord, FetchError> {
        self.answers
            .get(key)
            .cloned()
            .unwrap_or_else(|| Err(FetchError::NotFound { key: key.to_string() }))
    }
}

// ─── Fixtures ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct Fixture {
    kind: RecordKind,
    #[serde(default)]
    observed_at: Option<Timestamp>,
    payload: serde_json::Value,
}

/// Reads captured source responses from `<dir>/<key>.json`.
///
/// A fixture is `{"kind": "GLEIF" | "EXIM" | "CORPORATE_REGISTRATION",
/// "observed_at"?: RFC 3339, "payload": <raw response>}`. Characters of the
/// key outside `[A-Za-z0-9._-]` become `_` in the file name.
#[derive(Debug, Clone)]
pub struct FixtureSource {
    dir: PathBuf,
}

impl FixtureSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the fixture for `key`.
    pub fn path_for(&self, key: &EntityKey) -> PathBuf {
        let name: String = key
            .as_str()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

#[async_trait]
impl ComplianceSource for FixtureSource {
    async fn fetch(&self, key: &EntityKey) -> Result<ComplianceRecord, FetchError> {
        let path = self.path_for(key);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(FetchError::NotFound { key: key.to_string() });
            }
            Err(e) => {
                return Err(FetchError::Unavailable(format!("{}: {e}", path.display())));
            }
        };
        let fixture: Fixture = serde_json::from_slice(&bytes)
            .map_err(|e| FetchError::Malformed(format!("{}: {e}", path.display())))?;
        let observed_at = fixture.observed_at.unwrap_or_else(Timestamp::now);
        tracing::debug!(entity = %key, kind = fixture.kind.as_str(), "fixture loaded");
        ComplianceRecord::from_payload(fixture.kind, key.clone(), &fixture.payload, observed_at)
    }
}
