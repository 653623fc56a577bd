//! # Batch Orchestrator
//!
//! Verifies up to [`MAX_BATCH_SIZE`] identifiers. Oversized batches are
//! rejected before any work starts. Entities run concurrently, bounded by
//! a semaphore, and each failure is confined to its own result slot.
//! Results come back in input order regardless of completion order.
//!
//! Entity tasks live in a [`JoinSet`] owned by the batch future. Dropping
//! that future (a caller timeout, a cancelled request) aborts every task
//! still pending, so a cancelled batch makes no further state transitions.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use uuid::Uuid;

use pret_core::{EntityKey, InputError, Timestamp};
use pret_crypto::{Commitment, CommitmentTree};
use pret_deploy::{Environment, RegistryStore};
use pret_state::AggregateStore;
use pret_zkp::ProofSystem;

use crate::error::{Stage, VerificationError, VerificationErrorKind};
use crate::source::ComplianceSource;
use crate::verifier::{ComplianceVerifier, VerificationOutcome};

/// Largest accepted batch.
pub const MAX_BATCH_SIZE: usize = 10;

/// Default number of entities in flight at once.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Outcome for one identifier.
#[derive(Debug, Clone, Serialize)]
pub struct EntityResult {
    /// The identifier as submitted.
    pub identifier: String,
    pub is_compliant: bool,
    pub compliance_score: u8,
    /// Epoch seconds; 0 when the entity failed.
    pub verification_time: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commitment: Option<Commitment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<VerificationError>,
}

impl EntityResult {
    fn success(identifier: String, outcome: VerificationOutcome) -> Self {
        Self {
            identifier,
            is_compliant: outcome.is_compliant,
            compliance_score: outcome.compliance_score,
            verification_time: outcome.verification_time,
            commitment: Some(outcome.commitment),
            error: None,
        }
    }

    fn failure(identifier: String, error: VerificationError) -> Self {
        Self {
            identifier,
            is_compliant: false,
            compliance_score: 0,
            verification_time: 0,
            commitment: None,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Ordered per-entity outcomes plus aggregate counts.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub batch_id: Uuid,
    pub environment: Environment,
    pub started_at: Timestamp,
    pub results: Vec<EntityResult>,
    pub successes: usize,
    pub failures: usize,
    pub compliant: usize,
    pub non_compliant: usize,
    /// Commitment tree root over the successful entities, in input order.
    pub root: Commitment,
}

impl BatchResult {
    fn tally(
        batch_id: Uuid,
        environment: Environment,
        started_at: Timestamp,
        results: Vec<EntityResult>,
    ) -> Self {
        let successes = results.iter().filter(|r| r.is_success()).count();
        let compliant = results
            .iter()
            .filter(|r| r.is_success() && r.is_compliant)
            .count();
        let leaves: Vec<Commitment> = results.iter().filter_map(|r| r.commitment).collect();
        Self {
            batch_id,
            environment,
            started_at,
            failures: results.len() - successes,
            non_compliant: successes - compliant,
            successes,
            compliant,
            root: CommitmentTree::build(&leaves).root(),
            results,
        }
    }
}

/// Runs the verification pipeline over many identifiers.
pub struct BatchOrchestrator<P, A, R, S: ?Sized> {
    verifier: Arc<ComplianceVerifier<P, A, R>>,
    source: Arc<S>,
    concurrency: usize,
    max_batch_size: usize,
}

impl<P, A, R, S> BatchOrchestrator<P, A, R, S>
where
    P: ProofSystem + 'static,
    A: AggregateStore + 'static,
    R: RegistryStore + 'static,
    S: ComplianceSource + ?Sized + 'static,
{
    pub fn new(verifier: Arc<ComplianceVerifier<P, A, R>>, source: Arc<S>) -> Self {
        Self {
            verifier,
            source,
            concurrency: DEFAULT_CONCURRENCY,
            max_batch_size: MAX_BATCH_SIZE,
        }
    }

    /// Entities in flight at once. Zero is treated as one.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Lower the batch size bound. Values above [`MAX_BATCH_SIZE`] are capped.
    pub fn with_max_batch_size(mut self, max: usize) -> Self {
        self.max_batch_size = max.min(MAX_BATCH_SIZE);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    /// Verify every identifier.
    ///
    /// # Errors
    ///
    /// Only [`InputError::BatchTooLarge`], before any entity is touched.
    /// Per-entity failures are reported in the result.
    pub async fn verify_batch<I: AsRef<str>>(
        &self,
        identifiers: &[I],
    ) -> Result<BatchResult, VerificationError> {
        if identifiers.len() > self.max_batch_size {
            return Err(VerificationError::new(
                None,
                Stage::Input,
                InputError::BatchTooLarge {
                    size: identifiers.len(),
                    max: self.max_batch_size,
                },
            ));
        }

        let batch_id = Uuid::new_v4();
        let started_at = Timestamp::now();
        let environment = self.verifier.settings().environment;
        let span = tracing::info_span!(
            "verify_batch",
            %batch_id,
            size = identifiers.len(),
            %environment
        );
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let identifiers: Vec<String> = identifiers.iter().map(|i| i.as_ref().to_string()).collect();
        let mut outcomes: Vec<Option<Result<VerificationOutcome, VerificationError>>> =
            vec![None; identifiers.len()];
        let mut tasks = JoinSet::new();
        {
            let _entered = span.enter();
            tracing::info!("batch started");
            for (index, identifier) in identifiers.iter().enumerate() {
                let key = match EntityKey::new(identifier) {
                    Ok(key) => key,
                    Err(e) => {
                        outcomes[index] = Some(Err(VerificationError::for_entity(identifier, e)));
                        continue;
                    }
                };
                let verifier = Arc::clone(&self.verifier);
                let source = Arc::clone(&self.source);
                let semaphore = Arc::clone(&semaphore);
                tasks.spawn(async move {
                    let outcome = match semaphore.acquire_owned().await {
                        Ok(_permit) => verifier.verify_entity(source.as_ref(), &key).await,
                        Err(e) => Err(VerificationError::for_entity(
                            key.as_str(),
                            VerificationErrorKind::Aborted(e.to_string()),
                        )),
                    };
                    (index, outcome)
                });
            }
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => outcomes[index] = Some(outcome),
                Err(join) => tracing::error!(parent: &span, error = %join, "entity task failed"),
            }
        }

        let mut results = Vec::with_capacity(identifiers.len());
        for (identifier, outcome) in identifiers.into_iter().zip(outcomes) {
            let outcome = outcome.unwrap_or_else(|| {
                Err(VerificationError::for_entity(
                    &identifier,
                    VerificationErrorKind::Aborted("task ended without a result".into()),
                ))
            });
            let result = match outcome {
                Ok(outcome) => EntityResult::success(identifier, outcome),
                Err(error) => {
                    tracing::warn!(
                        parent: &span,
                        entity = %identifier,
                        stage = %error.stage,
                        error = %error.kind,
                        "entity failed"
                    );
                    EntityResult::failure(identifier, error)
                }
            };
            let label = match (&result.error, result.is_compliant) {
                (Some(_), _) => "error",
                (None, true) => "compliant",
                (None, false) => "non_compliant",
            };
            metrics::counter!("pret_batch_entities_total", "outcome" => label).increment(1);
            results.push(result);
        }

        let batch = BatchResult::tally(batch_id, environment, started_at, results);
        tracing::info!(
            parent: &span,
            successes = batch.successes,
            failures = batch.failures,
            compliant = batch.compliant,
            non_compliant = batch.non_compliant,
            root = %batch.root,
            "batch finished"
        );
        Ok(batch)
    }
}
