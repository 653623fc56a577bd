//! # Single-Record Verification
//!
//! `verify(record)`: read the active deployment, assemble a proof, re-read
//! the deployment and check the proof against its key, then move the
//! aggregate state.
//!
//! The deployment is read twice. If a redeploy lands between proving and
//! the state transition, the proof fails against the new key and the
//! state is left alone.
//!
//! The state machine applies each transition at most once and reports a
//! stale precondition as a conflict. Retrying is the verifier's call: it
//! re-reads the state and resubmits the same proof, up to
//! [`VerifierSettings::max_state_attempts`] attempts in total. Set it to 1
//! to surface every conflict to the caller.

use std::sync::Arc;

use serde::Serialize;
use tracing::Instrument;

use pret_core::{ComplianceRecord, EntityKey, FetchError, Timestamp, VerifiableClaim};
use pret_crypto::Commitment;
use pret_deploy::{DeploymentRegistry, Environment, RegistryStore};
use pret_state::{AggregateState, AggregateStateMachine, AggregateStore};
use pret_zkp::{BoundProof, CompliancePredicate, ProofSystem};

use crate::assembly::ProofAssemblyService;
use crate::error::VerificationError;
use crate::query::ComplianceQuery;
use crate::source::ComplianceSource;

/// Contract whose deployment is verified against when none is configured.
pub const DEFAULT_CONTRACT: &str = "pret_compliance";

/// Verification parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierSettings {
    pub environment: Environment,
    /// Deployment table key in the registry.
    pub contract: String,
    /// Total state transition attempts, each against a fresh read, before a
    /// conflict is returned. The retry happens here, on the caller side of
    /// `AggregateStateMachine::verify`. Values below 1 count as 1.
    pub max_state_attempts: usize,
}

impl Default for VerifierSettings {
    fn default() -> Self {
        Self {
            environment: Environment::Local,
            contract: DEFAULT_CONTRACT.to_string(),
            max_state_attempts: 3,
        }
    }
}

/// Result of a successful verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationOutcome {
    pub identifier: String,
    pub is_compliant: bool,
    pub compliance_score: u8,
    /// Epoch seconds.
    pub verification_time: u64,
    pub commitment: Commitment,
    /// Aggregate state after the transition.
    pub state: AggregateState,
}

/// Verifies records against the active deployment and records the outcome.
pub struct ComplianceVerifier<P, A, R> {
    assembly: ProofAssemblyService<P>,
    state: Arc<AggregateStateMachine<A>>,
    registry: Arc<DeploymentRegistry<R>>,
    settings: VerifierSettings,
}

impl<P, A, R> ComplianceVerifier<P, A, R>
where
    P: ProofSystem + 'static,
    A: AggregateStore,
    R: RegistryStore,
{
    pub fn new(
        assembly: ProofAssemblyService<P>,
        state: Arc<AggregateStateMachine<A>>,
        registry: Arc<DeploymentRegistry<R>>,
        settings: VerifierSettings,
    ) -> Self {
        Self {
            assembly,
            state,
            registry,
            settings,
        }
    }

    pub fn settings(&self) -> &VerifierSettings {
        &self.settings
    }

    pub fn state(&self) -> &AggregateStateMachine<A> {
        &self.state
    }

    pub fn registry(&self) -> &DeploymentRegistry<R> {
        &self.registry
    }

    /// Fetch `key` from `source` and verify it.
    pub async fn verify_entity<S>(
        &self,
        source: &S,
        key: &EntityKey,
    ) -> Result<VerificationOutcome, VerificationError>
    where
        S: ComplianceSource + ?Sized,
    {
        let fetched = source.fetch(key).await;
        self.verify_fetched(key, fetched).await
    }

    /// Fetch the record `query` names and verify it.
    pub async fn verify_query<S>(
        &self,
        source: &S,
        query: &ComplianceQuery,
    ) -> Result<VerificationOutcome, VerificationError>
    where
        S: ComplianceSource + ?Sized,
    {
        let fetched = source.fetch_kind(&query.key, query.kind).await;
        self.verify_fetched(&query.key, fetched).await
    }

    async fn verify_fetched(
        &self,
        key: &EntityKey,
        fetched: Result<ComplianceRecord, FetchError>,
    ) -> Result<VerificationOutcome, VerificationError> {
        let record = fetched.map_err(|e| {
            tracing::warn!(entity = %key, error = %e, "fetch failed");
            metrics::counter!("pret_verifications_total", "outcome" => "error").increment(1);
            VerificationError::for_entity(key.as_str(), e)
        })?;
        self.verify_record(&record).await
    }

    /// Verify `record` now.
    pub async fn verify_record(
        &self,
        record: &ComplianceRecord,
    ) -> Result<VerificationOutcome, VerificationError> {
        self.verify_record_at(record, Timestamp::now()).await
    }

    /// Verify `record` with `at` as the verification time.
    pub async fn verify_record_at(
        &self,
        record: &ComplianceRecord,
        at: Timestamp,
    ) -> Result<VerificationOutcome, VerificationError> {
        let entity = record.identifier().as_str();
        let span = tracing::info_span!(
            "verify_record",
            entity,
            kind = record.kind().as_str(),
            environment = %self.settings.environment,
        );
        let result = self.run(record, at).instrument(span).await;
        let outcome = match &result {
            Ok(o) if o.is_compliant => "compliant",
            Ok(_) => "non_compliant",
            Err(_) => "error",
        };
        metrics::counter!("pret_verifications_total", "outcome" => outcome).increment(1);
        result
    }

    async fn run(
        &self,
        record: &ComplianceRecord,
        at: Timestamp,
    ) -> Result<VerificationOutcome, VerificationError> {
        let entity = record.identifier().as_str();
        let env = self.settings.environment;
        let contract = self.settings.contract.as_str();

        let deployment = self
            .registry
            .active_deployment(env, contract)
            .map_err(|e| VerificationError::from_registry(entity, e))?;
        let predicate = CompliancePredicate::for_kind(record.kind());
        let assembled = self
            .assembly
            .assemble(record, &predicate, &deployment, at)
            .await
            .map_err(|e| VerificationError::for_entity(entity, e))?;

        let active = self
            .registry
            .active_deployment(env, contract)
            .map_err(|e| VerificationError::from_registry(entity, e))?;
        if active.verification_key_ref != deployment.verification_key_ref {
            tracing::warn!(
                proved_under = %deployment.verification_key_ref,
                active = %active.verification_key_ref,
                "deployment changed while proving"
            );
        }
        let vk = self
            .assembly
            .verifying_key(&active)
            .map_err(|e| VerificationError::for_entity(entity, e))?;
        let claim = BoundProof::new(self.assembly.system(), &vk, &assembled.proof);
        let state = self.transition(entity, &claim)?;

        tracing::info!(
            is_compliant = assembled.is_compliant(),
            score = assembled.compliance_score(),
            state = %state,
            "entity verified"
        );
        Ok(VerificationOutcome {
            identifier: entity.to_string(),
            is_compliant: assembled.is_compliant(),
            compliance_score: assembled.compliance_score(),
            verification_time: assembled.verification_time(),
            commitment: assembled.commitment,
            state,
        })
    }

    /// Apply `verify`, re-reading the state after each conflict.
    fn transition<C: VerifiableClaim>(
        &self,
        entity: &str,
        claim: &C,
    ) -> Result<AggregateState, VerificationError> {
        let attempts = self.settings.max_state_attempts.max(1);
        let mut attempt = 1;
        loop {
            let observed = self
                .state
                .current()
                .map_err(|e| VerificationError::from_state(entity, e))?;
            match self.state.verify(claim, &observed) {
                Ok(next) => return Ok(next),
                Err(e) if e.is_conflict() && attempt < attempts => {
                    tracing::debug!(attempt, observed = %observed, "state conflict, re-reading");
                    attempt += 1;
                }
                Err(e) => return Err(VerificationError::from_state(entity, e)),
            }
        }
    }
}
