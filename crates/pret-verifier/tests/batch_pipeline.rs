//! End-to-end batch verification over the mock backend.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use pret_core::{ComplianceRecord, EntityKey, FetchError, FieldSlot, RecordKind, Timestamp};
use pret_crypto::CommitmentTree;
use pret_deploy::{DeploymentEntry, DeploymentRegistry, Environment, InMemoryRegistryStore};
use pret_state::{AggregateState, AggregateStateMachine, InMemoryAggregateStore};
use pret_verifier::{
    BatchOrchestrator, ComplianceSource, ComplianceVerifier, ProofAssemblyService, Stage,
    StaticSource, VerifierSettings, DEFAULT_CONTRACT,
};
use pret_zkp::MockProofSystem;

type Verifier = ComplianceVerifier<MockProofSystem, InMemoryAggregateStore, InMemoryRegistryStore>;

const LEI_A: &str = "506700GE1G29325QX363";
const CIN_B: &str = "U01112TZ2022PTC039493";
const CIN_C: &str = "L72900MH1995PLC084781";

fn now() -> Timestamp {
    Timestamp::parse("2026-01-15T12:00:00Z").unwrap()
}

fn verifier() -> Arc<Verifier> {
    let registry = DeploymentRegistry::new(InMemoryRegistryStore::new());
    registry
        .record_deployment(
            Environment::Testnet,
            DEFAULT_CONTRACT,
            DeploymentEntry::new("pret_compliance_v1.aleo", "vk-testnet-1", now()).unwrap(),
        )
        .unwrap();
    Arc::new(ComplianceVerifier::new(
        ProofAssemblyService::new(MockProofSystem),
        Arc::new(AggregateStateMachine::new(InMemoryAggregateStore::new())),
        Arc::new(registry),
        VerifierSettings {
            environment: Environment::Testnet,
            ..VerifierSettings::default()
        },
    ))
}

fn gleif(lei: &str, status: &str) -> ComplianceRecord {
    ComplianceRecord::new(EntityKey::new(lei).unwrap(), RecordKind::Gleif, now())
        .with_attribute(FieldSlot::ENTITY_STATUS, status)
        .with_attribute(FieldSlot::REGISTRATION_STATUS, "ISSUED")
}

fn registry_record(cin: &str, status: &str) -> ComplianceRecord {
    ComplianceRecord::new(EntityKey::new(cin).unwrap(), RecordKind::CorporateRegistration, now())
        .with_attribute(FieldSlot::COMPANY_STATUS, status)
        .with_attribute(FieldSlot::DATE_OF_INCORPORATION, "19/01/1995")
}

#[tokio::test]
async fn test_second_of_three_fails_fetch() {
    let verifier = verifier();
    let source = StaticSource::new()
        .with_record(gleif(LEI_A, "ACTIVE"))
        .with_failure(
            EntityKey::new(CIN_B).unwrap(),
            FetchError::Unavailable("registry timeout".into()),
        )
        .with_record(registry_record(CIN_C, "Strike Off"));
    let orchestrator = BatchOrchestrator::new(Arc::clone(&verifier), Arc::new(source));

    let batch = orchestrator.verify_batch(&[LEI_A, CIN_B, CIN_C]).await.unwrap();

    assert_eq!(batch.results.len(), 3);
    let ids: Vec<&str> = batch.results.iter().map(|r| r.identifier.as_str()).collect();
    assert_eq!(ids, vec![LEI_A, CIN_B, CIN_C]);

    assert!(batch.results[0].error.is_none());
    assert!(batch.results[2].error.is_none());
    let err = batch.results[1].error.as_ref().unwrap();
    assert_eq!(err.stage, Stage::Fetch);
    assert_eq!(err.entity.as_deref(), Some(CIN_B));

    assert!(batch.results[0].is_compliant);
    assert_eq!(batch.results[0].compliance_score, 100);
    assert!(!batch.results[2].is_compliant);
    assert_eq!(batch.results[2].compliance_score, 50);

    assert_eq!((batch.successes, batch.failures), (2, 1));
    assert_eq!((batch.compliant, batch.non_compliant), (1, 1));
    assert_eq!(batch.environment, Environment::Testnet);

    let leaves = [
        batch.results[0].commitment.unwrap(),
        batch.results[2].commitment.unwrap(),
    ];
    assert_eq!(batch.root, CommitmentTree::build(&leaves).root());

    let state = verifier.state().current().unwrap();
    assert_eq!(state.total_verifications, 2);
    assert_eq!(state.total_entities, 2);
}

#[tokio::test]
async fn test_oversized_batch_rejected_before_work() {
    let verifier = verifier();
    let orchestrator = BatchOrchestrator::new(Arc::clone(&verifier), Arc::new(StaticSource::new()));
    let ids: Vec<String> = (0..11).map(|i| format!("ENTITY {i}")).collect();

    let err = orchestrator.verify_batch(&ids).await.unwrap_err();
    assert_eq!(err.stage, Stage::Input);
    assert!(err.entity.is_none());
    assert_eq!(verifier.state().current().unwrap(), AggregateState::INITIAL);
}

#[tokio::test]
async fn test_malformed_identifier_isolated() {
    let verifier = verifier();
    let source = StaticSource::new().with_record(gleif(LEI_A, "ACTIVE"));
    let orchestrator = BatchOrchestrator::new(Arc::clone(&verifier), Arc::new(source));

    let batch = orchestrator.verify_batch(&["   ", LEI_A]).await.unwrap();
    assert_eq!(batch.results[0].error.as_ref().unwrap().stage, Stage::Input);
    assert!(batch.results[1].error.is_none());
    assert_eq!(batch.successes, 1);
}

#[tokio::test]
async fn test_repeated_entity_counted_each_time() {
    let verifier = verifier();
    let source = StaticSource::new().with_record(gleif(LEI_A, "ACTIVE"));
    let orchestrator = BatchOrchestrator::new(Arc::clone(&verifier), Arc::new(source));

    let batch = orchestrator.verify_batch(&[LEI_A, LEI_A, LEI_A]).await.unwrap();
    assert_eq!(batch.successes, 3);
    let state = verifier.state().current().unwrap();
    assert_eq!(state.total_entities, 3);
}

/// Answers later identifiers faster and records peak concurrency.
struct SlowSource {
    inner: StaticSource,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

#[async_trait]
impl ComplianceSource for SlowSource {
    async fn fetch(&self, key: &EntityKey) -> Result<ComplianceRecord, FetchError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let delay = if key.as_str() == LEI_A { 60 } else { 5 };
        tokio::time::sleep(Duration::from_millis(delay)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.inner.fetch(key).await
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_order_preserved_under_bounded_concurrency() {
    let verifier = verifier();
    let source = Arc::new(SlowSource {
        inner: StaticSource::new()
            .with_record(gleif(LEI_A, "ACTIVE"))
            .with_record(registry_record(CIN_B, "Active"))
            .with_record(registry_record(CIN_C, "Active")),
        in_flight: AtomicUsize::new(0),
        peak: AtomicUsize::new(0),
    });
    let orchestrator =
        BatchOrchestrator::new(Arc::clone(&verifier), Arc::clone(&source)).with_concurrency(2);

    let ids = [LEI_A, CIN_B, CIN_C, CIN_B, CIN_C];
    let batch = orchestrator.verify_batch(&ids).await.unwrap();

    let got: Vec<&str> = batch.results.iter().map(|r| r.identifier.as_str()).collect();
    assert_eq!(got, ids.to_vec());
    assert_eq!(batch.successes, 5);
    assert!(source.peak.load(Ordering::SeqCst) <= 2);
    assert_eq!(verifier.state().current().unwrap().total_verifications, 5);
}

/// Delays every answer long enough for a caller timeout to fire first.
struct DelayedSource {
    inner: StaticSource,
    delay: Duration,
}

#[async_trait]
impl ComplianceSource for DelayedSource {
    async fn fetch(&self, key: &EntityKey) -> Result<ComplianceRecord, FetchError> {
        tokio::time::sleep(self.delay).await;
        self.inner.fetch(key).await
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancelled_batch_leaves_state_untouched() {
    let verifier = verifier();
    let source = DelayedSource {
        inner: StaticSource::new()
            .with_record(gleif(LEI_A, "ACTIVE"))
            .with_record(registry_record(CIN_B, "Active")),
        delay: Duration::from_millis(200),
    };
    let orchestrator = BatchOrchestrator::new(Arc::clone(&verifier), Arc::new(source));

    let cancelled = tokio::time::timeout(
        Duration::from_millis(20),
        orchestrator.verify_batch(&[LEI_A, CIN_B]),
    )
    .await;
    assert!(cancelled.is_err());

    // Outlive the source delay so a surviving task would have committed.
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(verifier.state().current().unwrap(), AggregateState::INITIAL);

    let batch = orchestrator.verify_batch(&[LEI_A]).await.unwrap();
    assert_eq!(batch.successes, 1);
    assert_eq!(verifier.state().current().unwrap().total_verifications, 1);
}
