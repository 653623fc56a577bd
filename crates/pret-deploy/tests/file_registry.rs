//! Registry behavior over the file store, including a second registry
//! instance standing in for another process.

use pret_core::Timestamp;
use pret_deploy::{
    ConfigError, DeploymentEntry, DeploymentRegistry, Environment, EnvironmentConfig,
    FileRegistryStore,
};

const CONTRACT: &str = "pret_compliance";

fn config(key: &str) -> EnvironmentConfig {
    let entry = DeploymentEntry::new(
        "pret_compliance_v1.aleo",
        key,
        Timestamp::parse("2026-01-15T12:00:00Z").unwrap(),
    )
    .unwrap()
    .with_transaction_ref(format!("tx-{key}"));
    EnvironmentConfig::new(Environment::Testnet).with_deployment(CONTRACT, entry)
}

#[test]
fn test_save_load_clear_backup_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let reg = DeploymentRegistry::new(FileRegistryStore::open(dir.path()).unwrap());

    let first = config("vk-1");
    reg.save(Environment::Testnet, &first).unwrap();
    assert_eq!(reg.load(Environment::Testnet).unwrap(), Some(first.clone()));

    let location = reg.backup(Environment::Testnet).unwrap();
    reg.save(Environment::Testnet, &config("vk-2")).unwrap();
    assert_eq!(reg.read_backup(&location).unwrap(), first);

    reg.clear(Environment::Testnet).unwrap();
    assert_eq!(reg.load(Environment::Testnet).unwrap(), None);
    assert!(reg.list().unwrap().is_empty());

    // backup, auto-backup on save, auto-backup on clear
    assert_eq!(reg.backups(Environment::Testnet).unwrap().len(), 3);
}

#[test]
fn test_redeploy_by_other_instance_is_visible() {
    let dir = tempfile::tempdir().unwrap();
    let verifier_side = DeploymentRegistry::new(FileRegistryStore::open(dir.path()).unwrap());
    let deployer_side = DeploymentRegistry::new(FileRegistryStore::open(dir.path()).unwrap());

    deployer_side.save(Environment::Testnet, &config("vk-1")).unwrap();
    let before = verifier_side
        .active_deployment(Environment::Testnet, CONTRACT)
        .unwrap();
    assert_eq!(before.verification_key_ref, "vk-1");

    deployer_side.save(Environment::Testnet, &config("vk-2")).unwrap();
    let after = verifier_side
        .active_deployment(Environment::Testnet, CONTRACT)
        .unwrap();
    assert_eq!(after.verification_key_ref, "vk-2");
}

#[test]
fn test_restore_from_explicit_location() {
    let dir = tempfile::tempdir().unwrap();
    let reg = DeploymentRegistry::new(FileRegistryStore::open(dir.path()).unwrap());
    reg.save(Environment::Testnet, &config("vk-1")).unwrap();
    let snapshot = reg
        .save(Environment::Testnet, &config("vk-2"))
        .unwrap()
        .unwrap();

    reg.restore(Environment::Testnet, &snapshot).unwrap();
    assert_eq!(
        reg.active_deployment(Environment::Testnet, CONTRACT)
            .unwrap()
            .verification_key_ref,
        "vk-1"
    );

    let err = reg.restore(Environment::Mainnet, &snapshot).unwrap_err();
    assert!(matches!(
        err.as_config(),
        Some(ConfigError::EnvironmentMismatch { .. })
    ));
}

#[test]
fn test_in_place_rewrite_with_same_metadata_is_visible() {
    let dir = tempfile::tempdir().unwrap();
    let reg = DeploymentRegistry::new(FileRegistryStore::open(dir.path()).unwrap());
    reg.save(Environment::Testnet, &config("vk-1")).unwrap();
    assert_eq!(
        reg.active_deployment(Environment::Testnet, CONTRACT)
            .unwrap()
            .verification_key_ref,
        "vk-1"
    );

    // Same length, same inode, same mtime: only the content differs.
    let path = dir.path().join("testnet.json");
    let modified = std::fs::metadata(&path).unwrap().modified().unwrap();
    let rewritten = std::fs::read_to_string(&path).unwrap().replace("vk-1", "vk-2");
    std::fs::write(&path, rewritten).unwrap();
    std::fs::File::options()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(modified)
        .unwrap();

    assert_eq!(
        reg.active_deployment(Environment::Testnet, CONTRACT)
            .unwrap()
            .verification_key_ref,
        "vk-2"
    );
}
