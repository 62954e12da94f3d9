//! File store round-trips and fail-closed loading

use tempfile::TempDir;
use tessera_contract::{AllocationContract, ContractConfig, Evaluation, SubmissionPayload};
use tessera_core::{Chain, MiningBudget, Transaction, TransactionKind};
use tessera_economics::Epoch;
use tessera_storage::{DocumentKind, FileStore, StateStore, StorageError};

fn mined_chain() -> Chain {
    let chain = Chain::with_difficulty(4);
    for i in 0..3 {
        chain
            .submit(Transaction::with_timestamp(
                TransactionKind::Submission,
                "tester",
                format!("{{\"n\":{i}}}"),
                i,
            ))
            .unwrap();
    }
    chain.mine("tester", None, &MiningBudget::default()).unwrap();
    chain
}

#[test]
fn chain_roundtrip_through_files() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::open(dir.path().join("data")).unwrap();
    let chain = mined_chain();

    store.save_chain(&chain.to_snapshot()).unwrap();
    assert!(store.path_for(DocumentKind::Chain).exists());
    assert!(!dir.path().join("data/chain.json.tmp").exists());

    let loaded = store.load_chain().unwrap().unwrap();
    assert_eq!(loaded.to_snapshot(), chain.to_snapshot());
}

#[test]
fn tampered_chain_file_fails_closed() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::open(dir.path()).unwrap();
    store.save_chain(&mined_chain().to_snapshot()).unwrap();

    let path = store.path_for(DocumentKind::Chain);
    let text = std::fs::read_to_string(&path).unwrap();
    std::fs::write(&path, text.replacen("{\\\"n\\\":1}", "{\\\"n\\\":7}", 1)).unwrap();

    let err = store.load_chain().err().unwrap();
    match err {
        StorageError::Chain(e) => assert!(e.is_integrity_failure()),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn ledger_and_archive_restore_contract() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::open(dir.path()).unwrap();

    let contract = AllocationContract::new(ContractConfig::default()).unwrap();
    let hash = contract
        .submit(SubmissionPayload::new("ada", "notes", vec!["research".into()]))
        .unwrap();
    contract
        .record_evaluation(hash, Evaluation::approved(9000, 8500, 9000))
        .unwrap();
    contract.allocate(hash).unwrap();

    let export = contract.export();
    store.save_ledger(&export.ledger).unwrap();
    store.save_archive(&export.archive).unwrap();

    let ledger = store.load_ledger().unwrap().unwrap();
    let archive = store.load_archive().unwrap().unwrap();
    let restored =
        AllocationContract::restore(contract.policy(), archive, ledger).unwrap();

    assert_eq!(restored.stats(), contract.stats());
    assert_eq!(restored.current_epoch(), Epoch::Founding);
}

#[test]
fn ledger_breaking_conservation_is_rejected() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::open(dir.path()).unwrap();
    let contract = AllocationContract::new(ContractConfig::default()).unwrap();
    store.save_ledger(&contract.export().ledger).unwrap();

    let path = store.path_for(DocumentKind::Ledger);
    let mut doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    doc["body"]["epoch_balances"]["abundance"] = serde_json::json!(1);
    std::fs::write(&path, serde_json::to_vec(&doc).unwrap()).unwrap();

    assert!(matches!(
        store.load_ledger(),
        Err(StorageError::Ledger(_))
    ));
}

#[test]
fn missing_documents_load_as_none() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::open(dir.path()).unwrap();
    assert!(!store.is_initialized().unwrap());
    assert!(store.load_chain().unwrap().is_none());
    assert!(store.load_ledger().unwrap().is_none());
    assert!(store.load_archive().unwrap().is_none());
}
