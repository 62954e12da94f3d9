//! Integration tests for chain integrity
//!
//! Chains built from arbitrary submit/mine cycles must validate, and any
//! single-byte change to stored transactions must be rejected on load.

use proptest::prelude::*;
use tessera_core::{Chain, ChainError, ChainSnapshot, MiningBudget, Transaction, TransactionKind};

fn build_chain(batches: &[Vec<String>]) -> Chain {
    let chain = Chain::with_difficulty(4);
    for (round, batch) in batches.iter().enumerate() {
        for (i, payload) in batch.iter().enumerate() {
            let tx = Transaction::with_timestamp(
                TransactionKind::Evaluation,
                format!("sender-{round}-{i}"),
                payload.clone(),
                (round * 1000 + i) as i64,
            );
            chain.submit(tx).expect("submit");
        }
        if !batch.is_empty() {
            chain
                .mine("proposer", Some(round as u32), &MiningBudget::default())
                .expect("mine");
        }
    }
    chain
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 32,
        .. ProptestConfig::default()
    })]

    #[test]
    fn pbt_built_chains_validate(
        batches in prop::collection::vec(
            prop::collection::vec("[a-z0-9]{1,24}", 0..4),
            1..6,
        )
    ) {
        let chain = build_chain(&batches);
        prop_assert!(chain.validate());

        let expected: usize = batches.iter().map(|b| b.len()).sum();
        prop_assert_eq!(chain.stats().total_transactions, expected);
    }

    #[test]
    fn pbt_single_byte_tamper_fails_closed(
        payloads in prop::collection::vec("[a-z]{4,16}", 1..4),
        pick in any::<prop::sample::Index>(),
        byte in 0usize..4,
    ) {
        let chain = build_chain(&[payloads.clone()]);
        let json = chain.to_json().unwrap();
        let mut doc: serde_json::Value = serde_json::from_str(&json).unwrap();

        let target = pick.index(payloads.len());
        let payload = doc["blocks"][1]["transactions"][target]["payload"]
            .as_str()
            .unwrap()
            .to_string();
        let mut bytes = payload.into_bytes();
        let at = byte % bytes.len();
        bytes[at] = if bytes[at] == b'z' { b'a' } else { bytes[at] + 1 };
        doc["blocks"][1]["transactions"][target]["payload"] =
            serde_json::Value::String(String::from_utf8(bytes).unwrap());

        let snapshot: ChainSnapshot = serde_json::from_value(doc).unwrap();
        let err = Chain::from_snapshot(snapshot).err().unwrap();
        prop_assert!(err.is_integrity_failure());
    }
}

#[test]
fn tampered_block_hash_is_rejected() {
    let chain = build_chain(&[vec!["one".into()], vec!["two".into()]]);
    let mut doc: serde_json::Value = serde_json::from_str(&chain.to_json().unwrap()).unwrap();

    doc["blocks"][2]["nonce"] = serde_json::json!(doc["blocks"][2]["nonce"].as_u64().unwrap() + 1);

    let snapshot: ChainSnapshot = serde_json::from_value(doc).unwrap();
    assert_eq!(
        Chain::from_snapshot(snapshot).err(),
        Some(ChainError::BlockHashMismatch { index: 2 })
    );
}

#[test]
fn concurrent_submits_all_land() {
    use std::sync::Arc;
    use std::thread;

    let chain = Arc::new(Chain::with_difficulty(4));
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let chain = Arc::clone(&chain);
            thread::spawn(move || {
                for i in 0..25 {
                    let tx = Transaction::with_timestamp(
                        TransactionKind::Submission,
                        format!("worker-{t}"),
                        format!("{{\"i\":{i}}}"),
                        i,
                    );
                    chain.submit(tx).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(chain.pending_count(), 200);
    let block = chain.mine("miner", None, &MiningBudget::default()).unwrap();
    assert_eq!(block.transactions().len(), 200);
    assert!(chain.validate());
}
