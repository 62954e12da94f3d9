//! Block - a mined, hash-linked batch of transactions
//!
//! ```text
//! hash = BLAKE3(index || previous_hash || canonical(transactions) || timestamp || nonce)
//! ```
//!
//! The proposer and the attached score are metadata carried alongside the
//! header; they are not covered by the hash.

use crate::hash::FieldHasher;
use crate::transaction::Transaction;
use crate::types::{constants, ContentHash};
use serde::{Deserialize, Serialize};

/// Candidate header fields that feed the proof-of-work search
#[derive(Clone, Debug)]
pub struct BlockHeader {
    pub index: u64,
    pub previous_hash: ContentHash,
    pub timestamp: i64,
    encoded_transactions: Vec<u8>,
}

impl BlockHeader {
    /// Build a header, canonically encoding the transactions once
    pub fn new(
        index: u64,
        previous_hash: ContentHash,
        transactions: &[Transaction],
        timestamp: i64,
    ) -> Self {
        Self {
            index,
            previous_hash,
            timestamp,
            encoded_transactions: encode_transactions(transactions),
        }
    }

    /// Hash of the header with the given nonce
    pub fn hash_with_nonce(&self, nonce: u64) -> ContentHash {
        FieldHasher::new()
            .u64(self.index)
            .fixed(self.previous_hash.as_bytes())
            .field(&self.encoded_transactions)
            .i64(self.timestamp)
            .u64(nonce)
            .finalize()
    }
}

/// Canonical, order-preserving encoding of a transaction list
pub fn encode_transactions(transactions: &[Transaction]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(transactions.len() as u64).to_be_bytes());
    for tx in transactions {
        let bytes = tx.canonical_bytes();
        out.extend_from_slice(&(bytes.len() as u64).to_be_bytes());
        out.extend_from_slice(&bytes);
    }
    out
}

/// Immutable block once mined
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    index: u64,
    previous_hash: ContentHash,
    transactions: Vec<Transaction>,
    timestamp: i64,
    nonce: u64,
    hash: ContentHash,
    proposer: String,
    attached_score: Option<u32>,
}

impl Block {
    /// Deterministic genesis block
    pub fn genesis() -> Self {
        let header = BlockHeader::new(0, ContentHash::ZERO, &[], constants::GENESIS_TIMESTAMP);
        let hash = header.hash_with_nonce(0);
        Self::from_solved(
            header,
            Vec::new(),
            0,
            hash,
            constants::GENESIS_PROPOSER.to_string(),
            None,
        )
    }

    /// Assemble a block from a solved header
    pub(crate) fn from_solved(
        header: BlockHeader,
        transactions: Vec<Transaction>,
        nonce: u64,
        hash: ContentHash,
        proposer: String,
        attached_score: Option<u32>,
    ) -> Self {
        Self {
            index: header.index,
            previous_hash: header.previous_hash,
            transactions,
            timestamp: header.timestamp,
            nonce,
            hash,
            proposer,
            attached_score,
        }
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn previous_hash(&self) -> ContentHash {
        self.previous_hash
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Stored hash
    pub fn hash(&self) -> ContentHash {
        self.hash
    }

    pub fn proposer(&self) -> &str {
        &self.proposer
    }

    pub fn attached_score(&self) -> Option<u32> {
        self.attached_score
    }

    /// Recompute the hash from the stored fields
    pub fn recompute_hash(&self) -> ContentHash {
        BlockHeader::new(
            self.index,
            self.previous_hash,
            &self.transactions,
            self.timestamp,
        )
        .hash_with_nonce(self.nonce)
    }

    /// Whether the stored hash meets the given difficulty
    pub fn meets_difficulty(&self, difficulty: u32) -> bool {
        self.hash.leading_zero_bits() >= difficulty
    }

    #[cfg(test)]
    pub(crate) fn transactions_mut(&mut self) -> &mut Vec<Transaction> {
        &mut self.transactions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::TransactionKind;

    #[test]
    fn test_genesis_deterministic() {
        let a = Block::genesis();
        let b = Block::genesis();

        assert_eq!(a, b);
        assert_eq!(a.index(), 0);
        assert_eq!(a.previous_hash(), ContentHash::ZERO);
        assert_eq!(a.recompute_hash(), a.hash());
    }

    #[test]
    fn test_header_hash_depends_on_nonce_and_transactions() {
        let txs = vec![Transaction::with_timestamp(TransactionKind::Submission, "a", "{}", 1)];
        let header = BlockHeader::new(1, ContentHash::ZERO, &txs, 5);
        assert_ne!(header.hash_with_nonce(0), header.hash_with_nonce(1));

        let other = BlockHeader::new(1, ContentHash::ZERO, &[], 5);
        assert_ne!(header.hash_with_nonce(0), other.hash_with_nonce(0));
    }

    #[test]
    fn test_transaction_order_matters() {
        let a = Transaction::with_timestamp(TransactionKind::Submission, "a", "{}", 1);
        let b = Transaction::with_timestamp(TransactionKind::Submission, "b", "{}", 1);

        assert_ne!(
            encode_transactions(&[a.clone(), b.clone()]),
            encode_transactions(&[b, a])
        );
    }

    #[test]
    fn test_metadata_outside_hash() {
        let txs = vec![Transaction::with_timestamp(TransactionKind::Submission, "a", "{}", 1)];
        let header = BlockHeader::new(1, ContentHash::ZERO, &txs, 5);
        let hash = header.hash_with_nonce(9);

        let a = Block::from_solved(header.clone(), txs.clone(), 9, hash, "p1".into(), Some(10));
        let b = Block::from_solved(header, txs, 9, hash, "p2".into(), None);
        assert_eq!(a.recompute_hash(), b.recompute_hash());
        assert_eq!(a.recompute_hash(), hash);
    }
}
