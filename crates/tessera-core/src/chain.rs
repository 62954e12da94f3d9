//! Chain - append-only sequence of hash-linked blocks plus the pending buffer
//!
//! Invariants:
//! - the chain is never empty (genesis is always present)
//! - `blocks[i].index == i`
//! - `blocks[i].previous_hash == recompute(blocks[i - 1])`
//! - every stored hash equals its recomputation and meets the difficulty
//!
//! Integrity failures are reported, never repaired. Loading a snapshot whose
//! recomputed hashes disagree with the stored ones fails closed.

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::block::{Block, BlockHeader};
use crate::error::{ChainError, Result};
use crate::transaction::Transaction;
use crate::types::{constants, now_millis, ContentHash};

/// Transaction hash -> containing block index
type TxIndex = HashMap<ContentHash, u64>;

/// Caller-supplied bound on a single nonce search
#[derive(Clone, Debug)]
pub struct MiningBudget {
    /// Maximum nonces to try
    pub max_attempts: u64,
    cancel: Option<Arc<AtomicBool>>,
}

impl MiningBudget {
    pub fn new(max_attempts: u64) -> Self {
        Self {
            max_attempts,
            cancel: None,
        }
    }

    /// Attach a cancellation flag checked periodically during the search
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map(|flag| flag.load(Ordering::Relaxed))
            .unwrap_or(false)
    }
}

impl Default for MiningBudget {
    fn default() -> Self {
        Self::new(constants::DEFAULT_MINING_ATTEMPTS)
    }
}

/// Serializable, order-preserving chain state
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSnapshot {
    /// Proof-of-work difficulty in leading zero bits
    pub difficulty: u32,
    /// All blocks, genesis first
    pub blocks: Vec<Block>,
    /// Transactions not yet mined
    pub pending: Vec<Transaction>,
}

/// Chain statistics snapshot
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainStats {
    pub height: u64,
    pub block_count: usize,
    pub pending_transactions: usize,
    pub total_transactions: usize,
    pub tip_hash: ContentHash,
    pub difficulty: u32,
}

/// Queued transactions plus those drained by an in-progress mine
#[derive(Default)]
struct PendingBuffer {
    queue: Vec<Transaction>,
    in_flight: HashSet<ContentHash>,
}

impl PendingBuffer {
    fn contains(&self, hash: &ContentHash) -> bool {
        self.in_flight.contains(hash) || self.queue.iter().any(|p| p.hash() == *hash)
    }
}

/// The hash-linked ledger
pub struct Chain {
    difficulty: u32,

    /// Mined blocks, genesis first
    blocks: RwLock<Vec<Block>>,

    /// Transactions awaiting the next block
    pending: Mutex<PendingBuffer>,

    /// Location of every mined transaction
    tx_index: RwLock<TxIndex>,

    /// Held for the full duration of a nonce search
    mining: Mutex<()>,
}

impl Chain {
    /// Create a chain containing only genesis, with the default difficulty
    pub fn new() -> Self {
        Self::with_difficulty(constants::DEFAULT_DIFFICULTY)
    }

    /// Create a chain containing only genesis
    pub fn with_difficulty(difficulty: u32) -> Self {
        Self {
            difficulty,
            blocks: RwLock::new(vec![Block::genesis()]),
            pending: Mutex::new(PendingBuffer::default()),
            tx_index: RwLock::new(TxIndex::new()),
            mining: Mutex::new(()),
        }
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    /// Append a shape-validated transaction to the pending buffer
    pub fn submit(&self, tx: Transaction) -> Result<ContentHash> {
        tx.validate()?;
        let hash = tx.hash();

        let mut pending = self.pending.lock();
        if self.tx_index.read().contains_key(&hash) || pending.contains(&hash) {
            return Err(ChainError::DuplicateTransaction(hash));
        }
        pending.queue.push(tx);

        tracing::debug!(tx = %hash, pending = pending.queue.len(), "Transaction queued");
        Ok(hash)
    }

    /// Drain the pending buffer into a new block by searching for a nonce
    ///
    /// On budget exhaustion or cancellation the drained transactions are put
    /// back at the front of the buffer and the chain is unchanged.
    pub fn mine(
        &self,
        proposer: &str,
        attached_score: Option<u32>,
        budget: &MiningBudget,
    ) -> Result<Block> {
        let _guard = self.mining.try_lock().ok_or(ChainError::MiningInProgress)?;

        let transactions = {
            let mut pending = self.pending.lock();
            let drained = std::mem::take(&mut pending.queue);
            pending.in_flight = drained.iter().map(Transaction::hash).collect();
            drained
        };
        if transactions.is_empty() {
            return Err(ChainError::NoPendingTransactions);
        }

        let (index, previous_hash) = {
            let blocks = self.blocks.read();
            match blocks.last() {
                Some(tip) => (tip.index() + 1, tip.hash()),
                None => {
                    drop(blocks);
                    self.restore_pending(transactions);
                    return Err(ChainError::EmptyChain);
                }
            }
        };

        let header = BlockHeader::new(index, previous_hash, &transactions, now_millis());

        for nonce in 0..budget.max_attempts {
            if nonce % constants::CANCEL_CHECK_INTERVAL == 0 && budget.is_cancelled() {
                self.restore_pending(transactions);
                tracing::info!(index, attempts = nonce, "Mining cancelled");
                return Err(ChainError::MiningCancelled { attempts: nonce });
            }

            let hash = header.hash_with_nonce(nonce);
            if hash.leading_zero_bits() >= self.difficulty {
                let block = Block::from_solved(
                    header,
                    transactions,
                    nonce,
                    hash,
                    proposer.to_string(),
                    attached_score,
                );
                self.append(block.clone());

                tracing::info!(
                    index,
                    nonce,
                    hash = %hash,
                    transactions = block.transactions().len(),
                    "Block mined"
                );
                return Ok(block);
            }
        }

        self.restore_pending(transactions);
        tracing::warn!(index, attempts = budget.max_attempts, "Mining budget exhausted");
        Err(ChainError::MiningBudgetExhausted {
            attempts: budget.max_attempts,
        })
    }

    fn append(&self, block: Block) {
        {
            let mut blocks = self.blocks.write();
            let mut index = self.tx_index.write();
            for tx in block.transactions() {
                index.insert(tx.hash(), block.index());
            }
            blocks.push(block);
        }
        // tx_index already holds these hashes when in-flight ones are released
        self.pending.lock().in_flight.clear();
    }

    fn restore_pending(&self, mut drained: Vec<Transaction>) {
        let mut pending = self.pending.lock();
        pending.in_flight.clear();
        drained.append(&mut pending.queue);
        pending.queue = drained;
    }

    /// Recompute every hash and link; false on first mismatch
    pub fn validate(&self) -> bool {
        self.verify().is_ok()
    }

    /// Like [`Chain::validate`] but reports the first mismatch
    pub fn verify(&self) -> Result<()> {
        verify_blocks(&self.blocks.read(), self.difficulty)
    }

    pub fn height(&self) -> u64 {
        self.blocks.read().last().map(|b| b.index()).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.blocks.read().len()
    }

    /// Never true for a constructed chain
    pub fn is_empty(&self) -> bool {
        self.blocks.read().is_empty()
    }

    pub fn tip(&self) -> Option<Block> {
        self.blocks.read().last().cloned()
    }

    pub fn block(&self, index: u64) -> Option<Block> {
        self.blocks.read().get(index as usize).cloned()
    }

    /// Blocks in order, genesis first
    pub fn blocks(&self) -> Vec<Block> {
        self.blocks.read().clone()
    }

    pub fn pending(&self) -> Vec<Transaction> {
        self.pending.lock().queue.clone()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().queue.len()
    }

    /// Locate a mined transaction
    pub fn find_transaction(&self, hash: &ContentHash) -> Option<(u64, Transaction)> {
        let index = *self.tx_index.read().get(hash)?;
        let blocks = self.blocks.read();
        let tx = blocks
            .get(index as usize)?
            .transactions()
            .iter()
            .find(|tx| tx.hash() == *hash)?
            .clone();
        Some((index, tx))
    }

    pub fn stats(&self) -> ChainStats {
        let blocks = self.blocks.read();
        ChainStats {
            height: blocks.last().map(|b| b.index()).unwrap_or(0),
            block_count: blocks.len(),
            pending_transactions: self.pending.lock().queue.len(),
            total_transactions: blocks.iter().map(|b| b.transactions().len()).sum(),
            tip_hash: blocks.last().map(|b| b.hash()).unwrap_or(ContentHash::ZERO),
            difficulty: self.difficulty,
        }
    }

    /// Export the full state
    pub fn to_snapshot(&self) -> ChainSnapshot {
        ChainSnapshot {
            difficulty: self.difficulty,
            blocks: self.blocks.read().clone(),
            pending: self.pending.lock().queue.clone(),
        }
    }

    /// Rebuild a chain, failing closed on any integrity mismatch
    pub fn from_snapshot(snapshot: ChainSnapshot) -> Result<Self> {
        if let Err(e) = verify_blocks(&snapshot.blocks, snapshot.difficulty) {
            tracing::warn!(error = %e, "Rejected chain snapshot");
            return Err(e);
        }
        for tx in &snapshot.pending {
            tx.validate()?;
        }

        let mut index = TxIndex::new();
        for block in &snapshot.blocks {
            for tx in block.transactions() {
                index.insert(tx.hash(), block.index());
            }
        }

        Ok(Self {
            difficulty: snapshot.difficulty,
            blocks: RwLock::new(snapshot.blocks),
            pending: Mutex::new(PendingBuffer {
                queue: snapshot.pending,
                in_flight: HashSet::new(),
            }),
            tx_index: RwLock::new(index),
            mining: Mutex::new(()),
        })
    }

    /// Canonical JSON document
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_snapshot())?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: ChainSnapshot = serde_json::from_str(json)?;
        Self::from_snapshot(snapshot)
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self::new()
    }
}

/// Recompute hashes and links over a block sequence
pub fn verify_blocks(blocks: &[Block], difficulty: u32) -> Result<()> {
    let genesis = blocks.first().ok_or(ChainError::EmptyChain)?;
    if *genesis != Block::genesis() {
        return Err(ChainError::InvalidGenesis);
    }

    let mut previous: Option<ContentHash> = None;
    for (position, block) in blocks.iter().enumerate() {
        if block.index() != position as u64 {
            return Err(ChainError::IndexMismatch {
                position,
                index: block.index(),
            });
        }

        let recomputed = block.recompute_hash();
        if recomputed != block.hash() {
            return Err(ChainError::BlockHashMismatch {
                index: block.index(),
            });
        }

        for tx in block.transactions() {
            if tx.recompute_hash() != tx.hash() {
                return Err(ChainError::TransactionHashMismatch(tx.hash()));
            }
        }

        if let Some(prev) = previous {
            if block.previous_hash() != prev {
                return Err(ChainError::BrokenLink {
                    index: block.index(),
                });
            }
            if !block.meets_difficulty(difficulty) {
                return Err(ChainError::InsufficientWork {
                    index: block.index(),
                    difficulty,
                });
            }
        }
        previous = Some(recomputed);
    }
    Ok(())
}
