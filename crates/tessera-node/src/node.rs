//! Tessera node
//!
//! Sequences every state change: the contract decides, the chain records the
//! step as a transaction, and after each mined block the epoch controller
//! gets a chance to advance, the mirror is resynced and the three documents
//! are persisted.

use crate::config::NodeConfig;
use crate::entries::{AllocationEntry, EvaluationEntry, SubmissionEntry};
use crate::metrics::NodeMetrics;
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tessera_contract::{
    AllocationAttempt, AllocationContract, AllocationOutcome, ContractStats, Evaluation, Evaluator,
    MirrorLayer, Submission, SubmissionPayload,
};
use tessera_core::{Block, Chain, ChainError, ChainStats, ContentHash, MiningBudget, Transaction, TransactionKind};
use tessera_economics::{AllocationQuote, ContributionTier, Epoch, EpochStats, LedgerStats};
use tessera_storage::{FileStore, StateStore};
use tokio::sync::mpsc;

/// Combined node statistics
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeStats {
    pub name: String,
    pub chain: ChainStats,
    pub contract: ContractStats,
    pub epochs: EpochStats,
    pub ledger: LedgerStats,
    pub mirror_in_sync: bool,
}

/// Single-process Tessera node
pub struct TesseraNode {
    config: NodeConfig,
    chain: Arc<Chain>,
    contract: Arc<AllocationContract>,
    mirror: MirrorLayer,
    store: Arc<dyn StateStore>,
    metrics: Option<NodeMetrics>,

    /// Set on shutdown; aborts an in-flight nonce search
    cancel: Arc<AtomicBool>,
}

impl TesseraNode {
    /// Open a node over `store`, restoring persisted state when present
    pub fn open(config: NodeConfig, store: Arc<dyn StateStore>) -> anyhow::Result<Self> {
        config.validate()?;

        let chain = match store.load_chain().context("failed to load chain")? {
            Some(chain) => {
                if chain.difficulty() != config.chain.difficulty {
                    tracing::warn!(
                        stored = chain.difficulty(),
                        configured = config.chain.difficulty,
                        "Keeping stored chain difficulty"
                    );
                }
                chain
            }
            None => Chain::with_difficulty(config.chain.difficulty),
        };

        let archive = store.load_archive().context("failed to load archive")?;
        let ledger = store.load_ledger().context("failed to load ledger")?;
        let contract = match (archive, ledger) {
            (Some(archive), Some(ledger)) => {
                AllocationContract::restore(config.contract.locked_epoch_policy, archive, ledger)
                    .context("failed to restore contract state")?
            }
            (None, None) if chain.height() > 0 => {
                bail!("chain has {} blocks but contract state is missing", chain.height())
            }
            (None, None) => AllocationContract::new(config.contract_config()?)?,
            (Some(_), None) => bail!("archive present without ledger"),
            (None, Some(_)) => bail!("ledger present without archive"),
        };

        let metrics = if config.metrics.enabled {
            Some(NodeMetrics::new(&config.metrics)?)
        } else {
            None
        };

        let node = Self {
            config,
            chain: Arc::new(chain),
            contract: Arc::new(contract),
            mirror: MirrorLayer::new(),
            store,
            metrics,
            cancel: Arc::new(AtomicBool::new(false)),
        };
        node.sync_mirror();
        node.refresh_gauges();

        tracing::info!(
            name = %node.config.node.name,
            height = node.chain.height(),
            epoch = %node.contract.current_epoch(),
            "Node opened"
        );
        Ok(node)
    }

    /// Open a node backed by files in the configured data directory
    pub fn from_config(config: NodeConfig) -> anyhow::Result<Self> {
        let store = FileStore::open(config.data_dir())?;
        Self::open(config, Arc::new(store))
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn chain(&self) -> &Arc<Chain> {
        &self.chain
    }

    pub fn contract(&self) -> &Arc<AllocationContract> {
        &self.contract
    }

    pub fn mirror(&self) -> &MirrorLayer {
        &self.mirror
    }

    pub fn metrics(&self) -> Option<&NodeMetrics> {
        self.metrics.as_ref()
    }

    /// Register a contribution and queue its submission transaction
    pub fn submit(&self, payload: SubmissionPayload) -> anyhow::Result<ContentHash> {
        payload.validate()?;
        // Built first so an oversized transaction never leaves a contract record behind
        let entry = SubmissionEntry::new(payload.content_hash(), payload.clone());
        let tx = Transaction::from_json(TransactionKind::Submission, payload.contributor.clone(), &entry)?;
        tx.validate()?;

        let hash = self.contract.submit(payload)?;
        self.chain.submit(tx)?;
        if let Some(metrics) = &self.metrics {
            metrics.submissions.inc();
        }
        Ok(hash)
    }

    /// Record an evaluation obtained elsewhere
    pub fn evaluate(&self, hash: ContentHash, evaluation: Evaluation) -> anyhow::Result<Submission> {
        let submission = self.contract.record_evaluation(hash, evaluation)?;
        self.record_evaluation(&submission)?;
        Ok(submission)
    }

    /// Evaluate through an external evaluator
    pub fn evaluate_with(
        &self,
        hash: ContentHash,
        evaluator: &dyn Evaluator,
    ) -> anyhow::Result<Submission> {
        let submission = self.contract.evaluate_with(hash, evaluator)?;
        self.record_evaluation(&submission)?;
        Ok(submission)
    }

    fn record_evaluation(&self, submission: &Submission) -> anyhow::Result<()> {
        let tx = Transaction::from_json(
            TransactionKind::Evaluation,
            self.config.node.name.clone(),
            &EvaluationEntry::from(submission),
        )?;
        self.chain.submit(tx)?;
        if let Some(metrics) = &self.metrics {
            metrics.evaluations.inc();
        }
        Ok(())
    }

    /// Allocate every outstanding tier; successful attempts are queued on the chain
    pub fn allocate(&self, hash: ContentHash) -> anyhow::Result<AllocationOutcome> {
        let outcome = self.contract.allocate(hash)?;
        for attempt in outcome.attempts.iter().filter(|a| a.success) {
            let entry = AllocationEntry::new(hash, outcome.contributor.clone(), outcome.score, attempt);
            self.record_allocation(&entry)?;
        }
        if let Some(metrics) = &self.metrics {
            metrics.record_outcome(&outcome);
        }
        Ok(outcome)
    }

    /// Allocate one tier against an explicit epoch
    pub fn request_allocation(
        &self,
        hash: ContentHash,
        epoch: Epoch,
        tier: ContributionTier,
    ) -> anyhow::Result<AllocationAttempt> {
        let attempt = self.contract.request_allocation(hash, epoch, tier)?;
        if attempt.success {
            let submission = self
                .contract
                .submission(&hash)
                .context("allocated submission disappeared")?;
            let entry = AllocationEntry::new(
                hash,
                submission.contributor(),
                submission.score.unwrap_or_default(),
                &attempt,
            );
            self.record_allocation(&entry)?;
        }
        if let Some(metrics) = &self.metrics {
            metrics.record_attempt(&attempt);
        }
        Ok(attempt)
    }

    fn record_allocation(&self, entry: &AllocationEntry) -> anyhow::Result<()> {
        let tx = Transaction::from_json(
            TransactionKind::Allocation,
            self.config.node.name.clone(),
            entry,
        )?;
        self.chain.submit(tx)?;
        Ok(())
    }

    /// Quotes from the mirror for an evaluated submission's tiers
    pub fn preview(&self, hash: ContentHash) -> anyhow::Result<Vec<AllocationQuote>> {
        let submission = self
            .contract
            .submission(&hash)
            .with_context(|| format!("unknown submission {hash}"))?;
        let Some(evaluation) = submission.evaluation else {
            bail!("submission {hash} has not been evaluated");
        };
        Ok(self
            .mirror
            .preview_evaluation(&evaluation, &submission.remaining_tiers())?)
    }

    /// Budget bounded by configuration and tied to the shutdown flag
    pub fn mining_budget(&self) -> MiningBudget {
        MiningBudget::new(self.config.chain.max_mining_attempts).with_cancel(Arc::clone(&self.cancel))
    }

    /// Mine the pending buffer, then advance epochs, resync the mirror and persist
    ///
    /// Returns `None` when nothing is pending.
    pub fn mine_pending(&self, budget: &MiningBudget) -> anyhow::Result<Option<Block>> {
        let pending = self.chain.pending();
        if pending.is_empty() {
            return Ok(None);
        }
        let attached_score = pending
            .iter()
            .filter(|tx| tx.kind() == TransactionKind::Evaluation)
            .filter_map(|tx| tx.decode_payload::<EvaluationEntry>().ok())
            .filter_map(|entry| entry.score)
            .max();

        let started = Instant::now();
        let block = match self.chain.mine(&self.config.node.name, attached_score, budget) {
            Ok(block) => block,
            Err(ChainError::NoPendingTransactions) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if let Some(epoch) = self.contract.auto_advance() {
            tracing::info!(%epoch, height = block.index(), "Epoch advanced after block");
        }
        self.sync_mirror();
        self.persist()?;

        if let Some(metrics) = &self.metrics {
            metrics.blocks_mined.inc();
        }
        self.refresh_gauges();
        tracing::debug!(
            height = block.index(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Block committed"
        );
        Ok(Some(block))
    }

    /// Replace mirror state with the canonical snapshot
    pub fn sync_mirror(&self) {
        let snapshot = self.contract.reconciliation_snapshot(self.chain.height());
        self.mirror.sync_from_canonical(&snapshot);
    }

    pub fn mirror_in_sync(&self) -> bool {
        self.mirror
            .matches(&self.contract.reconciliation_snapshot(self.chain.height()))
    }

    /// Write chain, ledger and archive documents
    pub fn persist(&self) -> anyhow::Result<()> {
        let export = self.contract.export();
        self.store.save_chain(&self.chain.to_snapshot())?;
        self.store.save_ledger(&export.ledger)?;
        self.store.save_archive(&export.archive)?;
        tracing::debug!(height = self.chain.height(), "State persisted");
        Ok(())
    }

    /// Check chain integrity and supply conservation
    pub fn verify(&self) -> anyhow::Result<()> {
        self.chain.verify().context("chain integrity check failed")?;
        self.contract
            .check_conservation()
            .context("supply conservation check failed")?;
        Ok(())
    }

    pub fn stats(&self) -> NodeStats {
        NodeStats {
            name: self.config.node.name.clone(),
            chain: self.chain.stats(),
            contract: self.contract.stats(),
            epochs: self.contract.epoch_stats(),
            ledger: self.contract.ledger_stats(),
            mirror_in_sync: self.mirror_in_sync(),
        }
    }

    /// Abort any in-flight nonce search
    pub fn shutdown(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    fn refresh_gauges(&self) {
        let Some(metrics) = &self.metrics else {
            return;
        };
        metrics.chain_height.set(self.chain.height() as i64);
        metrics
            .current_epoch
            .set(self.contract.current_epoch().index() as i64);
        metrics.set_distributed(self.contract.ledger_stats().distributed);
    }

    /// Mine on a fixed interval until `shutdown_rx` fires or closes
    pub async fn run_miner(self: Arc<Self>, mut shutdown_rx: mpsc::Receiver<()>) {
        let interval = self.config.chain.mining_interval();
        tracing::info!(
            interval_ms = self.config.chain.mining_interval_ms,
            difficulty = self.chain.difficulty(),
            "Starting periodic miner"
        );

        let mut last_round = Instant::now();
        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::info!("Miner shutting down");
                    break;
                }
                _ = tokio::time::sleep(interval.saturating_sub(last_round.elapsed())) => {
                    let node = Arc::clone(&self);
                    let mut task = tokio::task::spawn_blocking(move || {
                        let budget = node.mining_budget();
                        node.mine_pending(&budget)
                    });

                    let result = tokio::select! {
                        result = &mut task => result,
                        _ = shutdown_rx.recv() => {
                            self.shutdown();
                            let _ = task.await;
                            tracing::info!("Miner shutting down");
                            break;
                        }
                    };
                    match result {
                        Ok(Ok(Some(block))) => {
                            tracing::debug!(height = block.index(), "Mining round produced a block");
                        }
                        Ok(Ok(None)) => tracing::trace!("Nothing to mine"),
                        Ok(Err(e)) => tracing::warn!(error = %e, "Mining round failed"),
                        Err(e) => tracing::error!(error = %e, "Mining task failed"),
                    }
                    last_round = Instant::now();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_storage::MemoryStore;

    fn test_config() -> NodeConfig {
        let mut config = NodeConfig::default();
        config.chain.difficulty = 2;
        config.metrics.namespace = "test".to_string();
        config
    }

    fn open() -> TesseraNode {
        TesseraNode::open(test_config(), Arc::new(MemoryStore::new())).unwrap()
    }

    #[test]
    fn test_fresh_node() {
        let node = open();
        assert_eq!(node.chain().height(), 0);
        assert_eq!(node.contract().current_epoch(), Epoch::Founding);
        assert!(node.mirror_in_sync());
        node.verify().unwrap();
    }

    #[test]
    fn test_mine_empty_is_none() {
        let node = open();
        let block = node.mine_pending(&node.mining_budget()).unwrap();
        assert!(block.is_none());
    }

    #[test]
    fn test_rejected_submission_is_not_recorded() {
        let node = open();
        let payload = SubmissionPayload::new("alice", "", vec![]);
        assert!(node.submit(payload).is_err());
        assert_eq!(node.chain().pending_count(), 0);
        assert_eq!(node.contract().stats().submissions, 0);
    }

    #[test]
    fn test_evaluation_score_attached_to_block() {
        let node = open();
        let hash = node
            .submit(SubmissionPayload::new("alice", "proof", vec!["science".into()]))
            .unwrap();
        node.evaluate(hash, Evaluation::approved(8500, 9000, 8000)).unwrap();

        let block = node.mine_pending(&node.mining_budget()).unwrap().unwrap();
        assert_eq!(block.attached_score(), Some(6120));
        assert_eq!(block.transactions().len(), 2);
    }

    #[test]
    fn test_incomplete_state_rejected() {
        let store = Arc::new(MemoryStore::new());
        store
            .save_ledger(&tessera_economics::TokenSupplyLedger::default())
            .unwrap();
        assert!(TesseraNode::open(test_config(), store).is_err());
    }
}
