//! Prometheus metrics
//!
//! Collected in a private registry and rendered on demand with the text
//! exposition format. No listener is started.

use crate::config::MetricsConfig;
use prometheus::{Encoder, Gauge, IntCounter, IntGauge, Opts, Registry, TextEncoder};
use tessera_contract::{AllocationAttempt, AllocationOutcome};
use tessera_economics::ONE_TSR;

/// Node metric handles
#[derive(Clone)]
pub struct NodeMetrics {
    registry: Registry,
    pub submissions: IntCounter,
    pub evaluations: IntCounter,
    pub allocations_succeeded: IntCounter,
    pub allocations_failed: IntCounter,
    pub blocks_mined: IntCounter,
    pub halvings: IntCounter,
    pub chain_height: IntGauge,
    pub current_epoch: IntGauge,
    pub distributed_supply: Gauge,
}

impl NodeMetrics {
    /// Create and register all metrics
    pub fn new(config: &MetricsConfig) -> anyhow::Result<Self> {
        let registry = Registry::new();
        let ns = config.namespace.as_str();
        let opts = |name: &str, help: &str| Opts::new(name, help).namespace(ns);

        let submissions = IntCounter::with_opts(opts("submissions_total", "Submissions accepted"))?;
        let evaluations = IntCounter::with_opts(opts("evaluations_total", "Evaluations recorded"))?;
        let allocations_succeeded = IntCounter::with_opts(opts(
            "allocations_succeeded_total",
            "Tier allocations committed",
        ))?;
        let allocations_failed = IntCounter::with_opts(opts(
            "allocations_failed_total",
            "Tier allocations refused by availability rules",
        ))?;
        let blocks_mined = IntCounter::with_opts(opts("blocks_mined_total", "Blocks mined"))?;
        let halvings = IntCounter::with_opts(opts("halvings_total", "Usage-driven halvings"))?;
        let chain_height = IntGauge::with_opts(opts("chain_height", "Index of the chain tip"))?;
        let current_epoch = IntGauge::with_opts(opts(
            "current_epoch",
            "Current epoch index, 0 = founding",
        ))?;
        let distributed_supply = Gauge::with_opts(opts(
            "distributed_supply_tsr",
            "Rewards allocated so far in TSR",
        ))?;

        registry.register(Box::new(submissions.clone()))?;
        registry.register(Box::new(evaluations.clone()))?;
        registry.register(Box::new(allocations_succeeded.clone()))?;
        registry.register(Box::new(allocations_failed.clone()))?;
        registry.register(Box::new(blocks_mined.clone()))?;
        registry.register(Box::new(halvings.clone()))?;
        registry.register(Box::new(chain_height.clone()))?;
        registry.register(Box::new(current_epoch.clone()))?;
        registry.register(Box::new(distributed_supply.clone()))?;

        Ok(Self {
            registry,
            submissions,
            evaluations,
            allocations_succeeded,
            allocations_failed,
            blocks_mined,
            halvings,
            chain_height,
            current_epoch,
            distributed_supply,
        })
    }

    pub fn record_attempt(&self, attempt: &AllocationAttempt) {
        if attempt.success {
            self.allocations_succeeded.inc();
        } else {
            self.allocations_failed.inc();
        }
        self.halvings.inc_by(attempt.halvings);
    }

    pub fn record_outcome(&self, outcome: &AllocationOutcome) {
        for attempt in &outcome.attempts {
            self.record_attempt(attempt);
        }
    }

    pub fn set_distributed(&self, base_units: u128) {
        self.distributed_supply
            .set(base_units as f64 / ONE_TSR as f64);
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Text exposition of every registered metric
    pub fn render(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
