//! Node configuration types
//!
//! Loaded from an optional TOML file layered with `TESSERA__SECTION__KEY`
//! environment overrides, e.g. `TESSERA__CHAIN__DIFFICULTY=12`.

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tessera_contract::{ContractConfig, LockedEpochPolicy};
use tessera_core::types::constants as chain_constants;
use tessera_economics::{EpochThresholds, TokenomicsParams, ONE_TSR};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "TESSERA";

/// Complete node configuration
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Node identity and data location
    #[serde(default)]
    pub node: NodeSettings,

    /// Ledger core parameters
    #[serde(default)]
    pub chain: ChainConfig,

    /// Supply and epoch parameters
    #[serde(default)]
    pub tokenomics: TokenomicsConfig,

    /// Allocation contract behaviour
    #[serde(default)]
    pub contract: ContractSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl NodeConfig {
    /// Load from an optional file plus environment overrides
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let config: NodeConfig = builder
            .build()
            .context("failed to read configuration")?
            .try_deserialize()
            .context("invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject inconsistent values
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.node.name.trim().is_empty() {
            bail!("node.name must not be empty");
        }
        if self.chain.difficulty > 64 {
            bail!("chain.difficulty must be at most 64, got {}", self.chain.difficulty);
        }
        if self.chain.max_mining_attempts == 0 {
            bail!("chain.max_mining_attempts must be positive");
        }
        if self.chain.mining_interval_ms == 0 {
            bail!("chain.mining_interval_ms must be positive");
        }
        self.epoch_thresholds()?;
        self.tokenomics_params()
            .validate()
            .context("invalid tokenomics section")?;
        if self.metrics.namespace.trim().is_empty() {
            bail!("metrics.namespace must not be empty");
        }
        Ok(())
    }

    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.node.data_dir)
    }

    pub fn tokenomics_params(&self) -> TokenomicsParams {
        TokenomicsParams {
            total_supply: u128::from(self.tokenomics.total_supply_tsr) * ONE_TSR,
            base_reward_unit: u128::from(self.tokenomics.base_reward_tsr) * ONE_TSR,
            halving_unit: self.tokenomics.halving_unit,
        }
    }

    pub fn epoch_thresholds(&self) -> anyhow::Result<EpochThresholds> {
        let values: [u64; 4] = self
            .tokenomics
            .epoch_thresholds
            .as_slice()
            .try_into()
            .map_err(|_| {
                anyhow::anyhow!(
                    "tokenomics.epoch_thresholds needs 4 values, got {}",
                    self.tokenomics.epoch_thresholds.len()
                )
            })?;
        Ok(EpochThresholds::new(values)?)
    }

    pub fn contract_config(&self) -> anyhow::Result<ContractConfig> {
        Ok(ContractConfig {
            locked_epoch_policy: self.contract.locked_epoch_policy,
            thresholds: self.epoch_thresholds()?,
            tokenomics: self.tokenomics_params(),
        })
    }

    /// Render as TOML
    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Basic node settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSettings {
    /// Node name, used as block proposer and transaction sender
    #[serde(default = "default_node_name")]
    pub name: String,

    /// Data directory
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_node_name() -> String {
    "tessera-node".to_string()
}

fn default_data_dir() -> String {
    "./data".to_string()
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            name: default_node_name(),
            data_dir: default_data_dir(),
        }
    }
}

/// Ledger core configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Leading zero bits required of a block hash
    #[serde(default = "default_difficulty")]
    pub difficulty: u32,

    /// Nonce budget per mining round
    #[serde(default = "default_max_mining_attempts")]
    pub max_mining_attempts: u64,

    /// Periodic miner interval
    #[serde(default = "default_mining_interval_ms")]
    pub mining_interval_ms: u64,
}

fn default_difficulty() -> u32 {
    chain_constants::DEFAULT_DIFFICULTY
}

fn default_max_mining_attempts() -> u64 {
    chain_constants::DEFAULT_MINING_ATTEMPTS
}

fn default_mining_interval_ms() -> u64 {
    5_000
}

impl ChainConfig {
    pub fn mining_interval(&self) -> Duration {
        Duration::from_millis(self.mining_interval_ms)
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            difficulty: default_difficulty(),
            max_mining_attempts: default_max_mining_attempts(),
            mining_interval_ms: default_mining_interval_ms(),
        }
    }
}

/// Supply and epoch configuration, amounts in whole TSR
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenomicsConfig {
    #[serde(default = "default_total_supply_tsr")]
    pub total_supply_tsr: u64,

    #[serde(default = "default_base_reward_tsr")]
    pub base_reward_tsr: u64,

    /// Cumulative coherence per halving
    #[serde(default = "default_halving_unit")]
    pub halving_unit: u64,

    /// Unlock progress per epoch, Founding first
    #[serde(default = "default_epoch_thresholds")]
    pub epoch_thresholds: Vec<u64>,
}

fn default_total_supply_tsr() -> u64 {
    1_000_000_000
}

fn default_base_reward_tsr() -> u64 {
    100
}

fn default_halving_unit() -> u64 {
    tessera_economics::HALVING_UNIT
}

fn default_epoch_thresholds() -> Vec<u64> {
    EpochThresholds::default().as_array().to_vec()
}

impl Default for TokenomicsConfig {
    fn default() -> Self {
        Self {
            total_supply_tsr: default_total_supply_tsr(),
            base_reward_tsr: default_base_reward_tsr(),
            halving_unit: default_halving_unit(),
            epoch_thresholds: default_epoch_thresholds(),
        }
    }
}

/// Allocation contract settings
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractSettings {
    #[serde(default)]
    pub locked_epoch_policy: LockedEpochPolicy,
}

/// Log output format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Metrics configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,

    /// Prefix for every metric name
    #[serde(default = "default_metrics_namespace")]
    pub namespace: String,
}

fn default_metrics_enabled() -> bool {
    true
}

fn default_metrics_namespace() -> String {
    "tessera".to_string()
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
            namespace: default_metrics_namespace(),
        }
    }
}
