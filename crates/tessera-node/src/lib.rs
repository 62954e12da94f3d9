//! # Tessera Node
//!
//! Single-process node composing the ledger core, the allocation contract,
//! the mirror layer and a state store, plus configuration, logging, metrics
//! and the periodic miner used by the `tessera` binary.

pub mod config;
pub mod entries;
pub mod logging;
pub mod metrics;
pub mod node;

pub use config::{LogFormat, LoggingConfig, MetricsConfig, NodeConfig};
pub use entries::{AllocationEntry, EvaluationEntry, SubmissionEntry};
pub use logging::init_logging;
pub use metrics::NodeMetrics;
pub use node::{NodeStats, TesseraNode};
