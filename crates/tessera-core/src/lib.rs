//! # Tessera Core
//!
//! Ledger core for the Tessera contribution-reward system.
//!
//! This crate provides the append-only, hash-linked record:
//! - `Transaction` - immutable, content-addressed entry with an opaque payload
//! - `Block` - mined batch of transactions linked to its predecessor
//! - `Chain` - genesis-rooted block sequence plus the pending buffer
//!
//! The chain knows nothing about tokenomics. Callers sequence submissions,
//! evaluations and allocations into transactions and periodically mine them.
//!
//! ```text
//!   pending ──mine──► ┌─────────┐    ┌─────────┐    ┌─────────┐
//!                     │ block 0 │◄───│ block 1 │◄───│ block 2 │
//!                     │ genesis │    │ nonce n │    │ nonce m │
//!                     └─────────┘    └─────────┘    └─────────┘
//! ```

pub mod block;
pub mod chain;
pub mod error;
pub mod hash;
pub mod transaction;
pub mod types;

pub use block::{Block, BlockHeader};
pub use chain::{Chain, ChainSnapshot, ChainStats, MiningBudget};
pub use error::{ChainError, Result};
pub use transaction::{Transaction, TransactionKind};
pub use types::{now_millis, ContentHash};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::block::Block;
    pub use crate::chain::{Chain, MiningBudget};
    pub use crate::error::{ChainError, Result};
    pub use crate::transaction::{Transaction, TransactionKind};
    pub use crate::types::*;
}
