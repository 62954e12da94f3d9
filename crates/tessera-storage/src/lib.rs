//! # Tessera Storage
//!
//! Persistent node state as three JSON documents in a data directory.
//!
//! ## Storage Layout
//!
//! - `chain.json` - blocks and pending transactions
//! - `ledger.json` - token supply ledger
//! - `archive.json` - submissions, contributor counters and epoch state
//!
//! Documents reference each other only by submission hash and by epoch and
//! tier names. Each file is replaced atomically via a temporary file and
//! rename.

pub mod document;
pub mod error;
pub mod store;

pub use document::{DocumentKind, FORMAT_VERSION};
pub use error::{Result, StorageError};
pub use store::{FileStore, MemoryStore, StateStore};
