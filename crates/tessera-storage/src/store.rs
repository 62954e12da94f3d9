//! State stores
//!
//! A [`StateStore`] persists raw document bytes by kind. The typed helpers
//! validate on load: the chain is re-verified block by block and the ledger
//! must satisfy conservation, so a corrupted document never loads.

use crate::document::{decode, encode, DocumentKind};
use crate::error::{Result, StorageError};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tessera_contract::ContractArchive;
use tessera_core::{Chain, ChainSnapshot};
use tessera_economics::TokenSupplyLedger;

/// Document persistence backend
pub trait StateStore: Send + Sync {
    /// Replace a document atomically
    fn write_document(&self, kind: DocumentKind, bytes: &[u8]) -> Result<()>;

    /// Read a document, `None` if never written
    fn read_document(&self, kind: DocumentKind) -> Result<Option<Vec<u8>>>;

    fn save_chain(&self, snapshot: &ChainSnapshot) -> Result<()> {
        self.write_document(DocumentKind::Chain, &encode(DocumentKind::Chain, snapshot)?)
    }

    /// Load and fully verify the chain
    fn load_chain(&self) -> Result<Option<Chain>> {
        let Some(bytes) = self.read_document(DocumentKind::Chain)? else {
            return Ok(None);
        };
        let snapshot: ChainSnapshot = decode(DocumentKind::Chain, &bytes)?;
        Ok(Some(Chain::from_snapshot(snapshot)?))
    }

    fn save_ledger(&self, ledger: &TokenSupplyLedger) -> Result<()> {
        self.write_document(DocumentKind::Ledger, &encode(DocumentKind::Ledger, ledger)?)
    }

    /// Load the ledger, rejecting state that breaks its invariants
    fn load_ledger(&self) -> Result<Option<TokenSupplyLedger>> {
        let Some(bytes) = self.read_document(DocumentKind::Ledger)? else {
            return Ok(None);
        };
        let ledger: TokenSupplyLedger = decode(DocumentKind::Ledger, &bytes)?;
        Ok(Some(TokenSupplyLedger::from_state(ledger)?))
    }

    fn save_archive(&self, archive: &ContractArchive) -> Result<()> {
        self.write_document(DocumentKind::Archive, &encode(DocumentKind::Archive, archive)?)
    }

    fn load_archive(&self) -> Result<Option<ContractArchive>> {
        let Some(bytes) = self.read_document(DocumentKind::Archive)? else {
            return Ok(None);
        };
        let archive: ContractArchive = decode(DocumentKind::Archive, &bytes)?;
        archive.epochs.validate_state().map_err(tessera_contract::ContractError::from)?;
        Ok(Some(archive))
    }

    /// Whether any document has been written
    fn is_initialized(&self) -> Result<bool> {
        for kind in DocumentKind::ALL {
            if self.read_document(kind)?.is_some() {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Documents as JSON files in a data directory
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store, creating the directory if needed
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| StorageError::io(&dir, e))?;
        tracing::debug!(dir = %dir.display(), "File store opened");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, kind: DocumentKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }
}

impl StateStore for FileStore {
    fn write_document(&self, kind: DocumentKind, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(kind);
        let tmp = path.with_extension("json.tmp");

        let mut file = fs::File::create(&tmp).map_err(|e| StorageError::io(&tmp, e))?;
        file.write_all(bytes).map_err(|e| StorageError::io(&tmp, e))?;
        file.sync_all().map_err(|e| StorageError::io(&tmp, e))?;
        drop(file);
        fs::rename(&tmp, &path).map_err(|e| StorageError::io(&path, e))?;

        tracing::debug!(document = %kind, bytes = bytes.len(), "Document written");
        Ok(())
    }

    fn read_document(&self, kind: DocumentKind) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(kind);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io(path, e)),
        }
    }
}

/// In-memory store for tests and ephemeral nodes
pub struct MemoryStore {
    documents: RwLock<HashMap<DocumentKind, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore for MemoryStore {
    fn write_document(&self, kind: DocumentKind, bytes: &[u8]) -> Result<()> {
        self.documents.write().insert(kind, bytes.to_vec());
        Ok(())
    }

    fn read_document(&self, kind: DocumentKind) -> Result<Option<Vec<u8>>> {
        Ok(self.documents.read().get(&kind).cloned())
    }
}
