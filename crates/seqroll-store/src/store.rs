//! The `BatchStore` port.

use std::path::PathBuf;

use seqroll_types::{BatchRecord, Digest, Result, TxHash};

/// Durable storage for batch records, addressable by digest.
///
/// Every stored record satisfies `digest == compute_digest(state_updates)`;
/// `put` rejects anything else. Callers must serialize mutations (the
/// sequencer holds one lock around the whole store).
pub trait BatchStore: Send {
    /// All records, ordered by digest.
    fn list(&self) -> Vec<BatchRecord>;

    /// The record stored under `digest`.
    ///
    /// # Errors
    /// Returns `RecordNotFound` if there is none.
    fn get(&self, digest: &Digest) -> Result<BatchRecord>;

    /// Create or overwrite the record under `record.digest`.
    ///
    /// # Errors
    /// Returns `DigestMismatch` if the key does not match the contents, or
    /// an I/O error if the write fails (the store is then unchanged).
    fn put(&mut self, record: BatchRecord) -> Result<()>;

    /// Remove the record under `digest`.
    ///
    /// # Errors
    /// Returns `RecordNotFound` if there is none.
    fn delete(&mut self, digest: &Digest) -> Result<()>;

    /// The record containing `tx_hash` and the position of that update.
    fn locate(&self, tx_hash: &TxHash) -> Option<(BatchRecord, usize)>;

    /// Whether any stored record contains `tx_hash`.
    fn contains_tx(&self, tx_hash: &TxHash) -> bool {
        self.locate(tx_hash).is_some()
    }

    /// Remember transactions a fraud proof cut out of a committed batch.
    ///
    /// # Errors
    /// Returns an I/O error if the set cannot be persisted (the store is
    /// then unchanged).
    fn tombstone(&mut self, tx_hashes: &[TxHash]) -> Result<()>;

    /// Whether a fraud proof removed `tx_hash` from a committed batch.
    fn is_tombstoned(&self, tx_hash: &TxHash) -> bool;

    /// Committed to a stored batch, or tombstoned. Known transactions are
    /// never captured again.
    fn is_known(&self, tx_hash: &TxHash) -> bool {
        self.contains_tx(tx_hash) || self.is_tombstoned(tx_hash)
    }

    /// Next block height to process after a restart, if one was saved.
    fn checkpoint(&self) -> Option<u64>;

    /// Persist the next block height to process.
    fn save_checkpoint(&mut self, next_block: u64) -> Result<()>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records not yet finalized, ordered by digest.
    fn unfinalized(&self) -> Vec<BatchRecord> {
        self.list().into_iter().filter(|r| !r.finalized).collect()
    }
}

/// A record file that could not be loaded when the store was opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub path: PathBuf,
    pub reason: String,
}

/// What happened while loading an existing store from disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenReport {
    /// Records loaded and verified.
    pub loaded: usize,
    /// Files that were malformed or failed digest verification.
    pub skipped: Vec<SkippedRecord>,
}

impl OpenReport {
    /// `true` if every record file loaded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}
