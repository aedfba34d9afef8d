//! Pending buffer for captured transactions awaiting batching.
//!
//! Matched transactions are appended in arrival order. Whenever the buffer
//! holds at least `threshold` entries, exactly the oldest `threshold` are
//! removed as one closed batch; the remainder stays buffered across blocks.
//! The buffer is never flushed partially and is not durable.

use std::collections::VecDeque;

use seqroll_types::{CapturedTransaction, Result, SequencerError, TxHash, constants};

/// FIFO of captured transactions, drained in fixed-size chunks.
#[derive(Debug)]
pub struct PendingBuffer {
    /// Transactions in arrival order (front = oldest).
    entries: VecDeque<CapturedTransaction>,
    /// Number of transactions per closed batch.
    threshold: usize,
}

impl PendingBuffer {
    /// Create a buffer with the default threshold.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
            threshold: constants::DEFAULT_BATCH_THRESHOLD,
        }
    }

    /// Create a buffer closing batches of `threshold` transactions.
    ///
    /// # Errors
    /// Returns `InvalidThreshold` if `threshold` is zero.
    pub fn with_threshold(threshold: usize) -> Result<Self> {
        if threshold == 0 {
            return Err(SequencerError::InvalidThreshold(threshold));
        }
        Ok(Self {
            entries: VecDeque::with_capacity(threshold),
            threshold,
        })
    }

    /// Append a captured transaction.
    pub fn push(&mut self, tx: CapturedTransaction) {
        self.entries.push_back(tx);
    }

    /// Remove and return the oldest `threshold` transactions, if that many
    /// are buffered.
    pub fn take_ready(&mut self) -> Option<Vec<CapturedTransaction>> {
        if self.entries.len() < self.threshold {
            return None;
        }
        Some(self.entries.drain(..self.threshold).collect())
    }

    /// Whether a transaction with this hash is already buffered.
    #[must_use]
    pub fn contains(&self, tx_hash: &TxHash) -> bool {
        self.entries.iter().any(|tx| tx.tx_hash == *tx_hash)
    }

    /// Block number of the oldest buffered transaction.
    #[must_use]
    pub fn oldest_block(&self) -> Option<u64> {
        self.entries.front().map(|tx| tx.block_number)
    }

    /// Buffered transactions, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &CapturedTransaction> {
        self.entries.iter()
    }

    /// Number of transactions currently buffered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for PendingBuffer {
    fn default() -> Self {
        Self::new()
    }
}
