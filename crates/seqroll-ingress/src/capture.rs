//! Transaction capture: watch-list filtering and batch closing.
//!
//! `TransactionCapture` owns the watch list and the pending buffer. Each
//! observed transaction is checked against the watch list; matches are
//! appended to the buffer, and every time the buffer reaches its threshold
//! the oldest `threshold` entries are handed back as a closed batch.

use seqroll_types::{
    BlockContext, CapturedTransaction, ObservedBlock, ObservedTransaction, Result, TxHash,
};

use crate::{PendingBuffer, WatchList};

/// Filters incoming transactions and accumulates them into closed batches.
#[derive(Debug)]
pub struct TransactionCapture {
    watch_list: WatchList,
    buffer: PendingBuffer,
}

impl TransactionCapture {
    /// Create a capture stage closing batches of `threshold` transactions.
    ///
    /// # Errors
    /// Returns `InvalidThreshold` if `threshold` is zero.
    pub fn new(watch_list: WatchList, threshold: usize) -> Result<Self> {
        Ok(Self {
            watch_list,
            buffer: PendingBuffer::with_threshold(threshold)?,
        })
    }

    /// Observe one transaction.
    ///
    /// Returns every batch closed by this append (zero or one in practice).
    /// Unmatched transactions are dropped silently, and so is a transaction
    /// whose hash is already buffered.
    pub fn on_transaction(
        &mut self,
        tx: &ObservedTransaction,
        ctx: BlockContext,
    ) -> Vec<Vec<CapturedTransaction>> {
        self.observe(tx, ctx, &|_| false)
    }

    /// Observe every transaction of a block, in block order.
    pub fn on_block(&mut self, block: &ObservedBlock) -> Vec<Vec<CapturedTransaction>> {
        self.on_block_filtered(block, |_| false)
    }

    /// Like [`on_block`](Self::on_block), additionally skipping transactions
    /// for which `is_committed` returns `true`. Used when replaying blocks
    /// after a restart.
    pub fn on_block_filtered(
        &mut self,
        block: &ObservedBlock,
        is_committed: impl Fn(&TxHash) -> bool,
    ) -> Vec<Vec<CapturedTransaction>> {
        let ctx = block.context();
        let mut closed = Vec::new();
        for tx in &block.transactions {
            closed.extend(self.observe(tx, ctx, &is_committed));
        }
        closed
    }

    fn observe(
        &mut self,
        tx: &ObservedTransaction,
        ctx: BlockContext,
        is_committed: &dyn Fn(&TxHash) -> bool,
    ) -> Vec<Vec<CapturedTransaction>> {
        if !self.watch_list.matches(&tx.from, tx.to.as_ref()) {
            return Vec::new();
        }
        if self.buffer.contains(&tx.hash) {
            tracing::debug!(tx_hash = ?tx.hash, block = ctx.number, "already buffered, skipping");
            return Vec::new();
        }
        if is_committed(&tx.hash) {
            tracing::debug!(tx_hash = ?tx.hash, block = ctx.number, "already committed, skipping");
            return Vec::new();
        }

        tracing::info!(
            tx_hash = ?tx.hash,
            block = ctx.number,
            from = ?tx.from,
            "watched transaction detected"
        );
        self.buffer.push(CapturedTransaction::capture(tx, ctx));

        let mut closed = Vec::new();
        while let Some(batch) = self.buffer.take_ready() {
            tracing::info!(
                size = batch.len(),
                remaining = self.buffer.len(),
                "batch closed"
            );
            closed.push(batch);
        }
        closed
    }

    /// The pending buffer, for inspection.
    #[must_use]
    pub fn buffer(&self) -> &PendingBuffer {
        &self.buffer
    }

    /// Number of matched transactions not yet part of a closed batch.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}
