//! The sequencer aggregate.
//!
//! Owns the capture stage, the batch store, and the rollup contract, and
//! exposes the three entry points that mutate the store: block arrival,
//! fraud proofs, and finalization cycles. Every entry point takes
//! `&mut self`, so wrapping the aggregate in one lock serializes them.

use chrono::{DateTime, Utc};
use seqroll_ingress::{TransactionCapture, WatchList};
use seqroll_store::BatchStore;
use seqroll_types::{
    BatchRecord, CapturedTransaction, Digest, ObservedBlock, Result, SequencerConfig,
    SequencerError, TxHash,
};

use crate::contract::RollupContract;
use crate::finalizer::{FinalizationReport, FinalizationScheduler};
use crate::fraud_proof::{FraudOutcome, FraudProofHandler};
use crate::submitter::Submitter;

/// What happened while handling one block.
#[derive(Debug, Default)]
pub struct BlockReport {
    pub block: u64,
    /// Batches committed and persisted.
    pub submitted: Vec<BatchRecord>,
    /// Closed batches whose submission failed. Their membership is lost.
    pub failed: Vec<SequencerError>,
}

/// Snapshot for the `status` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequencerStatus {
    pub records: usize,
    pub unfinalized: usize,
    pub buffered: usize,
    pub next_block: Option<u64>,
}

impl std::fmt::Display for SequencerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "records={} unfinalized={} buffered={}",
            self.records, self.unfinalized, self.buffered
        )?;
        if let Some(next) = self.next_block {
            write!(f, " next_block={next}")?;
        }
        Ok(())
    }
}

pub struct Sequencer<S, C> {
    capture: TransactionCapture,
    store: S,
    contract: C,
    challenge_window: chrono::Duration,
}

impl<S: BatchStore, C: RollupContract> Sequencer<S, C> {
    pub fn new(
        capture: TransactionCapture,
        store: S,
        contract: C,
        challenge_window: chrono::Duration,
    ) -> Self {
        Self {
            capture,
            store,
            contract,
            challenge_window,
        }
    }

    /// Build from validated configuration.
    ///
    /// # Errors
    /// Returns a configuration error for an empty watch list, a zero
    /// threshold, or a challenge window out of range.
    pub fn from_config(config: &SequencerConfig, store: S, contract: C) -> Result<Self> {
        let watch_list = WatchList::new(config.watched_addresses.iter().copied())?;
        let capture = TransactionCapture::new(watch_list, config.batch_threshold)?;
        Ok(Self::new(
            capture,
            store,
            contract,
            config.challenge_window_delta()?,
        ))
    }

    /// Handle one block: capture matches, submit every closed batch, and
    /// advance the resume checkpoint.
    ///
    /// Transactions already committed to a stored batch, or cut from one by
    /// a fraud proof, are skipped, so a block replayed after a restart does
    /// not commit anything twice.
    ///
    /// # Errors
    /// Only a failure to persist the checkpoint is returned; submission
    /// failures are reported in [`BlockReport::failed`].
    pub async fn on_block(&mut self, block: &ObservedBlock, now: DateTime<Utc>) -> Result<BlockReport> {
        let closed = {
            let store = &self.store;
            self.capture
                .on_block_filtered(block, |hash| store.is_known(hash))
        };

        let mut report = BlockReport {
            block: block.number,
            ..BlockReport::default()
        };
        let mut submitter = Submitter::new(&mut self.store, &self.contract);
        for batch in closed {
            match submitter.submit_batch(&batch, now).await {
                Ok(record) => report.submitted.push(record),
                Err(e) => {
                    tracing::error!(
                        block = block.number,
                        lost = batch.len(),
                        error = %e,
                        "closed batch dropped after failed submission"
                    );
                    report.failed.push(e);
                }
            }
        }

        let next = self
            .capture
            .buffer()
            .oldest_block()
            .unwrap_or(block.number + 1);
        self.store.save_checkpoint(next)?;
        Ok(report)
    }

    /// Apply a fraud proof naming `tx_hash`.
    pub async fn apply_fraud_proof(
        &mut self,
        tx_hash: &TxHash,
        now: DateTime<Utc>,
    ) -> Result<FraudOutcome> {
        FraudProofHandler::new(&mut self.store, &self.contract)
            .apply(tx_hash, now)
            .await
    }

    /// Run one finalization cycle.
    pub async fn run_finalization(&mut self, now: DateTime<Utc>) -> FinalizationReport {
        FinalizationScheduler::new(&mut self.store, &self.contract, self.challenge_window)
            .run_cycle(now)
            .await
    }

    /// The stored batch keyed by `digest`.
    pub fn batch(&self, digest: &Digest) -> Result<BatchRecord> {
        self.store.get(digest)
    }

    /// Height to resume polling from after a restart, if saved.
    pub fn resume_height(&self) -> Option<u64> {
        self.store.checkpoint()
    }

    pub fn status(&self) -> SequencerStatus {
        SequencerStatus {
            records: self.store.len(),
            unfinalized: self.store.unfinalized().len(),
            buffered: self.capture.buffered(),
            next_block: self.store.checkpoint(),
        }
    }

    /// Matched transactions not yet part of a submitted batch.
    pub fn buffered(&self) -> Vec<CapturedTransaction> {
        self.capture.buffer().iter().cloned().collect()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn contract(&self) -> &C {
        &self.contract
    }
}

#[cfg(test)]
mod tests {
    use seqroll_store::MemoryBatchStore;
    use seqroll_types::{Address, ObservedTransaction};

    use super::*;
    use crate::contract::{CallKind, MockRollup};

    const WATCHED: Address = Address([0xAA; 20]);

    fn sequencer() -> Sequencer<MemoryBatchStore, MockRollup> {
        let capture = TransactionCapture::new(WatchList::new([WATCHED]).unwrap(), 3).unwrap();
        Sequencer::new(
            capture,
            MemoryBatchStore::new(),
            MockRollup::new(),
            chrono::Duration::days(7),
        )
    }

    fn block(number: u64, seeds: &[u8]) -> ObservedBlock {
        ObservedBlock {
            number,
            timestamp: 1_700_000_000 + number * 12,
            transactions: seeds
                .iter()
                .map(|&s| ObservedTransaction::dummy(s, WATCHED, Some(Address([s; 20]))))
                .collect(),
        }
    }

    #[tokio::test]
    async fn checkpoint_tracks_oldest_buffered_block() {
        let mut seq = sequencer();
        seq.on_block(&block(100, &[1]), Utc::now()).await.unwrap();
        assert_eq!(seq.resume_height(), Some(100));
        seq.on_block(&block(101, &[2]), Utc::now()).await.unwrap();
        assert_eq!(seq.resume_height(), Some(100));

        let report = seq.on_block(&block(102, &[3]), Utc::now()).await.unwrap();
        assert_eq!(report.submitted.len(), 1);
        assert_eq!(seq.resume_height(), Some(103));
        assert_eq!(seq.status().buffered, 0);
    }

    #[tokio::test]
    async fn replayed_block_not_committed_twice() {
        let mut seq = sequencer();
        let full = block(100, &[1, 2, 3]);
        seq.on_block(&full, Utc::now()).await.unwrap();
        let report = seq.on_block(&full, Utc::now()).await.unwrap();

        assert!(report.submitted.is_empty());
        assert_eq!(seq.status().buffered, 0);
        assert_eq!(seq.contract().count(CallKind::Submit), 1);
    }

    #[tokio::test]
    async fn failed_submission_reported_in_block_report() {
        let mut seq = sequencer();
        seq.contract().fail_next(CallKind::Submit);
        let report = seq.on_block(&block(100, &[1, 2, 3]), Utc::now()).await.unwrap();
        assert!(report.submitted.is_empty());
        assert_eq!(report.failed.len(), 1);
        assert!(seq.store().is_empty());
        assert_eq!(seq.resume_height(), Some(101));
    }

    #[tokio::test]
    async fn status_summarizes_store() {
        let mut seq = sequencer();
        seq.on_block(&block(100, &[1, 2, 3, 4]), Utc::now()).await.unwrap();
        let status = seq.status();
        assert_eq!(status.records, 1);
        assert_eq!(status.unfinalized, 1);
        assert_eq!(status.buffered, 1);
        assert_eq!(status.next_block, Some(100));
        assert_eq!(seq.buffered().len(), 1);
    }
}
