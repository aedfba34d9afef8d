//! Submission orchestrator.
//!
//! Turns a closed batch into a committed, persisted record:
//! 1. Project each captured transaction into a `StateUpdate`
//! 2. Compute the batch digest
//! 3. Submit the digest on-chain and wait for the `BatchSubmitted` index
//! 4. Persist a fresh `BatchRecord` keyed by the digest
//!
//! Nothing is written before the chain confirms. A failed submission
//! leaves the store untouched and the batch membership is lost; the error
//! is returned to the caller.

use chrono::{DateTime, Utc};
use seqroll_commitment::compute_digest;
use seqroll_store::BatchStore;
use seqroll_types::{BatchRecord, CapturedTransaction, Result, SequencerError, StateUpdate};

use crate::contract::RollupContract;

/// Commits closed batches on-chain and records them in the store.
pub struct Submitter<'a, S, C> {
    store: &'a mut S,
    contract: &'a C,
}

impl<'a, S: BatchStore, C: RollupContract> Submitter<'a, S, C> {
    pub fn new(store: &'a mut S, contract: &'a C) -> Self {
        Self { store, contract }
    }

    /// Submit one closed batch.
    ///
    /// # Errors
    /// - `EmptyBatch` if `batch` is empty (no on-chain call is made)
    /// - any chain error from the submit call (store unchanged)
    /// - a store error if the confirmed record could not be persisted
    pub async fn submit_batch(
        &mut self,
        batch: &[CapturedTransaction],
        now: DateTime<Utc>,
    ) -> Result<BatchRecord> {
        if batch.is_empty() {
            return Err(SequencerError::EmptyBatch);
        }

        let updates: Vec<StateUpdate> = batch.iter().map(StateUpdate::from).collect();
        let digest = compute_digest(&updates);
        tracing::info!(digest = ?digest, size = updates.len(), "submitting batch");

        let receipt = match self.contract.submit(digest).await {
            Ok(receipt) => receipt,
            Err(e) => {
                tracing::error!(digest = ?digest, error = %e, "batch submission failed");
                return Err(e);
            }
        };
        tracing::info!(
            digest = ?digest,
            batch_index = %receipt.batch_index,
            tx = %receipt.receipt,
            "batch confirmed on-chain"
        );

        let record = BatchRecord::new(digest, updates, now, receipt.batch_index);
        if let Err(e) = self.store.put(record.clone()) {
            tracing::error!(
                digest = ?digest,
                batch_index = %receipt.batch_index,
                error = %e,
                "batch committed on-chain but not persisted"
            );
            return Err(e);
        }
        tracing::info!(digest = ?digest, batch_index = %record.batch_index, "batch record persisted");
        Ok(record)
    }
}
