//! Fraud-proof handler.
//!
//! A fraud proof names one transaction. The batch containing it is
//! truncated to the updates strictly before that transaction; everything
//! at and after it is discarded.
//!
//! - Empty remainder: the record is deleted and nothing is sent on-chain.
//! - Otherwise: the remainder's digest is submitted with `challenge` for
//!   the same batch index. Only after the chain confirms is the new record
//!   written (carrying a [`FraudAudit`]) and the old one deleted. The new
//!   record is written first, so an interruption leaves a duplicate, not a
//!   loss. Once the challenge is confirmed the outcome is `Rewritten`; a
//!   failed delete of the old record is only logged.
//!
//! Discarded transactions are tombstoned in the store before the old record
//! goes, so replaying their blocks after a restart does not capture them
//! again.
//!
//! A finalized batch cannot be rewritten.

use chrono::{DateTime, Utc};
use seqroll_commitment::compute_digest;
use seqroll_store::BatchStore;
use seqroll_types::{
    BatchIndex, BatchRecord, Digest, FraudAudit, Result, SequencerError, TxHash,
};

use crate::contract::RollupContract;

/// Result of applying one fraud proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FraudOutcome {
    /// No stored batch contains the transaction. Nothing changed.
    NotFound,
    /// The transaction was first in its batch; the record was removed.
    Voided {
        digest: Digest,
        batch_index: BatchIndex,
    },
    /// The batch was re-committed under a new digest.
    Rewritten {
        previous: Digest,
        record: BatchRecord,
    },
}

impl std::fmt::Display for FraudOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "transaction not found in any batch"),
            Self::Voided {
                digest,
                batch_index,
            } => write!(f, "{batch_index} {digest:?} voided and removed"),
            Self::Rewritten { previous, record } => write!(
                f,
                "{} rewritten: {:?} -> {:?} ({} updates kept)",
                record.batch_index,
                previous,
                record.digest,
                record.len()
            ),
        }
    }
}

/// Applies fraud proofs against the store and the rollup contract.
pub struct FraudProofHandler<'a, S, C> {
    store: &'a mut S,
    contract: &'a C,
}

impl<'a, S: BatchStore, C: RollupContract> FraudProofHandler<'a, S, C> {
    pub fn new(store: &'a mut S, contract: &'a C) -> Self {
        Self { store, contract }
    }

    /// Apply a fraud proof naming `tx_hash`.
    ///
    /// # Errors
    /// - `AlreadyFinalized` if the containing batch is final
    /// - any chain error from the challenge call (store unchanged)
    /// - store errors from the rewrite
    pub async fn apply(&mut self, tx_hash: &TxHash, now: DateTime<Utc>) -> Result<FraudOutcome> {
        let Some((original, position)) = self.store.locate(tx_hash) else {
            tracing::info!(tx_hash = ?tx_hash, "fraud proof target not found in any batch");
            return Ok(FraudOutcome::NotFound);
        };
        if original.finalized {
            return Err(SequencerError::AlreadyFinalized(original.digest));
        }

        tracing::info!(
            tx_hash = ?tx_hash,
            digest = ?original.digest,
            batch_index = %original.batch_index,
            position,
            "fraud proof matched batch"
        );

        let kept = original.state_updates[..position].to_vec();
        let discarded: Vec<TxHash> = original.state_updates[position..]
            .iter()
            .map(|u| u.tx_hash)
            .collect();
        if kept.is_empty() {
            self.store.tombstone(&discarded)?;
            self.store.delete(&original.digest)?;
            tracing::warn!(
                digest = ?original.digest,
                batch_index = %original.batch_index,
                "batch voided by fraud proof"
            );
            return Ok(FraudOutcome::Voided {
                digest: original.digest,
                batch_index: original.batch_index,
            });
        }

        let digest = compute_digest(&kept);
        let receipt = match self.contract.challenge(original.batch_index, digest).await {
            Ok(receipt) => receipt,
            Err(e) => {
                tracing::error!(
                    batch_index = %original.batch_index,
                    error = %e,
                    "challenge failed, batch left unchanged"
                );
                return Err(e);
            }
        };
        tracing::info!(
            batch_index = %original.batch_index,
            digest = ?digest,
            tx = %receipt,
            "challenge confirmed on-chain"
        );

        let mut record = BatchRecord::new(digest, kept, original.submitted_at, original.batch_index);
        record.fraud_audit = Some(FraudAudit {
            applied_from: original.digest,
            fraudulent_tx_hash: *tx_hash,
            modified_at: now,
        });
        self.store.put(record.clone())?;
        self.store.tombstone(&discarded)?;
        if let Err(e) = self.store.delete(&original.digest) {
            tracing::warn!(
                digest = ?original.digest,
                error = %e,
                "superseded batch record not removed"
            );
        }
        tracing::warn!(
            batch_index = %record.batch_index,
            previous = ?original.digest,
            digest = ?record.digest,
            kept = record.len(),
            discarded = discarded.len(),
            "batch rewritten by fraud proof"
        );

        Ok(FraudOutcome::Rewritten {
            previous: original.digest,
            record,
        })
    }
}
