//! Batch lifecycle types.
//!
//! A [`BatchRecord`] is created right after a successful on-chain submit
//! and persisted under its digest. Each logical batch moves through:
//!
//! ```text
//!   ┌───────────┐ fraud proof, valid rest ┌────────────┐
//!   │ SUBMITTED ├────────────────────────▶│ CHALLENGED │◀─┐ further
//!   └─────┬─┬───┘                         └──┬───────┬─┘  │ fraud proofs
//!         │ │ fraud proof, empty rest        │       └────┘
//!         │ ▼                                │
//!         │ VOIDED (record removed)          │
//!         │          window elapsed          ▼
//!         └──────────────────────────────▶ FINALIZED
//! ```
//!
//! Invariants carried by every stored record:
//! - `digest` equals the commitment over `state_updates`
//! - `batch_index` is assigned once and copied into every rewrite
//! - `finalized` goes `false → true` exactly once

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BatchIndex, Digest, Result, SequencerError, StateUpdate, TxHash};

/// Derived lifecycle phase of a stored batch record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BatchPhase {
    /// Committed on-chain, inside or past its challenge window.
    Submitted,
    /// Rewritten by at least one fraud proof under a new digest.
    Challenged,
    /// Finalized on-chain. Terminal.
    Finalized,
}

impl fmt::Display for BatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Submitted => write!(f, "SUBMITTED"),
            Self::Challenged => write!(f, "CHALLENGED"),
            Self::Finalized => write!(f, "FINALIZED"),
        }
    }
}

/// Batch status as reported by the rollup contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OnChainStatus {
    /// Still inside the dispute process; may be finalized.
    Open,
    /// Already finalized on-chain.
    Finalized,
}

impl OnChainStatus {
    /// Decode the contract's `uint8` status code.
    ///
    /// # Errors
    /// Returns `UnknownStatus` for codes with no named variant.
    pub fn from_code(index: BatchIndex, code: u64) -> Result<Self> {
        match code {
            0 => Ok(Self::Open),
            1 => Ok(Self::Finalized),
            _ => Err(SequencerError::UnknownStatus { index, code }),
        }
    }
}

impl fmt::Display for OnChainStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::Finalized => write!(f, "FINALIZED"),
        }
    }
}

/// Audit trail left on a record produced by a fraud-proof truncation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FraudAudit {
    /// Digest of the record this one replaced.
    pub applied_from: Digest,
    /// The transaction proven fraudulent.
    pub fraudulent_tx_hash: TxHash,
    /// When the rewrite happened.
    pub modified_at: DateTime<Utc>,
}

/// A persisted batch, keyed by its digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRecord {
    /// Commitment over `state_updates`; the store key.
    pub digest: Digest,
    /// Batch members in arrival order.
    pub state_updates: Vec<StateUpdate>,
    /// When the batch was first committed on-chain.
    pub submitted_at: DateTime<Utc>,
    /// Index assigned by the rollup contract at first submission.
    pub batch_index: BatchIndex,
    /// Whether the batch has been finalized on-chain.
    pub finalized: bool,
    /// Present once a fraud proof has rewritten this logical batch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fraud_audit: Option<FraudAudit>,
}

impl BatchRecord {
    /// A freshly submitted, unfinalized record.
    #[must_use]
    pub fn new(
        digest: Digest,
        state_updates: Vec<StateUpdate>,
        submitted_at: DateTime<Utc>,
        batch_index: BatchIndex,
    ) -> Self {
        Self {
            digest,
            state_updates,
            submitted_at,
            batch_index,
            finalized: false,
            fraud_audit: None,
        }
    }

    #[must_use]
    pub fn phase(&self) -> BatchPhase {
        if self.finalized {
            BatchPhase::Finalized
        } else if self.fraud_audit.is_some() {
            BatchPhase::Challenged
        } else {
            BatchPhase::Submitted
        }
    }

    /// Position of `tx_hash` within the batch, if present.
    #[must_use]
    pub fn position_of(&self, tx_hash: &TxHash) -> Option<usize> {
        self.state_updates.iter().position(|u| u.tx_hash == *tx_hash)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state_updates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state_updates.is_empty()
    }

    /// Earliest moment the batch may be finalized, or `None` if the window
    /// overflows the calendar.
    #[must_use]
    pub fn challenge_deadline(&self, window: chrono::Duration) -> Option<DateTime<Utc>> {
        self.submitted_at.checked_add_signed(window)
    }

    /// Flip `finalized` to `true`.
    ///
    /// # Errors
    /// Returns `AlreadyFinalized` if the record is already final.
    pub fn mark_finalized(&mut self) -> Result<()> {
        if self.finalized {
            return Err(SequencerError::AlreadyFinalized(self.digest));
        }
        self.finalized = true;
        Ok(())
    }
}

impl fmt::Display for BatchRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:?} [{}] {} updates, submitted {}",
            self.batch_index,
            self.digest,
            self.phase(),
            self.state_updates.len(),
            self.submitted_at.to_rfc3339(),
        )
    }
}
