//! Confirmation receipts returned by the rollup contract port.
//!
//! Every on-chain call the sequencer makes (submit, challenge, finalize)
//! suspends until the transaction is mined and yields one of these.

use serde::{Deserialize, Serialize};

use crate::{BatchIndex, TxHash};

/// Confirmation of a mined contract call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainReceipt {
    /// Hash of the sequencer's transaction.
    pub tx_hash: TxHash,
    /// Block the transaction was mined in, when the chain reports it.
    pub block_number: Option<u64>,
}

/// Confirmation of a batch submission.
///
/// `batch_index` is read back from the contract's `BatchSubmitted` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitReceipt {
    pub batch_index: BatchIndex,
    pub receipt: ChainReceipt,
}

impl std::fmt::Display for ChainReceipt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.block_number {
            Some(block) => write!(f, "{:?} @ block {block}", self.tx_hash),
            None => write!(f, "{:?}", self.tx_hash),
        }
    }
}
