//! State updates: the committed form of a captured transaction.
//!
//! A [`StateUpdate`] is what gets hashed into a batch digest and what the
//! batch store persists. It is derived from a [`CapturedTransaction`] and
//! never mutated in place: a fraud-proof truncation replaces the whole list.

use serde::{Deserialize, Serialize};

use crate::{Address, CapturedTransaction, TxHash, U256};

/// One entry of a batch, in the field order the commitment hashes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateUpdate {
    pub tx_hash: TxHash,
    pub sender: Address,
    /// `None` for contract creation; committed as the zero address.
    pub recipient: Option<Address>,
    /// Transferred value in wei.
    pub amount: U256,
    /// The block number the transaction was captured in.
    pub nonce: u64,
    /// The block timestamp (unix seconds).
    pub timestamp: u64,
}

impl From<&CapturedTransaction> for StateUpdate {
    fn from(tx: &CapturedTransaction) -> Self {
        Self {
            tx_hash: tx.tx_hash,
            sender: tx.from,
            recipient: tx.to,
            amount: tx.value,
            nonce: tx.block_number,
            timestamp: tx.block_timestamp,
        }
    }
}

impl std::fmt::Display for StateUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let recipient = self
            .recipient
            .map_or_else(|| "<create>".to_string(), |a| format!("{a:?}"));
        write!(
            f,
            "{:?} {:?} -> {} amount={} block={}",
            self.tx_hash, self.sender, recipient, self.amount, self.nonce
        )
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl StateUpdate {
    /// The update projected from [`CapturedTransaction::dummy`].
    #[must_use]
    pub fn dummy(seed: u8, block_number: u64) -> Self {
        Self::from(&CapturedTransaction::dummy(seed, block_number))
    }
}
