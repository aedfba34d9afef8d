//! Upstream chain input and the captured-transaction model.
//!
//! The chain client hands the sequencer one [`ObservedBlock`] per new
//! block. Transactions touching a watched address are turned into
//! [`CapturedTransaction`]s, which are immutable from then on and owned by
//! the pending buffer until consumed into a batch.

use serde::{Deserialize, Serialize};

use crate::{Address, TxHash, U256, ids::hex_bytes};

/// Block metadata that travels with every captured transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockContext {
    /// Block height.
    pub number: u64,
    /// Block timestamp (unix seconds).
    pub timestamp: u64,
}

/// A transaction as delivered by the upstream chain client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedTransaction {
    pub hash: TxHash,
    pub from: Address,
    /// `None` for contract creation.
    pub to: Option<Address>,
    pub value: U256,
    #[serde(with = "hex_bytes")]
    pub input: Vec<u8>,
}

/// A block with its full transaction list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedBlock {
    pub number: u64,
    pub timestamp: u64,
    pub transactions: Vec<ObservedTransaction>,
}

impl ObservedBlock {
    /// The metadata attached to each transaction captured from this block.
    #[must_use]
    pub fn context(&self) -> BlockContext {
        BlockContext {
            number: self.number,
            timestamp: self.timestamp,
        }
    }
}

/// A transaction that matched the watch list.
///
/// Created once at capture time and never mutated. Its position in the
/// pending buffer determines its position in the batch, and therefore the
/// batch digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedTransaction {
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub from: Address,
    pub to: Option<Address>,
    /// Transferred value in wei.
    pub value: U256,
    /// Call data.
    #[serde(with = "hex_bytes")]
    pub payload: Vec<u8>,
    /// Timestamp of the containing block (unix seconds).
    pub block_timestamp: u64,
}

impl CapturedTransaction {
    /// Capture an observed transaction in the context of its block.
    #[must_use]
    pub fn capture(tx: &ObservedTransaction, ctx: BlockContext) -> Self {
        Self {
            tx_hash: tx.hash,
            block_number: ctx.number,
            from: tx.from,
            to: tx.to,
            value: tx.value,
            payload: tx.input.clone(),
            block_timestamp: ctx.timestamp,
        }
    }

    /// Returns `true` if `address` is the sender or the recipient.
    #[must_use]
    pub fn touches(&self, address: &Address) -> bool {
        self.from == *address || self.to.as_ref() == Some(address)
    }
}

/// Deterministic fixtures for tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl CapturedTransaction {
    /// A transaction whose hash and parties are derived from `seed`.
    #[must_use]
    pub fn dummy(seed: u8, block_number: u64) -> Self {
        Self {
            tx_hash: TxHash([seed; 32]),
            block_number,
            from: Address([seed; 20]),
            to: Some(Address([seed.wrapping_add(1); 20])),
            value: U256::from(u64::from(seed) * 1_000),
            payload: vec![seed],
            block_timestamp: 1_700_000_000 + block_number * 12,
        }
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl ObservedTransaction {
    /// A transfer `from → to` whose hash is derived from `seed`.
    #[must_use]
    pub fn dummy(seed: u8, from: Address, to: Option<Address>) -> Self {
        Self {
            hash: TxHash([seed; 32]),
            from,
            to,
            value: U256::from(u64::from(seed)),
            input: Vec::new(),
        }
    }
}
