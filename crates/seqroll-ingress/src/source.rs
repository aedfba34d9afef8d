//! Upstream block source port.
//!
//! The capture stage does not talk to the chain itself. The node supplies
//! an implementation backed by JSON-RPC; tests use [`StaticBlockSource`].

use async_trait::async_trait;
use seqroll_types::{ObservedBlock, Result};

/// Read access to the upstream chain's blocks.
#[async_trait]
pub trait BlockSource: Send + Sync {
    /// Current head height.
    async fn head(&self) -> Result<u64>;

    /// The block at `number` with its full transaction list, or `None` if
    /// it does not exist yet.
    async fn block(&self, number: u64) -> Result<Option<ObservedBlock>>;
}

#[cfg(any(test, feature = "test-helpers"))]
pub use mock::StaticBlockSource;

#[cfg(any(test, feature = "test-helpers"))]
mod mock {
    use std::collections::BTreeMap;
    use std::sync::RwLock;

    use seqroll_types::SequencerError;

    use super::*;

    /// In-memory block source. **Never use in production.**
    #[derive(Debug, Default)]
    pub struct StaticBlockSource {
        blocks: RwLock<BTreeMap<u64, ObservedBlock>>,
    }

    impl StaticBlockSource {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Make a block available; the head follows the highest block.
        pub fn push(&self, block: ObservedBlock) {
            if let Ok(mut blocks) = self.blocks.write() {
                blocks.insert(block.number, block);
            }
        }
    }

    #[async_trait]
    impl BlockSource for StaticBlockSource {
        async fn head(&self) -> Result<u64> {
            let blocks = self
                .blocks
                .read()
                .map_err(|e| SequencerError::Internal(e.to_string()))?;
            Ok(blocks.keys().next_back().copied().unwrap_or(0))
        }

        async fn block(&self, number: u64) -> Result<Option<ObservedBlock>> {
            let blocks = self
                .blocks
                .read()
                .map_err(|e| SequencerError::Internal(e.to_string()))?;
            Ok(blocks.get(&number).cloned())
        }
    }
}
