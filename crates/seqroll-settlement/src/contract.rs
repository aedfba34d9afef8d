//! Rollup contract port.
//!
//! The contract's ABI is fixed; the node provides a JSON-RPC backed
//! implementation. Every write call suspends until the transaction is
//! mined and returns a receipt, or an error if it failed or reverted.

use async_trait::async_trait;
use seqroll_types::{BatchIndex, ChainReceipt, Digest, OnChainStatus, Result, SubmitReceipt};

/// The on-chain rollup contract.
#[async_trait]
pub trait RollupContract: Send + Sync {
    /// Commit a new batch digest. The receipt carries the index assigned by
    /// the contract.
    async fn submit(&self, digest: Digest) -> Result<SubmitReceipt>;

    /// Replace the digest of batch `index` after a fraud proof.
    async fn challenge(&self, index: BatchIndex, digest: Digest) -> Result<ChainReceipt>;

    /// Finalize batch `index` once its challenge window has elapsed.
    async fn finalize(&self, index: BatchIndex) -> Result<ChainReceipt>;

    /// Current on-chain status of batch `index`.
    async fn status(&self, index: BatchIndex) -> Result<OnChainStatus>;
}

#[cfg(any(test, feature = "test-helpers"))]
pub use mock::{CallKind, ContractCall, MockRollup};

#[cfg(any(test, feature = "test-helpers"))]
mod mock {
    use std::collections::{BTreeMap, HashSet};
    use std::sync::{Mutex, MutexGuard};

    use seqroll_types::{SequencerError, TxHash};

    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum CallKind {
        Submit,
        Challenge,
        Finalize,
        Status,
    }

    /// A call received by [`MockRollup`], successful or not.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum ContractCall {
        Submit(Digest),
        Challenge(BatchIndex, Digest),
        Finalize(BatchIndex),
        Status(BatchIndex),
    }

    impl ContractCall {
        #[must_use]
        pub fn kind(&self) -> CallKind {
            match self {
                Self::Submit(_) => CallKind::Submit,
                Self::Challenge(..) => CallKind::Challenge,
                Self::Finalize(_) => CallKind::Finalize,
                Self::Status(_) => CallKind::Status,
            }
        }
    }

    #[derive(Debug, Default)]
    struct MockState {
        next_index: u64,
        digests: BTreeMap<BatchIndex, Digest>,
        statuses: BTreeMap<BatchIndex, OnChainStatus>,
        calls: Vec<ContractCall>,
        fail_next: HashSet<CallKind>,
    }

    /// Scriptable in-memory rollup contract. **Never use in production.**
    ///
    /// Assigns batch indices sequentially from 0, tracks digests and
    /// statuses per index, and records every call.
    #[derive(Debug, Default)]
    pub struct MockRollup {
        state: Mutex<MockState>,
    }

    impl MockRollup {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        fn lock(&self) -> Result<MutexGuard<'_, MockState>> {
            self.state
                .lock()
                .map_err(|e| SequencerError::Internal(e.to_string()))
        }

        /// Make the next call of `kind` fail as if it reverted.
        pub fn fail_next(&self, kind: CallKind) {
            if let Ok(mut state) = self.lock() {
                state.fail_next.insert(kind);
            }
        }

        /// Override the status reported for `index`.
        pub fn set_status(&self, index: BatchIndex, status: OnChainStatus) {
            if let Ok(mut state) = self.lock() {
                state.statuses.insert(index, status);
            }
        }

        /// The digest currently committed for `index`.
        #[must_use]
        pub fn digest_of(&self, index: BatchIndex) -> Option<Digest> {
            self.lock().ok()?.digests.get(&index).copied()
        }

        /// Every call received so far, in order.
        #[must_use]
        pub fn calls(&self) -> Vec<ContractCall> {
            self.lock().map(|s| s.calls.clone()).unwrap_or_default()
        }

        /// Number of calls of `kind` received so far.
        #[must_use]
        pub fn count(&self, kind: CallKind) -> usize {
            self.calls().iter().filter(|c| c.kind() == kind).count()
        }

        /// Record `call` and fail it if scripted to.
        fn enter(&self, call: ContractCall) -> Result<MutexGuard<'_, MockState>> {
            let mut state = self.lock()?;
            state.calls.push(call);
            if state.fail_next.remove(&call.kind()) {
                return Err(SequencerError::Reverted {
                    tx_hash: format!("{:?}", receipt_hash(state.calls.len())),
                    reason: format!("scripted {:?} failure", call.kind()),
                });
            }
            Ok(state)
        }
    }

    fn receipt_hash(n: usize) -> TxHash {
        TxHash::from_low_u64_be(n as u64)
    }

    fn receipt(state: &MockState) -> ChainReceipt {
        ChainReceipt {
            tx_hash: receipt_hash(state.calls.len()),
            block_number: Some(state.calls.len() as u64),
        }
    }

    fn known(state: &MockState, index: BatchIndex) -> Result<()> {
        if state.digests.contains_key(&index) {
            Ok(())
        } else {
            Err(SequencerError::Reverted {
                tx_hash: format!("{:?}", receipt_hash(state.calls.len())),
                reason: format!("unknown {index}"),
            })
        }
    }

    #[async_trait]
    impl RollupContract for MockRollup {
        async fn submit(&self, digest: Digest) -> Result<SubmitReceipt> {
            let mut state = self.enter(ContractCall::Submit(digest))?;
            let batch_index = BatchIndex(state.next_index);
            state.next_index += 1;
            state.digests.insert(batch_index, digest);
            state.statuses.insert(batch_index, OnChainStatus::Open);
            Ok(SubmitReceipt {
                batch_index,
                receipt: receipt(&state),
            })
        }

        async fn challenge(&self, index: BatchIndex, digest: Digest) -> Result<ChainReceipt> {
            let mut state = self.enter(ContractCall::Challenge(index, digest))?;
            known(&state, index)?;
            state.digests.insert(index, digest);
            Ok(receipt(&state))
        }

        async fn finalize(&self, index: BatchIndex) -> Result<ChainReceipt> {
            let mut state = self.enter(ContractCall::Finalize(index))?;
            known(&state, index)?;
            state.statuses.insert(index, OnChainStatus::Finalized);
            Ok(receipt(&state))
        }

        async fn status(&self, index: BatchIndex) -> Result<OnChainStatus> {
            let state = self.enter(ContractCall::Status(index))?;
            known(&state, index)?;
            Ok(state
                .statuses
                .get(&index)
                .copied()
                .unwrap_or(OnChainStatus::Open))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_assigns_sequential_indices() {
        let rollup = MockRollup::new();
        let a = rollup.submit(Digest([1; 32])).await.unwrap();
        let b = rollup.submit(Digest([2; 32])).await.unwrap();
        assert_eq!(a.batch_index, BatchIndex(0));
        assert_eq!(b.batch_index, BatchIndex(1));
        assert_eq!(rollup.digest_of(BatchIndex(1)), Some(Digest([2; 32])));
    }

    #[tokio::test]
    async fn mock_scripted_failure_is_one_shot() {
        let rollup = MockRollup::new();
        rollup.fail_next(CallKind::Submit);
        assert!(rollup.submit(Digest([1; 32])).await.unwrap_err().is_chain_error());
        assert!(rollup.submit(Digest([1; 32])).await.is_ok());
        assert_eq!(rollup.count(CallKind::Submit), 2);
    }

    #[tokio::test]
    async fn mock_finalize_flips_status() {
        let rollup = MockRollup::new();
        let idx = rollup.submit(Digest([1; 32])).await.unwrap().batch_index;
        assert_eq!(rollup.status(idx).await.unwrap(), OnChainStatus::Open);
        rollup.finalize(idx).await.unwrap();
        assert_eq!(rollup.status(idx).await.unwrap(), OnChainStatus::Finalized);
    }

    #[tokio::test]
    async fn mock_rejects_unknown_index() {
        let rollup = MockRollup::new();
        assert!(rollup.finalize(BatchIndex(9)).await.is_err());
    }
}
