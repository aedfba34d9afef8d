//! # seqroll-settlement
//!
//! **Settlement plane**: everything that talks to the rollup contract and
//! mutates the batch store.
//!
//! ## Components
//!
//! 1. [`Submitter`]: closed batch → digest → on-chain submit → stored record
//! 2. [`FraudProofHandler`]: truncate a batch at a fraudulent transaction,
//!    re-commit the remainder, rewrite the store
//! 3. [`FinalizationScheduler`]: finalize records whose challenge window
//!    has elapsed
//! 4. [`Sequencer`]: owns capture, store and contract; the single point of
//!    serialization for all three entry points
//!
//! ## Ordering rule
//!
//! The store is only mutated after the chain confirms. A failed on-chain
//! call leaves every stored record as it was.

pub mod contract;
pub mod finalizer;
pub mod fraud_proof;
pub mod sequencer;
pub mod submitter;

pub use contract::RollupContract;
#[cfg(any(test, feature = "test-helpers"))]
pub use contract::{CallKind, ContractCall, MockRollup};
pub use finalizer::{FinalizationReport, FinalizationScheduler};
pub use fraud_proof::{FraudOutcome, FraudProofHandler};
pub use sequencer::{BlockReport, Sequencer, SequencerStatus};
pub use submitter::Submitter;
