//! # seqroll-types
//!
//! Shared types, errors, and configuration for the **Seqroll** rollup sequencer.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`Address`], [`TxHash`], [`Digest`], [`BatchIndex`]
//! - **Chain input**: [`ObservedBlock`], [`ObservedTransaction`], [`BlockContext`]
//! - **Capture model**: [`CapturedTransaction`]
//! - **Commitment model**: [`StateUpdate`]
//! - **Batch model**: [`BatchRecord`], [`FraudAudit`], [`BatchPhase`], [`OnChainStatus`]
//! - **Receipts**: [`SubmitReceipt`], [`ChainReceipt`]
//! - **Configuration**: [`SequencerConfig`]
//! - **Errors**: [`SequencerError`] with `SQ_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod batch;
pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod receipt;
pub mod transaction;
pub mod update;

// Re-export all primary types at crate root for ergonomic imports:
//   use seqroll_types::{BatchRecord, Digest, StateUpdate, ...};

pub use batch::*;
pub use config::*;
pub use error::*;
pub use ids::*;
pub use receipt::*;
pub use transaction::*;
pub use update::*;

// Constants are accessed via `seqroll_types::constants::FOO`
// (not re-exported to avoid name collisions).
