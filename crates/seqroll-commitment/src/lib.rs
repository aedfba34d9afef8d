//! # seqroll-commitment
//!
//! **Pure commitment engine for Seqroll.**
//!
//! Turns an ordered list of [`StateUpdate`](seqroll_types::StateUpdate)s
//! into the digest the rollup contract stores. It has:
//!
//! - **Zero side effects**: no I/O, no clock, no chain access
//! - **Deterministic output**: same ordered input -> same digest on every run
//! - **Bit-exact encoding**: matches the contract's `abi.encodePacked` + keccak-256

pub mod commitment;

pub use commitment::{compute_digest, leaf_hash, u256_word, verify_digest};
