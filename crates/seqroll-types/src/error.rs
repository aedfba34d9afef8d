//! Error types for the Seqroll sequencer.
//!
//! All errors use the `SQ_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Configuration errors (fatal at startup)
//! - 2xx: Identifier / parsing errors
//! - 3xx: Capture and buffer errors
//! - 4xx: Chain interaction errors (RPC failure, reverted transaction)
//! - 5xx: Store consistency errors
//! - 9xx: General / internal errors
//!
//! A fraud proof naming a transaction that is not in any stored batch is
//! *not* an error; it is reported as a negative outcome by the handler.

use thiserror::Error;

use crate::{BatchIndex, Digest};

/// Central error enum for all Seqroll operations.
#[derive(Debug, Error)]
pub enum SequencerError {
    // =================================================================
    // Configuration Errors (1xx)
    // =================================================================
    /// A required configuration value was not supplied.
    #[error("SQ_ERR_100: Missing required configuration: {key}")]
    MissingConfig { key: &'static str },

    /// A configuration value was supplied but could not be used.
    #[error("SQ_ERR_101: Invalid configuration for {key}: {reason}")]
    InvalidConfig { key: &'static str, reason: String },

    // =================================================================
    // Identifier / Parsing Errors (2xx)
    // =================================================================
    /// A hex string could not be decoded.
    #[error("SQ_ERR_200: Invalid hex for {kind}: {reason}")]
    InvalidHex { kind: &'static str, reason: String },

    /// Decoded bytes had the wrong length for the identifier type.
    #[error("SQ_ERR_201: Invalid length for {kind}: expected {expected} bytes, got {actual}")]
    InvalidLength {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },

    /// An interactive command could not be parsed.
    #[error("SQ_ERR_202: Invalid command: {reason}")]
    InvalidCommand { reason: String },

    // =================================================================
    // Capture / Buffer Errors (3xx)
    // =================================================================
    /// A batch with no transactions was handed to the submitter.
    #[error("SQ_ERR_300: Refusing to commit an empty batch")]
    EmptyBatch,

    /// The batch threshold must be at least one transaction.
    #[error("SQ_ERR_301: Invalid batch threshold: {0}")]
    InvalidThreshold(usize),

    // =================================================================
    // Chain Interaction Errors (4xx)
    // =================================================================
    /// The RPC endpoint failed or returned an error object.
    #[error("SQ_ERR_400: RPC failure: {reason}")]
    Rpc { reason: String },

    /// The transaction was mined but reverted.
    #[error("SQ_ERR_401: Transaction {tx_hash} reverted: {reason}")]
    Reverted { tx_hash: String, reason: String },

    /// The transaction was not mined within the confirmation timeout.
    #[error("SQ_ERR_402: Transaction {tx_hash} not confirmed after {waited_secs}s")]
    ConfirmationTimeout { tx_hash: String, waited_secs: u64 },

    /// The receipt did not carry the expected confirmation event.
    #[error("SQ_ERR_403: Missing confirmation event {event} in receipt")]
    MissingEvent { event: &'static str },

    /// The contract returned a status code with no named variant.
    #[error("SQ_ERR_404: Unknown on-chain status code {code} for {index}")]
    UnknownStatus { index: BatchIndex, code: u64 },

    /// The RPC response could not be interpreted.
    #[error("SQ_ERR_405: Malformed chain response: {reason}")]
    MalformedResponse { reason: String },

    // =================================================================
    // Store Consistency Errors (5xx)
    // =================================================================
    /// No batch record is stored under this digest.
    #[error("SQ_ERR_500: Batch record not found: {0:?}")]
    RecordNotFound(Digest),

    /// A stored record could not be parsed.
    #[error("SQ_ERR_501: Malformed batch record at {location}: {reason}")]
    MalformedRecord { location: String, reason: String },

    /// A record's key does not match the digest of its contents.
    #[error("SQ_ERR_502: Digest mismatch: keyed as {stored:?}, contents hash to {computed:?}")]
    DigestMismatch { stored: Digest, computed: Digest },

    /// A record was already finalized (finalization is one-way).
    #[error("SQ_ERR_503: Batch {0:?} already finalized")]
    AlreadyFinalized(Digest),

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("SQ_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("SQ_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// I/O error (disk, network).
    #[error("SQ_ERR_903: I/O error: {0}")]
    Io(String),
}

impl SequencerError {
    /// Configuration errors abort startup.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::MissingConfig { .. } | Self::InvalidConfig { .. })
    }

    /// Errors raised while talking to the upstream chain or rollup contract.
    #[must_use]
    pub fn is_chain_error(&self) -> bool {
        matches!(
            self,
            Self::Rpc { .. }
                | Self::Reverted { .. }
                | Self::ConfirmationTimeout { .. }
                | Self::MissingEvent { .. }
                | Self::UnknownStatus { .. }
                | Self::MalformedResponse { .. }
        )
    }

    /// Errors raised by the batch store.
    #[must_use]
    pub fn is_store_error(&self) -> bool {
        matches!(
            self,
            Self::RecordNotFound(_)
                | Self::MalformedRecord { .. }
                | Self::DigestMismatch { .. }
                | Self::AlreadyFinalized(_)
                | Self::Io(_)
        )
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, SequencerError>;

impl From<std::io::Error> for SequencerError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SequencerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
