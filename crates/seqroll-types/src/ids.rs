//! Identifiers used throughout Seqroll.
//!
//! Addresses and 32-byte hashes are the `ethers` fixed-hash types, so they
//! pass straight into contract bindings and provider calls. They serialize
//! as full `0x` hex. Their `Display` is abbreviated (`0xabab…abab`); log
//! fields, file names and error messages use the full `{:?}` form.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Result, SequencerError};

/// A 20-byte account address on the upstream chain.
pub use ethers_core::types::H160 as Address;
/// The 32-byte commitment (state root) over a batch's state updates.
///
/// Batch records are keyed by their digest in the store.
pub use ethers_core::types::H256 as Digest;
/// A 32-byte transaction hash on the upstream chain.
pub use ethers_core::types::H256 as TxHash;
pub use ethers_core::types::U256;

/// Decode a hex string with an optional `0x` / `0X` prefix.
///
/// # Errors
/// Returns `InvalidHex` if the string contains non-hex characters or has
/// an odd number of digits.
pub fn decode_hex(kind: &'static str, s: &str) -> Result<Vec<u8>> {
    let trimmed = s.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    hex::decode(digits).map_err(|e| SequencerError::InvalidHex {
        kind,
        reason: e.to_string(),
    })
}

/// Encode bytes as `0x`-prefixed lower-case hex.
#[must_use]
pub fn encode_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

fn fixed_bytes<const N: usize>(kind: &'static str, s: &str) -> Result<[u8; N]> {
    let bytes = decode_hex(kind, s)?;
    <[u8; N]>::try_from(bytes.as_slice()).map_err(|_| SequencerError::InvalidLength {
        kind,
        expected: N,
        actual: bytes.len(),
    })
}

/// Parse a 20-byte address, case-insensitively, with or without `0x`.
///
/// # Errors
/// `InvalidHex` for non-hex input, `InvalidLength` for anything but 20 bytes.
pub fn parse_address(s: &str) -> Result<Address> {
    fixed_bytes("address", s).map(Address)
}

/// Parse a 32-byte transaction hash.
///
/// # Errors
/// `InvalidHex` for non-hex input, `InvalidLength` for anything but 32 bytes.
pub fn parse_tx_hash(s: &str) -> Result<TxHash> {
    fixed_bytes("tx hash", s).map(TxHash)
}

/// Parse a 32-byte batch digest.
///
/// # Errors
/// `InvalidHex` for non-hex input, `InvalidLength` for anything but 32 bytes.
pub fn parse_digest(s: &str) -> Result<Digest> {
    fixed_bytes("digest", s).map(Digest)
}

// ---------------------------------------------------------------------------
// BatchIndex
// ---------------------------------------------------------------------------

/// The index the rollup contract assigned to a batch at first submission.
///
/// Preserved across fraud-proof rewrites of the same logical batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct BatchIndex(pub u64);

impl BatchIndex {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for BatchIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "batch#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Hex-encoded byte payloads
// ---------------------------------------------------------------------------

/// Serde adapter for `Vec<u8>` fields stored as `0x` hex strings.
pub mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::encode_hex(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::decode_hex("payload", &s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
