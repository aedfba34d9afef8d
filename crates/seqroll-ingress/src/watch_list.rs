//! The set of monitored addresses.
//!
//! Loaded once at startup and immutable afterwards. Addresses are stored
//! as raw bytes, so matching is case-insensitive with respect to their hex
//! spelling.

use std::collections::HashSet;

use seqroll_types::{Address, Result, SequencerError, parse_address};

/// Immutable set of watched addresses.
#[derive(Debug, Clone)]
pub struct WatchList {
    addresses: HashSet<Address>,
}

impl WatchList {
    /// Build from parsed addresses. Duplicates collapse.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if no address is given.
    pub fn new(addresses: impl IntoIterator<Item = Address>) -> Result<Self> {
        let addresses: HashSet<Address> = addresses.into_iter().collect();
        if addresses.is_empty() {
            return Err(SequencerError::InvalidConfig {
                key: seqroll_types::env_keys::WATCHED,
                reason: "watch list is empty".to_string(),
            });
        }
        Ok(Self { addresses })
    }

    /// Build from hex strings in any letter case.
    pub fn from_strs(addresses: &[&str]) -> Result<Self> {
        let parsed = addresses
            .iter()
            .map(|s| parse_address(s))
            .collect::<Result<Vec<_>>>()?;
        Self::new(parsed)
    }

    /// Whether a single address is watched.
    #[must_use]
    pub fn contains(&self, address: &Address) -> bool {
        self.addresses.contains(address)
    }

    /// A transaction is retained iff its sender or recipient is watched.
    #[must_use]
    pub fn matches(&self, from: &Address, to: Option<&Address>) -> bool {
        self.contains(from) || to.is_some_and(|a| self.contains(a))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: &str = "0x91531da8b72049038f911ad82c8a8540797d9792";
    const B: &str = "0x2643fe1e5fb3fdb1d0004b78fd91209a28904a18";

    #[test]
    fn matches_sender_or_recipient() {
        let list = WatchList::from_strs(&[A, B]).unwrap();
        let a = parse_address(A).unwrap();
        let other = Address([0x77; 20]);

        assert!(list.matches(&a, Some(&other)));
        assert!(list.matches(&other, Some(&a)));
        assert!(!list.matches(&other, Some(&other)));
        assert!(!list.matches(&other, None));
    }

    #[test]
    fn matching_ignores_hex_case() {
        let list = WatchList::from_strs(&[&A.to_uppercase()]).unwrap();
        assert!(list.contains(&parse_address(A).unwrap()));
    }

    #[test]
    fn duplicates_collapse() {
        let list = WatchList::from_strs(&[A, A, B]).unwrap();
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn empty_list_rejected() {
        let err = WatchList::new(Vec::new()).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn bad_address_rejected() {
        assert!(WatchList::from_strs(&["0xnothex"]).is_err());
    }
}
