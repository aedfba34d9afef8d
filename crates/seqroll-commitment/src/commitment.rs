//! Flat batch commitment.
//!
//! Every batch is committed on-chain as a single digest:
//!
//! ```text
//! leaf_i = keccak256(tx_hash ‖ sender ‖ recipient ‖ u256(amount) ‖ u256(nonce) ‖ u256(timestamp))
//! digest = keccak256(leaf_0 ‖ leaf_1 ‖ … ‖ leaf_n-1)
//! ```
//!
//! which is Solidity's `keccak256(abi.encodePacked(...))` over
//! `(bytes32, address, address, uint256, uint256, uint256)` for each leaf
//! and over `bytes32[]` for the aggregate. The rollup contract expects this
//! exact encoding, so it must not change.
//!
//! This is **not** a Merkle tree: it cannot produce compact inclusion
//! proofs, and recomputing it requires the complete ordered update list.

use ethers_core::utils::keccak256;
use seqroll_types::{Address, Digest, StateUpdate, U256};

/// Packed leaf length: 32 + 20 + 20 + 3 × 32 bytes.
const LEAF_LEN: usize = 168;

/// Big-endian 32-byte encoding of a `uint256`.
#[must_use]
pub fn u256_word(value: U256) -> [u8; 32] {
    let mut word = [0u8; 32];
    value.to_big_endian(&mut word);
    word
}

/// Hash one state update.
///
/// A missing recipient (contract creation) is committed as the zero address.
#[must_use]
pub fn leaf_hash(update: &StateUpdate) -> [u8; 32] {
    let recipient = update.recipient.unwrap_or_else(Address::zero);

    let mut packed = Vec::with_capacity(LEAF_LEN);
    packed.extend_from_slice(update.tx_hash.as_bytes());
    packed.extend_from_slice(update.sender.as_bytes());
    packed.extend_from_slice(recipient.as_bytes());
    packed.extend_from_slice(&u256_word(update.amount));
    packed.extend_from_slice(&u256_word(U256::from(update.nonce)));
    packed.extend_from_slice(&u256_word(U256::from(update.timestamp)));
    keccak256(packed)
}

/// Compute the digest over an ordered list of state updates.
///
/// Depends only on the content and order of `updates`. The empty list
/// hashes to `keccak256("")`.
#[must_use]
pub fn compute_digest(updates: &[StateUpdate]) -> Digest {
    let leaves: Vec<u8> = updates.iter().flat_map(leaf_hash).collect();
    Digest(keccak256(leaves))
}

/// Verify that `expected` is the digest of `updates`.
#[must_use]
pub fn verify_digest(updates: &[StateUpdate], expected: &Digest) -> bool {
    compute_digest(updates) == *expected
}

#[cfg(test)]
mod tests {
    use rand::seq::SliceRandom;
    use seqroll_types::{TxHash, parse_address};

    use super::*;

    fn hex32(s: &str) -> [u8; 32] {
        let mut out = [0u8; 32];
        out.copy_from_slice(&hex::decode(s).unwrap());
        out
    }

    fn fixed_update() -> StateUpdate {
        StateUpdate {
            tx_hash: TxHash([0x11; 32]),
            sender: parse_address("0x91531da8b72049038f911ad82c8a8540797d9792").unwrap(),
            recipient: Some(parse_address("0x2643fe1e5fb3fdb1d0004b78fd91209a28904a18").unwrap()),
            amount: U256::from(1000u64),
            nonce: 100,
            timestamp: 1_700_000_000,
        }
    }

    fn second_update() -> StateUpdate {
        StateUpdate {
            tx_hash: TxHash([0x22; 32]),
            sender: parse_address("0x2643fe1e5fb3fdb1d0004b78fd91209a28904a18").unwrap(),
            recipient: Some(parse_address("0x91531da8b72049038f911ad82c8a8540797d9792").unwrap()),
            amount: U256::from(5u64),
            nonce: 101,
            timestamp: 1_700_000_012,
        }
    }

    #[test]
    fn keccak_of_empty_input() {
        assert_eq!(
            keccak256(b""),
            hex32("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470")
        );
    }

    #[test]
    fn empty_batch_digest_is_keccak_of_nothing() {
        assert_eq!(compute_digest(&[]), Digest(keccak256(b"")));
    }

    #[test]
    fn leaf_matches_packed_encoding() {
        assert_eq!(
            leaf_hash(&fixed_update()),
            hex32("22b2e833cde3c1ca8426a3ec80affa49f3303900345c452f593d038d035b25f5")
        );
    }

    #[test]
    fn single_leaf_digest() {
        assert_eq!(
            compute_digest(&[fixed_update()]),
            Digest(hex32(
                "1790aea9bc98c91958d100c283d8a9cbabd6d9c3d029187e0558ea76fe23b678"
            ))
        );
    }

    #[test]
    fn two_leaf_digest() {
        assert_eq!(
            leaf_hash(&second_update()),
            hex32("e0fc74318f82f3eba91ca889ed2e82944d8e1e0fbbd3dd29da5ce716048dbe1a")
        );
        assert_eq!(
            compute_digest(&[fixed_update(), second_update()]),
            Digest(hex32(
                "dfb0cf159ebac51644f3ea5e821e0d2f3404ad711a191a133c8858a6ad50a3be"
            ))
        );
    }

    #[test]
    fn contract_creation_commits_zero_recipient() {
        let update = StateUpdate {
            tx_hash: TxHash([0x22; 32]),
            sender: parse_address("0x91531da8b72049038f911ad82c8a8540797d9792").unwrap(),
            recipient: None,
            amount: U256::zero(),
            nonce: 7,
            timestamp: 8,
        };
        assert_eq!(
            leaf_hash(&update),
            hex32("88ce14421c1b55037168053be7e45da7c0529190ff34e60fc1c20b83fee91f6e")
        );
    }

    #[test]
    fn same_updates_same_digest() {
        let updates = vec![StateUpdate::dummy(1, 100), StateUpdate::dummy(2, 101)];
        assert_eq!(compute_digest(&updates), compute_digest(&updates.clone()));
    }

    #[test]
    fn order_matters() {
        let a = StateUpdate::dummy(1, 100);
        let b = StateUpdate::dummy(2, 101);
        assert_ne!(
            compute_digest(&[a.clone(), b.clone()]),
            compute_digest(&[b, a]),
            "Order of updates must affect the digest"
        );
    }

    #[test]
    fn every_reordering_changes_digest() {
        let updates: Vec<StateUpdate> = (1..=5).map(|i| StateUpdate::dummy(i, 100)).collect();
        let original = compute_digest(&updates);
        let mut rng = rand::thread_rng();
        for _ in 0..32 {
            let mut shuffled = updates.clone();
            shuffled.shuffle(&mut rng);
            let digest = compute_digest(&shuffled);
            if shuffled == updates {
                assert_eq!(digest, original);
            } else {
                assert_ne!(digest, original);
            }
        }
    }

    #[test]
    fn truncation_changes_digest() {
        let updates = vec![StateUpdate::dummy(1, 100), StateUpdate::dummy(2, 101)];
        assert_ne!(compute_digest(&updates), compute_digest(&updates[..1]));
    }

    #[test]
    fn any_field_change_changes_leaf() {
        let base = StateUpdate::dummy(1, 100);
        let mut amount = base.clone();
        amount.amount += U256::one();
        let mut nonce = base.clone();
        nonce.nonce += 1;
        let mut timestamp = base.clone();
        timestamp.timestamp += 1;
        for changed in [amount, nonce, timestamp] {
            assert_ne!(leaf_hash(&base), leaf_hash(&changed));
        }
    }

    #[test]
    fn large_amounts_use_full_width() {
        let mut update = StateUpdate::dummy(1, 100);
        update.amount = U256::MAX;
        let word = u256_word(update.amount);
        assert_eq!(word, [0xFF; 32]);
        assert_ne!(leaf_hash(&update), leaf_hash(&StateUpdate::dummy(1, 100)));
    }

    #[test]
    fn verify_correct_and_wrong_digest() {
        let updates = vec![fixed_update()];
        let digest = compute_digest(&updates);
        assert!(verify_digest(&updates, &digest));
        assert!(!verify_digest(&updates, &Digest([0xAB; 32])));
    }
}
