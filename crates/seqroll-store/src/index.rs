//! In-memory record index shared by both store backends.
//!
//! Records are keyed by digest in a `BTreeMap`, so listing is ordered by
//! digest. A secondary map from transaction hash to the digests containing
//! it answers fraud-proof lookups without scanning every record.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use seqroll_commitment::compute_digest;
use seqroll_types::{BatchRecord, Digest, Result, SequencerError, TxHash};

/// Check that a record is keyed by the digest of its contents.
///
/// # Errors
/// Returns `DigestMismatch` otherwise.
pub fn verify_record(record: &BatchRecord) -> Result<()> {
    let computed = compute_digest(&record.state_updates);
    if computed != record.digest {
        return Err(SequencerError::DigestMismatch {
            stored: record.digest,
            computed,
        });
    }
    Ok(())
}

#[derive(Debug, Default)]
pub(crate) struct RecordIndex {
    records: BTreeMap<Digest, BatchRecord>,
    by_tx: HashMap<TxHash, BTreeSet<Digest>>,
}

impl RecordIndex {
    /// Insert or overwrite, keeping the tx index in sync.
    pub(crate) fn insert(&mut self, record: BatchRecord) {
        let digest = record.digest;
        if let Some(previous) = self.records.remove(&digest) {
            self.unindex(&previous);
        }
        for update in &record.state_updates {
            self.by_tx.entry(update.tx_hash).or_default().insert(digest);
        }
        self.records.insert(digest, record);
    }

    pub(crate) fn remove(&mut self, digest: &Digest) -> Option<BatchRecord> {
        let record = self.records.remove(digest)?;
        self.unindex(&record);
        Some(record)
    }

    fn unindex(&mut self, record: &BatchRecord) {
        for update in &record.state_updates {
            if let Some(digests) = self.by_tx.get_mut(&update.tx_hash) {
                digests.remove(&record.digest);
                if digests.is_empty() {
                    self.by_tx.remove(&update.tx_hash);
                }
            }
        }
    }

    pub(crate) fn get(&self, digest: &Digest) -> Option<&BatchRecord> {
        self.records.get(digest)
    }

    /// The record containing `tx_hash` and its position. With several
    /// candidates the lowest digest wins.
    pub(crate) fn locate(&self, tx_hash: &TxHash) -> Option<(&BatchRecord, usize)> {
        let digest = self.by_tx.get(tx_hash)?.first()?;
        let record = self.records.get(digest)?;
        let position = record.position_of(tx_hash)?;
        Some((record, position))
    }

    pub(crate) fn contains_tx(&self, tx_hash: &TxHash) -> bool {
        self.by_tx.contains_key(tx_hash)
    }

    pub(crate) fn records(&self) -> impl Iterator<Item = &BatchRecord> {
        self.records.values()
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use seqroll_types::{BatchIndex, StateUpdate};

    use super::*;

    fn record(seeds: &[u8]) -> BatchRecord {
        let updates: Vec<StateUpdate> = seeds.iter().map(|&s| StateUpdate::dummy(s, 100)).collect();
        BatchRecord::new(compute_digest(&updates), updates, Utc::now(), BatchIndex(0))
    }

    #[test]
    fn verify_accepts_matching_digest() {
        assert!(verify_record(&record(&[1, 2])).is_ok());
    }

    #[test]
    fn verify_rejects_rekeyed_contents() {
        let mut r = record(&[1, 2]);
        r.state_updates.pop();
        let err = verify_record(&r).unwrap_err();
        assert!(matches!(err, SequencerError::DigestMismatch { .. }));
    }

    #[test]
    fn locate_finds_position() {
        let mut index = RecordIndex::default();
        index.insert(record(&[1, 2, 3]));
        let (found, pos) = index.locate(&TxHash([3; 32])).unwrap();
        assert_eq!(found.len(), 3);
        assert_eq!(pos, 2);
        assert!(index.locate(&TxHash([9; 32])).is_none());
    }

    #[test]
    fn remove_drops_tx_entries() {
        let mut index = RecordIndex::default();
        let r = record(&[1, 2]);
        let digest = r.digest;
        index.insert(r);
        index.remove(&digest).unwrap();
        assert!(!index.contains_tx(&TxHash([1; 32])));
        assert_eq!(index.len(), 0);
    }

    #[test]
    fn lowest_digest_wins_when_shared() {
        let mut index = RecordIndex::default();
        let a = record(&[1, 2]);
        let b = record(&[1]);
        let lowest = a.digest.min(b.digest);
        index.insert(a);
        index.insert(b);
        let (found, _) = index.locate(&TxHash([1; 32])).unwrap();
        assert_eq!(found.digest, lowest);
    }
}
