//! In-memory batch store. Same semantics as the file store, no persistence.

use std::collections::HashSet;

use seqroll_types::{BatchRecord, Digest, Result, SequencerError, TxHash};

use crate::index::{RecordIndex, verify_record};
use crate::store::BatchStore;

#[derive(Debug, Default)]
pub struct MemoryBatchStore {
    index: RecordIndex,
    tombstones: HashSet<TxHash>,
    checkpoint: Option<u64>,
}

impl MemoryBatchStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl BatchStore for MemoryBatchStore {
    fn list(&self) -> Vec<BatchRecord> {
        self.index.records().cloned().collect()
    }

    fn get(&self, digest: &Digest) -> Result<BatchRecord> {
        self.index
            .get(digest)
            .cloned()
            .ok_or(SequencerError::RecordNotFound(*digest))
    }

    fn put(&mut self, record: BatchRecord) -> Result<()> {
        verify_record(&record)?;
        self.index.insert(record);
        Ok(())
    }

    fn delete(&mut self, digest: &Digest) -> Result<()> {
        self.index
            .remove(digest)
            .map(|_| ())
            .ok_or(SequencerError::RecordNotFound(*digest))
    }

    fn locate(&self, tx_hash: &TxHash) -> Option<(BatchRecord, usize)> {
        self.index
            .locate(tx_hash)
            .map(|(record, pos)| (record.clone(), pos))
    }

    fn contains_tx(&self, tx_hash: &TxHash) -> bool {
        self.index.contains_tx(tx_hash)
    }

    fn tombstone(&mut self, tx_hashes: &[TxHash]) -> Result<()> {
        self.tombstones.extend(tx_hashes.iter().copied());
        Ok(())
    }

    fn is_tombstoned(&self, tx_hash: &TxHash) -> bool {
        self.tombstones.contains(tx_hash)
    }

    fn checkpoint(&self) -> Option<u64> {
        self.checkpoint
    }

    fn save_checkpoint(&mut self, next_block: u64) -> Result<()> {
        self.checkpoint = Some(next_block);
        Ok(())
    }

    fn len(&self) -> usize {
        self.index.len()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use seqroll_commitment::compute_digest;
    use seqroll_types::{BatchIndex, StateUpdate};

    use super::*;

    fn record(seeds: &[u8], index: u64) -> BatchRecord {
        let updates: Vec<StateUpdate> = seeds.iter().map(|&s| StateUpdate::dummy(s, 100)).collect();
        BatchRecord::new(compute_digest(&updates), updates, Utc::now(), BatchIndex(index))
    }

    #[test]
    fn put_get_delete() {
        let mut store = MemoryBatchStore::new();
        let r = record(&[1, 2, 3], 0);
        let digest = r.digest;
        store.put(r.clone()).unwrap();

        assert_eq!(store.get(&digest).unwrap(), r);
        assert_eq!(store.len(), 1);

        store.delete(&digest).unwrap();
        assert!(store.is_empty());
        assert!(matches!(
            store.get(&digest).unwrap_err(),
            SequencerError::RecordNotFound(_)
        ));
    }

    #[test]
    fn put_rejects_mismatched_key() {
        let mut store = MemoryBatchStore::new();
        let mut r = record(&[1, 2], 0);
        r.digest = Digest([0xEE; 32]);
        assert!(matches!(
            store.put(r).unwrap_err(),
            SequencerError::DigestMismatch { .. }
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn overwrite_in_place() {
        let mut store = MemoryBatchStore::new();
        let mut r = record(&[1], 4);
        store.put(r.clone()).unwrap();
        r.finalized = true;
        store.put(r.clone()).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.get(&r.digest).unwrap().finalized);
        assert!(store.unfinalized().is_empty());
    }

    #[test]
    fn delete_missing_is_not_found() {
        let mut store = MemoryBatchStore::new();
        assert!(store.delete(&Digest([1; 32])).is_err());
    }

    #[test]
    fn locate_and_checkpoint() {
        let mut store = MemoryBatchStore::new();
        store.put(record(&[1, 2, 3], 0)).unwrap();
        let (found, pos) = store.locate(&TxHash([2; 32])).unwrap();
        assert_eq!(found.batch_index, BatchIndex(0));
        assert_eq!(pos, 1);
        assert!(store.contains_tx(&TxHash([3; 32])));

        assert_eq!(store.checkpoint(), None);
        store.save_checkpoint(103).unwrap();
        assert_eq!(store.checkpoint(), Some(103));
    }

    #[test]
    fn tombstoned_hashes_stay_known_after_delete() {
        let mut store = MemoryBatchStore::new();
        let r = record(&[1, 2], 0);
        store.put(r.clone()).unwrap();
        store.tombstone(&[TxHash([2; 32])]).unwrap();
        store.delete(&r.digest).unwrap();

        assert!(store.is_tombstoned(&TxHash([2; 32])));
        assert!(store.is_known(&TxHash([2; 32])));
        assert!(!store.is_known(&TxHash([1; 32])));
    }
}
