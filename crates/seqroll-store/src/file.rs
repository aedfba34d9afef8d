//! File-backed batch store.
//!
//! Layout under the data directory:
//!
//! ```text
//! <dir>/0x<digest>.json   one pretty-printed record per batch
//! <dir>/checkpoint.json   {"next_block": N}
//! <dir>/tombstones.json   {"tx_hashes": [...]}, transactions cut by fraud proofs
//! ```
//!
//! Every write goes to a sibling temp file which is fsynced and then
//! renamed over the target, so a record file is either the old or the new
//! content, never a torn write. All records are held in memory after open.

use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use seqroll_types::{BatchRecord, Digest, Result, SequencerError, TxHash, constants};

use crate::index::{RecordIndex, verify_record};
use crate::store::{BatchStore, OpenReport, SkippedRecord};

#[derive(Debug, Serialize, Deserialize)]
struct Checkpoint {
    next_block: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct Tombstones {
    tx_hashes: BTreeSet<TxHash>,
}

/// Batch store persisting one JSON file per record.
#[derive(Debug)]
pub struct FileBatchStore {
    dir: PathBuf,
    index: RecordIndex,
    tombstones: BTreeSet<TxHash>,
    checkpoint: Option<u64>,
    report: OpenReport,
}

impl FileBatchStore {
    /// Open (or create) a store rooted at `dir`.
    ///
    /// Every record file is parsed and its digest re-verified. Files that
    /// fail are logged, skipped, and listed in [`open_report`](Self::open_report).
    ///
    /// # Errors
    /// Returns an I/O error if the directory cannot be created or listed,
    /// or `MalformedRecord` if the tombstone file exists but cannot be read.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let mut paths: Vec<PathBuf> = fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_record_file(path))
            .collect();
        paths.sort();

        let mut index = RecordIndex::default();
        let mut report = OpenReport::default();
        for path in paths {
            match load_record(&path) {
                Ok(record) => {
                    index.insert(record);
                    report.loaded += 1;
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable batch record");
                    report.skipped.push(SkippedRecord {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let checkpoint = load_checkpoint(&dir.join(constants::CHECKPOINT_FILE));
        let tombstones = load_tombstones(&dir.join(constants::TOMBSTONE_FILE))?;

        tracing::info!(
            dir = %dir.display(),
            loaded = report.loaded,
            skipped = report.skipped.len(),
            tombstones = tombstones.len(),
            checkpoint = ?checkpoint,
            "batch store opened"
        );

        Ok(Self {
            dir,
            index,
            tombstones,
            checkpoint,
            report,
        })
    }

    /// Outcome of loading the directory at open time.
    #[must_use]
    pub fn open_report(&self) -> &OpenReport {
        &self.report
    }

    /// Path of the file holding the record keyed by `digest`.
    #[must_use]
    pub fn record_path(&self, digest: &Digest) -> PathBuf {
        self.dir
            .join(format!("{digest:?}.{}", constants::RECORD_FILE_EXTENSION))
    }
}

impl BatchStore for FileBatchStore {
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
        let bytes = serde_json::to_vec_pretty(&record)?;
        write_atomic(&self.record_path(&record.digest), &bytes)?;
        tracing::debug!(digest = ?record.digest, batch_index = %record.batch_index, "record written");
        self.index.insert(record);
        Ok(())
    }

    fn delete(&mut self, digest: &Digest) -> Result<()> {
        if self.index.get(digest).is_none() {
            return Err(SequencerError::RecordNotFound(*digest));
        }
        match fs::remove_file(self.record_path(digest)) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(digest = ?digest, "record file already gone");
            }
            Err(e) => return Err(e.into()),
        }
        self.index.remove(digest);
        tracing::debug!(digest = ?digest, "record deleted");
        Ok(())
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
        let mut file = Tombstones {
            tx_hashes: self.tombstones.clone(),
        };
        file.tx_hashes.extend(tx_hashes.iter().copied());
        let added = file.tx_hashes.len() - self.tombstones.len();
        if added == 0 {
            return Ok(());
        }
        let bytes = serde_json::to_vec_pretty(&file)?;
        write_atomic(&self.dir.join(constants::TOMBSTONE_FILE), &bytes)?;
        tracing::debug!(added, total = file.tx_hashes.len(), "tombstones written");
        self.tombstones = file.tx_hashes;
        Ok(())
    }

    fn is_tombstoned(&self, tx_hash: &TxHash) -> bool {
        self.tombstones.contains(tx_hash)
    }

    fn checkpoint(&self) -> Option<u64> {
        self.checkpoint
    }

    fn save_checkpoint(&mut self, next_block: u64) -> Result<()> {
        if self.checkpoint == Some(next_block) {
            return Ok(());
        }
        let bytes = serde_json::to_vec(&Checkpoint { next_block })?;
        write_atomic(&self.dir.join(constants::CHECKPOINT_FILE), &bytes)?;
        self.checkpoint = Some(next_block);
        Ok(())
    }

    fn len(&self) -> usize {
        self.index.len()
    }
}

fn is_record_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str());
    path.is_file()
        && path.extension().and_then(|e| e.to_str()) == Some(constants::RECORD_FILE_EXTENSION)
        && name != Some(constants::CHECKPOINT_FILE)
        && name != Some(constants::TOMBSTONE_FILE)
}

fn load_record(path: &Path) -> Result<BatchRecord> {
    let malformed = |reason: String| SequencerError::MalformedRecord {
        location: path.display().to_string(),
        reason,
    };

    let text = fs::read_to_string(path).map_err(|e| malformed(e.to_string()))?;
    let record: BatchRecord = serde_json::from_str(&text).map_err(|e| malformed(e.to_string()))?;

    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    if stem != format!("{:?}", record.digest) {
        return Err(malformed(format!(
            "file name does not match digest {:?}",
            record.digest
        )));
    }
    verify_record(&record)?;
    Ok(record)
}

fn load_checkpoint(path: &Path) -> Option<u64> {
    let text = fs::read_to_string(path).ok()?;
    match serde_json::from_str::<Checkpoint>(&text) {
        Ok(cp) => Some(cp.next_block),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring malformed checkpoint");
            None
        }
    }
}

/// A missing file is an empty set; an unreadable one fails the open.
fn load_tombstones(path: &Path) -> Result<BTreeSet<TxHash>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeSet::new()),
        Err(e) => return Err(e.into()),
    };
    serde_json::from_str::<Tombstones>(&text)
        .map(|t| t.tx_hashes)
        .map_err(|e| SequencerError::MalformedRecord {
            location: path.display().to_string(),
            reason: e.to_string(),
        })
}

/// Write via temp file + fsync + rename.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let temp_path = path.with_extension("tmp");
    let mut file = fs::File::create(&temp_path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    fs::rename(&temp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use seqroll_commitment::compute_digest;
    use seqroll_types::{BatchIndex, FraudAudit, StateUpdate};

    use super::*;

    fn record(seeds: &[u8], index: u64) -> BatchRecord {
        let updates: Vec<StateUpdate> = seeds.iter().map(|&s| StateUpdate::dummy(s, 100)).collect();
        BatchRecord::new(
            compute_digest(&updates),
            updates,
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            BatchIndex(index),
        )
    }

    #[test]
    fn record_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let mut r = record(&[1, 2, 3], 7);
        r.fraud_audit = Some(FraudAudit {
            applied_from: Digest([0x42; 32]),
            fraudulent_tx_hash: TxHash([4; 32]),
            modified_at: Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap(),
        });
        {
            let mut store = FileBatchStore::open(dir.path()).unwrap();
            store.put(r.clone()).unwrap();
            assert!(store.record_path(&r.digest).exists());
        }

        let store = FileBatchStore::open(dir.path()).unwrap();
        assert!(store.open_report().is_clean());
        assert_eq!(store.open_report().loaded, 1);
        assert_eq!(store.get(&r.digest).unwrap(), r);
        assert_eq!(store.locate(&TxHash([2; 32])).unwrap().1, 1);
    }

    #[test]
    fn file_named_by_digest() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileBatchStore::open(dir.path()).unwrap();
        let r = record(&[1], 0);
        store.put(r.clone()).unwrap();
        let expected = dir.path().join(format!("0x{}.json", hex::encode(r.digest)));
        assert!(expected.is_file());
        assert_eq!(store.record_path(&r.digest), expected);
    }

    #[test]
    fn delete_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileBatchStore::open(dir.path()).unwrap();
        let r = record(&[1, 2], 0);
        store.put(r.clone()).unwrap();
        store.delete(&r.digest).unwrap();
        assert!(!store.record_path(&r.digest).exists());
        assert!(FileBatchStore::open(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn mismatched_record_never_written() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileBatchStore::open(dir.path()).unwrap();
        let mut r = record(&[1, 2], 0);
        r.state_updates.pop();
        assert!(store.put(r.clone()).is_err());
        assert!(!store.record_path(&r.digest).exists());
    }

    #[test]
    fn malformed_files_skipped_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let good = record(&[1], 0);
        {
            let mut store = FileBatchStore::open(dir.path()).unwrap();
            store.put(good.clone()).unwrap();
        }
        // Garbage JSON.
        fs::write(dir.path().join("0xdead.json"), b"{not json").unwrap();
        // Valid JSON whose contents were edited after the digest was taken.
        let mut tampered = record(&[5, 6], 1);
        let tampered_path = dir.path().join(format!("{:?}.json", tampered.digest));
        tampered.state_updates.pop();
        fs::write(&tampered_path, serde_json::to_vec(&tampered).unwrap()).unwrap();
        // Not a record at all.
        fs::write(dir.path().join("notes.txt"), b"hello").unwrap();

        let store = FileBatchStore::open(dir.path()).unwrap();
        let report = store.open_report();
        assert_eq!(report.loaded, 1);
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(store.len(), 1);
        assert!(store.get(&good.digest).is_ok());
    }

    #[test]
    fn checkpoint_persists() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = FileBatchStore::open(dir.path()).unwrap();
            assert_eq!(store.checkpoint(), None);
            store.save_checkpoint(103).unwrap();
        }
        let store = FileBatchStore::open(dir.path()).unwrap();
        assert_eq!(store.checkpoint(), Some(103));
        assert!(store.open_report().is_clean());
    }

    #[test]
    fn tombstones_persist_and_are_not_records() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = FileBatchStore::open(dir.path()).unwrap();
            store.tombstone(&[TxHash([3; 32]), TxHash([2; 32])]).unwrap();
            store.tombstone(&[TxHash([2; 32])]).unwrap();
        }
        assert!(dir.path().join(constants::TOMBSTONE_FILE).is_file());

        let store = FileBatchStore::open(dir.path()).unwrap();
        assert!(store.open_report().is_clean());
        assert!(store.is_empty());
        assert!(store.is_tombstoned(&TxHash([2; 32])));
        assert!(store.is_known(&TxHash([3; 32])));
        assert!(!store.is_known(&TxHash([4; 32])));
    }

    #[test]
    fn unreadable_tombstones_fail_open() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(constants::TOMBSTONE_FILE), b"[oops").unwrap();
        let err = FileBatchStore::open(dir.path()).unwrap_err();
        assert!(matches!(err, SequencerError::MalformedRecord { .. }));
    }

    #[test]
    fn no_temp_files_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileBatchStore::open(dir.path()).unwrap();
        store.put(record(&[1], 0)).unwrap();
        store.save_checkpoint(5).unwrap();
        store.tombstone(&[TxHash([9; 32])]).unwrap();
        let leftovers = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(std::result::Result::ok)
            .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }
}
