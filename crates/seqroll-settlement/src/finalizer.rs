//! Finalization scheduler.
//!
//! One cycle visits every unfinalized record. A record still inside its
//! challenge window is skipped without touching the chain. Past the
//! window, the on-chain status decides:
//!
//! | status      | action                                              |
//! |-------------|-----------------------------------------------------|
//! | `Open`      | call `finalize`, then mark the record finalized     |
//! | `Finalized` | mark the record finalized without a call (reconcile)|
//!
//! Finalization only updates the `finalized` flag; the digest and key are
//! unchanged. A failure on one record is logged and counted, and the cycle
//! moves on; the record is retried on the next cycle.

use chrono::{DateTime, Duration, Utc};
use seqroll_store::BatchStore;
use seqroll_types::{BatchIndex, BatchRecord, OnChainStatus, Result, SequencerError};

use crate::contract::RollupContract;

/// Summary of one scheduler cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinalizationReport {
    /// Unfinalized records visited.
    pub scanned: usize,
    /// Records finalized by a `finalize` call this cycle.
    pub finalized: usize,
    /// Records still inside their challenge window.
    pub pending_window: usize,
    /// Records the chain had already finalized.
    pub reconciled: usize,
    /// Records that failed, with the reason.
    pub failed: Vec<(BatchIndex, String)>,
}

impl std::fmt::Display for FinalizationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "scanned={} finalized={} pending={} reconciled={} failed={}",
            self.scanned,
            self.finalized,
            self.pending_window,
            self.reconciled,
            self.failed.len()
        )
    }
}

enum Step {
    PendingWindow,
    Finalized,
    Reconciled,
}

/// Finalizes batches whose challenge window has elapsed.
pub struct FinalizationScheduler<'a, S, C> {
    store: &'a mut S,
    contract: &'a C,
    challenge_window: Duration,
}

impl<'a, S: BatchStore, C: RollupContract> FinalizationScheduler<'a, S, C> {
    pub fn new(store: &'a mut S, contract: &'a C, challenge_window: Duration) -> Self {
        Self {
            store,
            contract,
            challenge_window,
        }
    }

    /// Run one scan over the store as of `now`.
    pub async fn run_cycle(&mut self, now: DateTime<Utc>) -> FinalizationReport {
        let mut report = FinalizationReport::default();

        for record in self.store.unfinalized() {
            report.scanned += 1;
            let batch_index = record.batch_index;
            let digest = record.digest;
            match self.process(record, now).await {
                Ok(Step::PendingWindow) => report.pending_window += 1,
                Ok(Step::Finalized) => report.finalized += 1,
                Ok(Step::Reconciled) => report.reconciled += 1,
                Err(e) => {
                    tracing::warn!(
                        batch_index = %batch_index,
                        digest = ?digest,
                        error = %e,
                        "finalization failed, retrying next cycle"
                    );
                    report.failed.push((batch_index, e.to_string()));
                }
            }
        }

        tracing::info!(%report, "finalization cycle complete");
        report
    }

    async fn process(&mut self, mut record: BatchRecord, now: DateTime<Utc>) -> Result<Step> {
        let deadline = record
            .challenge_deadline(self.challenge_window)
            .ok_or_else(|| SequencerError::Internal("challenge deadline out of range".into()))?;
        if now < deadline {
            tracing::debug!(batch_index = %record.batch_index, %deadline, "challenge window open");
            return Ok(Step::PendingWindow);
        }

        match self.contract.status(record.batch_index).await? {
            OnChainStatus::Finalized => {
                record.mark_finalized()?;
                self.store.put(record.clone())?;
                tracing::info!(
                    batch_index = %record.batch_index,
                    digest = ?record.digest,
                    "already finalized on-chain, record reconciled"
                );
                Ok(Step::Reconciled)
            }
            OnChainStatus::Open => {
                tracing::info!(batch_index = %record.batch_index, "finalizing batch");
                let receipt = self.contract.finalize(record.batch_index).await?;
                record.mark_finalized()?;
                self.store.put(record.clone())?;
                tracing::info!(
                    batch_index = %record.batch_index,
                    digest = ?record.digest,
                    tx = %receipt,
                    "batch finalized"
                );
                Ok(Step::Finalized)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use seqroll_store::MemoryBatchStore;
    use seqroll_types::CapturedTransaction;

    use super::*;
    use crate::contract::{CallKind, MockRollup};
    use crate::submitter::Submitter;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn window() -> Duration {
        Duration::days(7)
    }

    async fn seeded(batches: &[&[u8]]) -> (MemoryBatchStore, MockRollup) {
        let mut store = MemoryBatchStore::new();
        let rollup = MockRollup::new();
        let mut submitter = Submitter::new(&mut store, &rollup);
        for seeds in batches {
            let txs: Vec<CapturedTransaction> =
                seeds.iter().map(|&s| CapturedTransaction::dummy(s, 1)).collect();
            submitter.submit_batch(&txs, t0()).await.unwrap();
        }
        (store, rollup)
    }

    #[tokio::test]
    async fn never_before_window() {
        let (mut store, rollup) = seeded(&[&[1, 2, 3]]).await;
        let just_before = t0() + window() - Duration::seconds(1);

        let report = FinalizationScheduler::new(&mut store, &rollup, window())
            .run_cycle(just_before)
            .await;
        assert_eq!(report.pending_window, 1);
        assert_eq!(report.finalized, 0);
        assert_eq!(rollup.count(CallKind::Finalize), 0);
        assert_eq!(store.unfinalized().len(), 1);
    }

    #[tokio::test]
    async fn finalizes_at_deadline() {
        let (mut store, rollup) = seeded(&[&[1, 2, 3]]).await;
        let digest = store.list()[0].digest;

        let report = FinalizationScheduler::new(&mut store, &rollup, window())
            .run_cycle(t0() + window())
            .await;
        assert_eq!(report.finalized, 1);
        assert_eq!(rollup.count(CallKind::Finalize), 1);
        assert!(store.get(&digest).unwrap().finalized);
    }

    #[tokio::test]
    async fn second_cycle_makes_no_calls() {
        let (mut store, rollup) = seeded(&[&[1, 2, 3]]).await;
        let later = t0() + window() + Duration::hours(1);
        let mut scheduler = FinalizationScheduler::new(&mut store, &rollup, window());
        scheduler.run_cycle(later).await;
        let calls_after_first = rollup.calls().len();

        let report = scheduler.run_cycle(later).await;
        assert_eq!(report, FinalizationReport::default());
        assert_eq!(rollup.calls().len(), calls_after_first);
    }

    #[tokio::test]
    async fn chain_finalized_is_reconciled() {
        let (mut store, rollup) = seeded(&[&[1, 2, 3]]).await;
        rollup.set_status(BatchIndex(0), OnChainStatus::Finalized);

        let report = FinalizationScheduler::new(&mut store, &rollup, window())
            .run_cycle(t0() + window())
            .await;
        assert_eq!(report.reconciled, 1);
        assert_eq!(rollup.count(CallKind::Finalize), 0);
        assert!(store.unfinalized().is_empty());
    }

    #[tokio::test]
    async fn failure_does_not_stop_cycle() {
        let (mut store, rollup) = seeded(&[&[1, 2, 3], &[4, 5, 6]]).await;
        rollup.fail_next(CallKind::Finalize);
        let at = t0() + window();

        let report = FinalizationScheduler::new(&mut store, &rollup, window())
            .run_cycle(at)
            .await;
        assert_eq!(report.scanned, 2);
        assert_eq!(report.finalized, 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(store.unfinalized().len(), 1);

        // Retried on the next cycle.
        let report = FinalizationScheduler::new(&mut store, &rollup, window())
            .run_cycle(at)
            .await;
        assert_eq!(report.finalized, 1);
        assert!(store.unfinalized().is_empty());
    }
}
