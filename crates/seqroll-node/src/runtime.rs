//! Task wiring for a running sequencer.
//!
//! ```text
//!  poller ──heights──▶ mpsc ──▶ block handler ─┐
//!  finalize timer ─────────────────────────────┼──▶ Mutex<Sequencer>
//!  console (stdin) ────────────────────────────┘
//! ```
//!
//! The three entry points share one `tokio::sync::Mutex`, so block
//! handling, fraud proofs and finalization never interleave. Blocks are
//! queued and handled one at a time in height order. Shutdown is a
//! `watch` channel flipped by `exit`, stdin EOF, or Ctrl-C.

use std::io::BufRead;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use seqroll_ingress::BlockSource;
use seqroll_settlement::{RollupContract, Sequencer};
use seqroll_store::BatchStore;
use seqroll_types::{CapturedTransaction, ObservedBlock, SequencerConfig, constants};
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;

use crate::commands::{Command, USAGE};

type Shared<S, C> = Arc<Mutex<Sequencer<S, C>>>;

/// Run until shutdown, reading console commands from stdin.
pub async fn run<S, C, B>(
    config: SequencerConfig,
    sequencer: Sequencer<S, C>,
    source: Arc<B>,
) -> anyhow::Result<()>
where
    S: BatchStore + Sync + 'static,
    C: RollupContract + 'static,
    B: BlockSource + 'static,
{
    let (line_tx, line_rx) = mpsc::channel(16);
    spawn_stdin_reader(line_tx);
    serve(&config, Arc::new(Mutex::new(sequencer)), source, line_rx).await?;
    Ok(())
}

/// Drive all tasks until shutdown. Returns the buffered transactions that
/// were never submitted.
async fn serve<S, C, B>(
    config: &SequencerConfig,
    sequencer: Shared<S, C>,
    source: Arc<B>,
    lines: mpsc::Receiver<String>,
) -> anyhow::Result<Vec<CapturedTransaction>>
where
    S: BatchStore + Sync + 'static,
    C: RollupContract + 'static,
    B: BlockSource + 'static,
{
    let resume = sequencer.lock().await.resume_height();
    let start = match resume {
        Some(height) => {
            tracing::info!(height, "resuming from checkpoint");
            height
        }
        None => {
            let head = source.head().await.context("reading chain head")?;
            tracing::info!(head, "no checkpoint, starting at chain head");
            head
        }
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (block_tx, block_rx) = mpsc::channel(constants::BLOCK_QUEUE_CAPACITY);

    let tasks: Vec<JoinHandle<()>> = vec![
        tokio::spawn(poll_blocks(
            Arc::clone(&source),
            start,
            config.poll_interval,
            block_tx,
            shutdown_rx.clone(),
        )),
        tokio::spawn(handle_blocks(
            Arc::clone(&sequencer),
            Arc::clone(&source),
            config.poll_interval,
            block_rx,
            shutdown_rx.clone(),
        )),
        tokio::spawn(finalize_periodically(
            Arc::clone(&sequencer),
            config.finalize_interval,
            shutdown_rx.clone(),
        )),
        tokio::spawn(console(
            Arc::clone(&sequencer),
            lines,
            shutdown_tx.clone(),
            shutdown_rx.clone(),
        )),
    ];

    let mut shutdown = shutdown_rx.clone();
    tokio::select! {
        _ = shutdown.changed() => {}
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "failed to listen for Ctrl-C");
            }
            tracing::info!("interrupt received");
        }
    }
    let _ = shutdown_tx.send(true);

    for task in tasks {
        if let Err(e) = task.await {
            tracing::error!(error = %e, "task ended abnormally");
        }
    }

    let seq = sequencer.lock().await;
    let lost = seq.buffered();
    if !lost.is_empty() {
        tracing::warn!(count = lost.len(), "buffered transactions not submitted before shutdown");
        for tx in &lost {
            tracing::warn!(tx_hash = ?tx.tx_hash, block = tx.block_number, "lost");
        }
    }
    tracing::info!(status = %seq.status(), "sequencer stopped");
    Ok(lost)
}

/// Enqueue every new block height in order.
async fn poll_blocks<B: BlockSource>(
    source: Arc<B>,
    mut next: u64,
    interval: Duration,
    queue: mpsc::Sender<u64>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        match source.head().await {
            Ok(head) => {
                let last = head.min(next.saturating_add(constants::MAX_BLOCKS_PER_POLL - 1));
                while next <= last {
                    if queue.send(next).await.is_err() {
                        return;
                    }
                    next += 1;
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to read chain head"),
        }
        tokio::select! {
            _ = shutdown.changed() => break,
            () = tokio::time::sleep(interval) => {}
        }
    }
    tracing::debug!(next, "block poller stopped");
}

/// Handle queued heights one at a time.
async fn handle_blocks<S, C, B>(
    sequencer: Shared<S, C>,
    source: Arc<B>,
    retry_interval: Duration,
    mut queue: mpsc::Receiver<u64>,
    mut shutdown: watch::Receiver<bool>,
) where
    S: BatchStore + Sync,
    C: RollupContract,
    B: BlockSource,
{
    loop {
        let height = tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            height = queue.recv() => match height {
                Some(height) => height,
                None => break,
            },
        };
        let Some(block) = fetch_block(source.as_ref(), height, retry_interval, &mut shutdown).await
        else {
            break;
        };

        let mut seq = sequencer.lock().await;
        match seq.on_block(&block, Utc::now()).await {
            Ok(report) => {
                for record in &report.submitted {
                    tracing::info!(
                        block = height,
                        batch_index = %record.batch_index,
                        digest = ?record.digest,
                        "batch committed"
                    );
                }
            }
            Err(e) => tracing::error!(block = height, error = %e, "failed to record checkpoint"),
        }
    }
    tracing::debug!("block handler stopped");
}

/// Fetch a block, retrying until it is available. `None` on shutdown.
async fn fetch_block<B: BlockSource>(
    source: &B,
    height: u64,
    retry_interval: Duration,
    shutdown: &mut watch::Receiver<bool>,
) -> Option<ObservedBlock> {
    loop {
        match source.block(height).await {
            Ok(Some(block)) => return Some(block),
            Ok(None) => tracing::debug!(block = height, "block not available yet"),
            Err(e) => tracing::warn!(block = height, error = %e, "failed to fetch block"),
        }
        tokio::select! {
            _ = shutdown.changed() => return None,
            () = tokio::time::sleep(retry_interval) => {}
        }
    }
}

async fn finalize_periodically<S, C>(
    sequencer: Shared<S, C>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) where
    S: BatchStore + Sync,
    C: RollupContract,
{
    let mut ticker = tokio::time::interval(period);
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {
                let report = sequencer.lock().await.run_finalization(Utc::now()).await;
                for (index, reason) in &report.failed {
                    tracing::error!(batch_index = %index, reason = %reason, "finalization failed");
                }
            }
        }
    }
    tracing::debug!("finalization scheduler stopped");
}

/// Read stdin on a plain thread; tokio's stdin would block runtime shutdown.
fn spawn_stdin_reader(lines: mpsc::Sender<String>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if lines.blocking_send(line).is_err() {
                break;
            }
        }
    });
}

async fn console<S, C>(
    sequencer: Shared<S, C>,
    mut lines: mpsc::Receiver<String>,
    shutdown_tx: watch::Sender<bool>,
    mut shutdown: watch::Receiver<bool>,
) where
    S: BatchStore + Sync,
    C: RollupContract,
{
    println!("{USAGE}");
    loop {
        let line = tokio::select! {
            _ = shutdown.changed() => break,
            line = lines.recv() => match line {
                Some(line) => line,
                None => {
                    tracing::info!("stdin closed, shutting down");
                    let _ = shutdown_tx.send(true);
                    break;
                }
            },
        };
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                println!("{e}\n{USAGE}");
                continue;
            }
        };
        match command {
            Command::Exit => {
                let _ = shutdown_tx.send(true);
                break;
            }
            Command::Help => println!("{USAGE}"),
            Command::Status => println!("{}", sequencer.lock().await.status()),
            Command::Get(digest) => match sequencer.lock().await.batch(&digest) {
                Ok(record) => match serde_json::to_string_pretty(&record) {
                    Ok(json) => println!("{record}\n{json}"),
                    Err(e) => println!("{e}"),
                },
                Err(e) => println!("{e}"),
            },
            Command::Fraud(tx_hash) => {
                let outcome = sequencer
                    .lock()
                    .await
                    .apply_fraud_proof(&tx_hash, Utc::now())
                    .await;
                match outcome {
                    Ok(outcome) => println!("{outcome}"),
                    Err(e) => println!("fraud proof failed: {e}"),
                }
            }
        }
    }
    tracing::debug!("console stopped");
}
