//! Seqroll sequencer process.
//!
//! Startup:
//! 1. Parse CLI flags (each falls back to its `SEQROLL_*` environment variable)
//! 2. Initialize tracing
//! 3. Build and validate the configuration; missing values abort startup
//! 4. Open the batch store under the data directory
//! 5. Build the `ethers` provider and the chain adapters on top of it
//! 6. Run the poller, block handler, finalization timer and console until shutdown

mod abi;
mod chain;
mod commands;
mod provider;
mod rollup;
mod runtime;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use seqroll_settlement::Sequencer;
use seqroll_store::FileBatchStore;
use seqroll_types::{SequencerConfig, constants, env_keys};
use tracing_subscriber::EnvFilter;

use crate::chain::RpcBlockSource;
use crate::rollup::RpcRollupContract;

/// Optimistic-rollup sequencer.
#[derive(Parser, Debug)]
#[command(name = "seqroll", version)]
#[command(about = "Watches a chain for watched-address transactions and commits them as rollup batches")]
struct Args {
    /// Upstream chain JSON-RPC endpoint
    #[arg(long, env = env_keys::RPC_URL)]
    rpc_url: Option<String>,

    /// Sequencer account sending contract calls (signed by the endpoint)
    #[arg(long, env = env_keys::ACCOUNT)]
    account: Option<String>,

    /// Rollup contract address
    #[arg(long, env = env_keys::ROLLUP_CONTRACT)]
    rollup_contract: Option<String>,

    /// Comma-separated watched addresses
    #[arg(long, env = env_keys::WATCHED)]
    watched: Option<String>,

    /// Transactions per batch
    #[arg(long, env = env_keys::BATCH_THRESHOLD)]
    batch_threshold: Option<u64>,

    /// Challenge window in seconds
    #[arg(long, env = env_keys::CHALLENGE_WINDOW_SECS)]
    challenge_window_secs: Option<u64>,

    /// Seconds between finalization scans
    #[arg(long, env = env_keys::FINALIZE_INTERVAL_SECS)]
    finalize_interval_secs: Option<u64>,

    /// Milliseconds between chain head polls
    #[arg(long, env = env_keys::POLL_INTERVAL_MS)]
    poll_interval_ms: Option<u64>,

    /// Seconds to wait for a contract call to be mined
    #[arg(long, env = env_keys::CONFIRMATION_TIMEOUT_SECS)]
    confirmation_timeout_secs: Option<u64>,

    /// Directory holding batch records and the resume checkpoint
    #[arg(long, env = env_keys::DATA_DIR)]
    data_dir: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, env = "SEQROLL_LOG_JSON")]
    log_json: bool,
}

impl Args {
    /// Configuration lookup backed by the parsed flags.
    fn lookup(&self, key: &str) -> Option<String> {
        let number = |v: Option<u64>| v.map(|n| n.to_string());
        match key {
            env_keys::RPC_URL => self.rpc_url.clone(),
            env_keys::ACCOUNT => self.account.clone(),
            env_keys::ROLLUP_CONTRACT => self.rollup_contract.clone(),
            env_keys::WATCHED => self.watched.clone(),
            env_keys::BATCH_THRESHOLD => number(self.batch_threshold),
            env_keys::CHALLENGE_WINDOW_SECS => number(self.challenge_window_secs),
            env_keys::FINALIZE_INTERVAL_SECS => number(self.finalize_interval_secs),
            env_keys::POLL_INTERVAL_MS => number(self.poll_interval_ms),
            env_keys::CONFIRMATION_TIMEOUT_SECS => number(self.confirmation_timeout_secs),
            env_keys::DATA_DIR => self.data_dir.as_ref().map(|p| p.display().to_string()),
            _ => None,
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json);

    let config =
        SequencerConfig::from_lookup(|key| args.lookup(key)).context("invalid configuration")?;
    tracing::info!(
        engine = constants::ENGINE_NAME,
        version = constants::VERSION,
        rpc_url = %config.rpc_url,
        rollup_contract = ?config.rollup_contract,
        watched = config.watched_addresses.len(),
        batch_threshold = config.batch_threshold,
        challenge_window_secs = config.challenge_window.as_secs(),
        "starting sequencer"
    );

    let store = FileBatchStore::open(&config.data_dir)
        .with_context(|| format!("opening batch store at {}", config.data_dir.display()))?;
    if !store.open_report().is_clean() {
        tracing::warn!(
            skipped = store.open_report().skipped.len(),
            "some batch records could not be loaded"
        );
    }

    let provider = provider::connect(&config.rpc_url, config.poll_interval)
        .context("creating JSON-RPC provider")?;
    let contract = RpcRollupContract::new(Arc::clone(&provider), &config);
    let source = Arc::new(RpcBlockSource::new(provider));
    let sequencer =
        Sequencer::from_config(&config, store, contract).context("building sequencer")?;

    runtime::run(config, sequencer, source).await
}
