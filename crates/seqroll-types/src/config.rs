//! Configuration for a Seqroll sequencer process.
//!
//! Everything is supplied at startup. Values are read through a key lookup
//! (the process environment in production, a map in tests), and missing
//! required keys are fatal configuration errors.

use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{Address, Result, SequencerError, constants};

/// Environment variable names.
pub mod env_keys {
    pub const RPC_URL: &str = "SEQROLL_RPC_URL";
    pub const ACCOUNT: &str = "SEQROLL_ACCOUNT";
    pub const ROLLUP_CONTRACT: &str = "SEQROLL_ROLLUP_CONTRACT";
    pub const WATCHED: &str = "SEQROLL_WATCHED";
    pub const BATCH_THRESHOLD: &str = "SEQROLL_BATCH_THRESHOLD";
    pub const CHALLENGE_WINDOW_SECS: &str = "SEQROLL_CHALLENGE_WINDOW_SECS";
    pub const FINALIZE_INTERVAL_SECS: &str = "SEQROLL_FINALIZE_INTERVAL_SECS";
    pub const POLL_INTERVAL_MS: &str = "SEQROLL_POLL_INTERVAL_MS";
    pub const CONFIRMATION_TIMEOUT_SECS: &str = "SEQROLL_CONFIRMATION_TIMEOUT_SECS";
    pub const DATA_DIR: &str = "SEQROLL_DATA_DIR";
}

/// Full configuration of one sequencer process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequencerConfig {
    /// JSON-RPC endpoint of the upstream chain.
    pub rpc_url: String,
    /// Account the sequencer sends contract calls from. The RPC endpoint
    /// (or a signer proxy in front of it) holds its key.
    pub sequencer_account: Address,
    /// Address of the rollup contract.
    pub rollup_contract: Address,
    /// Addresses whose transactions are captured.
    pub watched_addresses: Vec<Address>,
    /// Transactions per batch.
    pub batch_threshold: usize,
    /// How long a submitted batch stays open to fraud proofs.
    pub challenge_window: Duration,
    /// Period of the finalization scan.
    pub finalize_interval: Duration,
    /// Period of the upstream head poll.
    pub poll_interval: Duration,
    /// How long to wait for a contract call to be mined.
    pub confirmation_timeout: Duration,
    /// Directory holding batch records and the resume checkpoint.
    pub data_dir: PathBuf,
}

impl SequencerConfig {
    /// Configuration with the required values and defaults for the rest.
    #[must_use]
    pub fn new(
        rpc_url: impl Into<String>,
        sequencer_account: Address,
        rollup_contract: Address,
        watched_addresses: Vec<Address>,
    ) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            sequencer_account,
            rollup_contract,
            watched_addresses,
            batch_threshold: constants::DEFAULT_BATCH_THRESHOLD,
            challenge_window: Duration::from_secs(constants::DEFAULT_CHALLENGE_WINDOW_SECS),
            finalize_interval: Duration::from_secs(constants::DEFAULT_FINALIZE_INTERVAL_SECS),
            poll_interval: Duration::from_millis(constants::DEFAULT_POLL_INTERVAL_MS),
            confirmation_timeout: Duration::from_secs(
                constants::DEFAULT_CONFIRMATION_TIMEOUT_SECS,
            ),
            data_dir: PathBuf::from(constants::DEFAULT_DATA_DIR),
        }
    }

    /// Read the configuration through an arbitrary key lookup.
    ///
    /// Blank values count as missing. The result is validated.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &'static str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |key: &'static str| get(key).ok_or(SequencerError::MissingConfig { key });

        let rpc_url = require(env_keys::RPC_URL)?;
        let sequencer_account = parse_address(env_keys::ACCOUNT, &require(env_keys::ACCOUNT)?)?;
        let rollup_contract = parse_address(
            env_keys::ROLLUP_CONTRACT,
            &require(env_keys::ROLLUP_CONTRACT)?,
        )?;
        let watched_addresses = parse_address_list(env_keys::WATCHED, &require(env_keys::WATCHED)?)?;

        let mut config = Self::new(rpc_url, sequencer_account, rollup_contract, watched_addresses);

        if let Some(threshold) = parse_u64(env_keys::BATCH_THRESHOLD, get(env_keys::BATCH_THRESHOLD))? {
            config.batch_threshold =
                usize::try_from(threshold).map_err(|e| SequencerError::InvalidConfig {
                    key: env_keys::BATCH_THRESHOLD,
                    reason: e.to_string(),
                })?;
        }
        if let Some(secs) = parse_u64(
            env_keys::CHALLENGE_WINDOW_SECS,
            get(env_keys::CHALLENGE_WINDOW_SECS),
        )? {
            config.challenge_window = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_u64(
            env_keys::FINALIZE_INTERVAL_SECS,
            get(env_keys::FINALIZE_INTERVAL_SECS),
        )? {
            config.finalize_interval = Duration::from_secs(secs);
        }
        if let Some(ms) = parse_u64(env_keys::POLL_INTERVAL_MS, get(env_keys::POLL_INTERVAL_MS))? {
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_u64(
            env_keys::CONFIRMATION_TIMEOUT_SECS,
            get(env_keys::CONFIRMATION_TIMEOUT_SECS),
        )? {
            config.confirmation_timeout = Duration::from_secs(secs);
        }
        if let Some(dir) = get(env_keys::DATA_DIR) {
            config.data_dir = PathBuf::from(dir);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    /// Returns `InvalidConfig` naming the first offending key.
    pub fn validate(&self) -> Result<()> {
        if !(self.rpc_url.starts_with("http://") || self.rpc_url.starts_with("https://")) {
            return Err(SequencerError::InvalidConfig {
                key: env_keys::RPC_URL,
                reason: format!("expected an http(s) URL, got {:?}", self.rpc_url),
            });
        }
        if self.watched_addresses.is_empty() {
            return Err(SequencerError::InvalidConfig {
                key: env_keys::WATCHED,
                reason: "watch list is empty".to_string(),
            });
        }
        if self.batch_threshold == 0 {
            return Err(SequencerError::InvalidConfig {
                key: env_keys::BATCH_THRESHOLD,
                reason: "must be at least 1".to_string(),
            });
        }
        if self.finalize_interval.is_zero() {
            return Err(SequencerError::InvalidConfig {
                key: env_keys::FINALIZE_INTERVAL_SECS,
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.poll_interval.is_zero() {
            return Err(SequencerError::InvalidConfig {
                key: env_keys::POLL_INTERVAL_MS,
                reason: "must be greater than zero".to_string(),
            });
        }
        self.challenge_window_delta()?;
        Ok(())
    }

    /// The challenge window as a calendar duration.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if the window does not fit a calendar duration.
    pub fn challenge_window_delta(&self) -> Result<chrono::Duration> {
        chrono::Duration::from_std(self.challenge_window).map_err(|e| {
            SequencerError::InvalidConfig {
                key: env_keys::CHALLENGE_WINDOW_SECS,
                reason: e.to_string(),
            }
        })
    }
}

fn parse_address(key: &'static str, value: &str) -> Result<Address> {
    crate::parse_address(value).map_err(|e| SequencerError::InvalidConfig {
        key,
        reason: e.to_string(),
    })
}

fn parse_address_list(key: &'static str, value: &str) -> Result<Vec<Address>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| parse_address(key, s))
        .collect()
}

fn parse_u64(key: &'static str, value: Option<String>) -> Result<Option<u64>> {
    value
        .map(|v| {
            v.parse::<u64>().map_err(|e| SequencerError::InvalidConfig {
                key,
                reason: format!("{v:?}: {e}"),
            })
        })
        .transpose()
}
