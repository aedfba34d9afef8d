//! JSON-RPC provider shared by the block source and the rollup contract.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use ethers::providers::{Http, Provider};
use seqroll_types::{Result, SequencerError, env_keys};

/// HTTP provider for `url`, polling at `interval` while it waits on
/// pending transactions.
///
/// # Errors
/// Returns `InvalidConfig` if `url` does not parse.
pub fn connect(url: &str, interval: Duration) -> Result<Arc<Provider<Http>>> {
    let provider = Provider::<Http>::try_from(url).map_err(|e| SequencerError::InvalidConfig {
        key: env_keys::RPC_URL,
        reason: e.to_string(),
    })?;
    Ok(Arc::new(provider.interval(interval)))
}

pub(crate) fn rpc_failure(call: &str, error: &impl Display) -> SequencerError {
    SequencerError::Rpc {
        reason: format!("{call}: {error}"),
    }
}
