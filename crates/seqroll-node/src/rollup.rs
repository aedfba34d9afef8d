//! Rollup contract over an `ethers` provider.
//!
//! Write calls go out with `eth_sendTransaction` from the sequencer
//! account; the endpoint (node keystore or signer proxy) signs them. Each
//! call then waits on its `PendingTransaction` until the receipt arrives or
//! the confirmation timeout passes. Status reads are plain `eth_call`s.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ethers::abi::Detokenize;
use ethers::contract::builders::ContractCall;
use ethers::contract::{ContractError, EthEvent, parse_log};
use ethers::providers::{JsonRpcClient, Middleware, Provider};
use ethers::types::{Log, TransactionReceipt, U64};
use seqroll_settlement::RollupContract;
use seqroll_types::{
    Address, BatchIndex, ChainReceipt, Digest, OnChainStatus, Result, SequencerConfig,
    SequencerError, SubmitReceipt, U256, constants,
};

use crate::abi::{BatchSubmittedFilter, SeqrollRollup};
use crate::provider::rpc_failure;

fn chain_receipt(receipt: &TransactionReceipt) -> ChainReceipt {
    ChainReceipt {
        tx_hash: receipt.transaction_hash,
        block_number: receipt.block_number.map(|n| n.as_u64()),
    }
}

/// A mined receipt with status 0 means the call reverted.
fn check_status(method: &'static str, receipt: TransactionReceipt) -> Result<TransactionReceipt> {
    if receipt.status == Some(U64::zero()) {
        return Err(SequencerError::Reverted {
            tx_hash: format!("{:?}", receipt.transaction_hash),
            reason: format!("{method} reverted"),
        });
    }
    Ok(receipt)
}

fn call_error<M: Middleware>(method: &'static str, error: ContractError<M>) -> SequencerError {
    match error {
        ContractError::Revert(data) => SequencerError::Reverted {
            tx_hash: "(not sent)".to_string(),
            reason: format!("{method} reverted during estimation: {data}"),
        },
        other => rpc_failure(method, &other),
    }
}

/// Find the `BatchSubmitted` log emitted by `contract` and read its
/// indexed `batchIndex`.
fn batch_index_from_logs(logs: &[Log], contract: Address) -> Result<BatchIndex> {
    let log = logs
        .iter()
        .filter(|log| log.address == contract)
        .find(|log| log.topics.first() == Some(&BatchSubmittedFilter::signature()))
        .ok_or(SequencerError::MissingEvent {
            event: constants::BATCH_SUBMITTED_EVENT,
        })?;
    let event: BatchSubmittedFilter =
        parse_log(log.clone()).map_err(|e| SequencerError::MalformedResponse {
            reason: format!("undecodable BatchSubmitted log: {e}"),
        })?;
    if event.batch_index.bits() > 64 {
        return Err(SequencerError::MalformedResponse {
            reason: format!("batch index {} does not fit in u64", event.batch_index),
        });
    }
    Ok(BatchIndex(event.batch_index.low_u64()))
}

/// [`RollupContract`] backed by an Ethereum JSON-RPC endpoint.
pub struct RpcRollupContract<P> {
    binding: SeqrollRollup<Provider<P>>,
    account: Address,
    contract: Address,
    confirmation_timeout: Duration,
    receipt_poll_interval: Duration,
}

impl<P: JsonRpcClient + 'static> RpcRollupContract<P> {
    pub fn new(provider: Arc<Provider<P>>, config: &SequencerConfig) -> Self {
        Self {
            binding: SeqrollRollup::new(config.rollup_contract, provider),
            account: config.sequencer_account,
            contract: config.rollup_contract,
            confirmation_timeout: config.confirmation_timeout,
            receipt_poll_interval: Duration::from_millis(constants::RECEIPT_POLL_INTERVAL_MS),
        }
    }

    /// Send a contract call and wait until it is mined.
    async fn transact<D>(
        &self,
        method: &'static str,
        call: ContractCall<Provider<P>, D>,
    ) -> Result<TransactionReceipt>
    where
        D: Detokenize + Send + Sync,
    {
        let call = call.from(self.account);
        let pending = call.send().await.map_err(|e| call_error(method, e))?;
        let tx_hash = *pending;
        tracing::info!(method, tx_hash = ?tx_hash, "contract call sent, waiting for receipt");

        let pending = pending.interval(self.receipt_poll_interval);
        let mined = tokio::time::timeout(self.confirmation_timeout, pending)
            .await
            .map_err(|_| SequencerError::ConfirmationTimeout {
                tx_hash: format!("{tx_hash:?}"),
                waited_secs: self.confirmation_timeout.as_secs(),
            })?
            .map_err(|e| rpc_failure(method, &e))?;
        let receipt = mined.ok_or_else(|| SequencerError::MalformedResponse {
            reason: format!("{method} transaction {tx_hash:?} dropped before it was mined"),
        })?;
        check_status(method, receipt)
    }
}

#[async_trait]
impl<P: JsonRpcClient + 'static> RollupContract for RpcRollupContract<P> {
    async fn submit(&self, digest: Digest) -> Result<SubmitReceipt> {
        let receipt = self
            .transact("submitBatch", self.binding.submit_batch(digest.0))
            .await?;
        let batch_index = batch_index_from_logs(&receipt.logs, self.contract)?;
        Ok(SubmitReceipt {
            batch_index,
            receipt: chain_receipt(&receipt),
        })
    }

    async fn challenge(&self, index: BatchIndex, digest: Digest) -> Result<ChainReceipt> {
        let receipt = self
            .transact(
                "challengeBatch",
                self.binding.challenge_batch(U256::from(index.0), digest.0),
            )
            .await?;
        Ok(chain_receipt(&receipt))
    }

    async fn finalize(&self, index: BatchIndex) -> Result<ChainReceipt> {
        let receipt = self
            .transact("finalizeBatch", self.binding.finalize_batch(U256::from(index.0)))
            .await?;
        Ok(chain_receipt(&receipt))
    }

    async fn status(&self, index: BatchIndex) -> Result<OnChainStatus> {
        let code = self
            .binding
            .get_batch_status(U256::from(index.0))
            .call()
            .await
            .map_err(|e| call_error("getBatchStatus", e))?;
        OnChainStatus::from_code(index, u64::from(code))
    }
}
