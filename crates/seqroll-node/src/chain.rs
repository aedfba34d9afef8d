//! Upstream block source over an `ethers` provider.

use std::sync::Arc;

use async_trait::async_trait;
use ethers::providers::{JsonRpcClient, Middleware, Provider};
use ethers::types::{Block, Transaction};
use seqroll_ingress::BlockSource;
use seqroll_types::{ObservedBlock, ObservedTransaction, Result, SequencerError};

use crate::provider::rpc_failure;

fn observed_block(block: Block<Transaction>) -> Result<ObservedBlock> {
    let number = block
        .number
        .ok_or_else(|| SequencerError::MalformedResponse {
            reason: "block without a number (still pending)".to_string(),
        })?
        .as_u64();
    if block.timestamp.bits() > 64 {
        return Err(SequencerError::MalformedResponse {
            reason: format!("block {number} timestamp {} out of range", block.timestamp),
        });
    }
    Ok(ObservedBlock {
        number,
        timestamp: block.timestamp.low_u64(),
        transactions: block
            .transactions
            .into_iter()
            .map(|tx| ObservedTransaction {
                hash: tx.hash,
                from: tx.from,
                to: tx.to,
                value: tx.value,
                input: tx.input.to_vec(),
            })
            .collect(),
    })
}

/// Reads blocks with `eth_blockNumber` / `eth_getBlockByNumber`.
pub struct RpcBlockSource<P> {
    provider: Arc<Provider<P>>,
}

impl<P: JsonRpcClient> RpcBlockSource<P> {
    pub fn new(provider: Arc<Provider<P>>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<P: JsonRpcClient + 'static> BlockSource for RpcBlockSource<P> {
    async fn head(&self) -> Result<u64> {
        let head = self
            .provider
            .get_block_number()
            .await
            .map_err(|e| rpc_failure("eth_blockNumber", &e))?;
        Ok(head.as_u64())
    }

    async fn block(&self, number: u64) -> Result<Option<ObservedBlock>> {
        self.provider
            .get_block_with_txs(number)
            .await
            .map_err(|e| rpc_failure("eth_getBlockByNumber", &e))?
            .map(observed_block)
            .transpose()
    }
}
