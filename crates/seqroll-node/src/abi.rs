//! Typed bindings for the rollup contract.
//!
//! Four functions and one event. `abigen!` generates the call structs
//! (`SubmitBatchCall`, ...), the `BatchSubmittedFilter` event decoder and
//! the `SeqrollRollup<M>` client used by [`crate::rollup`].

use ethers::contract::abigen;

abigen!(
    SeqrollRollup,
    r#"[
        function submitBatch(bytes32 stateRoot) external returns (uint256)
        function challengeBatch(uint256 batchIndex, bytes32 newStateRoot) external
        function finalizeBatch(uint256 batchIndex) external
        function getBatchStatus(uint256 batchIndex) external view returns (uint8)
        event BatchSubmitted(uint256 indexed batchIndex, bytes32 indexed stateRoot, address indexed submitter)
    ]"#
);

#[cfg(test)]
mod tests {
    use ethers::abi::AbiEncode;
    use ethers::contract::{EthCall, EthEvent};
    use ethers::types::U256;

    use super::*;

    #[test]
    fn selectors_match_contract() {
        assert_eq!(hex::encode(SubmitBatchCall::selector()), "a23f6c50");
        assert_eq!(hex::encode(ChallengeBatchCall::selector()), "0b87a8b6");
        assert_eq!(hex::encode(FinalizeBatchCall::selector()), "e33491a7");
        assert_eq!(hex::encode(GetBatchStatusCall::selector()), "2d1bbc8e");
    }

    #[test]
    fn batch_submitted_topic() {
        assert_eq!(
            BatchSubmittedFilter::abi_signature(),
            "BatchSubmitted(uint256,bytes32,address)"
        );
        assert_eq!(
            hex::encode(BatchSubmittedFilter::signature()),
            "9bd662fbd8edd6a8a72ba606207db82bc470f703388a7ad8ec5868dd6857907e"
        );
    }

    #[test]
    fn challenge_calldata_layout() {
        let data = ChallengeBatchCall {
            batch_index: U256::from(5),
            new_state_root: [0xAB; 32],
        }
        .encode();
        assert_eq!(data.len(), 4 + 64);
        assert_eq!(data[..4], ChallengeBatchCall::selector());
        assert_eq!(data[4 + 31], 5);
        assert!(data[4..4 + 31].iter().all(|&b| b == 0));
        assert!(data[36..].iter().all(|&b| b == 0xAB));
    }

    #[test]
    fn submit_calldata_layout() {
        let data = SubmitBatchCall {
            state_root: [0x01; 32],
        }
        .encode();
        assert_eq!(data.len(), 36);
        assert_eq!(&data[4..], &[0x01; 32]);
    }
}
