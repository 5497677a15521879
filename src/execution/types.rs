use alloy_primitives::{B256, U128, U64};
use serde::Deserialize;

/// Response from `eth_getBlockByNumber` (transaction hashes only).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionBlock {
    pub number: U64,
    /// Transaction hashes in on-chain order.
    pub transactions: Vec<B256>,
}

/// Response from `eth_getTransactionReceipt`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    pub gas_used: U64,
    pub effective_gas_price: U128,
}

impl TransactionReceipt {
    /// Fee paid by this transaction: `gasUsed * effectiveGasPrice`, in wei.
    /// `None` on overflow so the caller can surface an invariant error.
    pub fn fee_wei(&self) -> Option<u128> {
        self.gas_used
            .to::<u128>()
            .checked_mul(self.effective_gas_price.to::<u128>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::b256;

    #[test]
    fn test_parse_receipt_hex_quantities() {
        let json = r#"{
            "transactionHash": "0x7f1e1a1bd342a4b973e4e632e50c3bf1f2cb55f58b09ae01fbd3e43e3e210a46",
            "gasUsed": "0x5208",
            "effectiveGasPrice": "0x3b9aca00",
            "status": "0x1"
        }"#;
        let receipt: TransactionReceipt = serde_json::from_str(json).unwrap();

        assert_eq!(
            receipt.transaction_hash,
            b256!("7f1e1a1bd342a4b973e4e632e50c3bf1f2cb55f58b09ae01fbd3e43e3e210a46")
        );
        assert_eq!(receipt.gas_used.to::<u64>(), 21_000);
        assert_eq!(receipt.effective_gas_price.to::<u128>(), 1_000_000_000);
        assert_eq!(receipt.fee_wei(), Some(21_000u128 * 1_000_000_000u128));
    }

    #[test]
    fn test_fee_overflow_is_none() {
        let receipt = TransactionReceipt {
            transaction_hash: B256::ZERO,
            gas_used: U64::MAX,
            effective_gas_price: U128::MAX,
        };
        assert_eq!(receipt.fee_wei(), None);
    }

    #[test]
    fn test_parse_block_with_hashes() {
        let json = r#"{
            "number": "0x1162bd9",
            "hash": "0x01a2b3c4d5e6f7a8b9c0d1e2f3a4b5c6d7e8f9a0b1c2d3e4f5a6b7c8d9e0f1a2",
            "transactions": [
                "0x7f1e1a1bd342a4b973e4e632e50c3bf1f2cb55f58b09ae01fbd3e43e3e210a46"
            ]
        }"#;
        let block: ExecutionBlock = serde_json::from_str(json).unwrap();
        assert_eq!(block.number.to::<u64>(), 18_230_233);
        assert_eq!(block.transactions.len(), 1);
    }
}
