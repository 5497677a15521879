use anyhow::{Context, Result};
use alloy_primitives::{Address, Bytes};
use serde::Deserialize;

/// Response from `eth/v2/beacon/blocks/{slot}`
#[derive(Debug, Clone, Deserialize)]
pub struct BlockResponse {
    pub data: SignedBeaconBlock,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignedBeaconBlock {
    pub message: BeaconBlock,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BeaconBlock {
    pub slot: String,
    pub proposer_index: String,
    pub body: BeaconBlockBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BeaconBlockBody {
    pub execution_payload: ExecutionPayload,
}

/// Embedded execution-layer payload. Integer fields arrive as decimal
/// strings and must be parsed before any arithmetic; `transactions` holds
/// the raw signed transaction envelopes.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionPayload {
    pub fee_recipient: Address,
    pub block_number: String,
    pub gas_used: String,
    pub base_fee_per_gas: String,
    pub transactions: Vec<Bytes>,
}

impl ExecutionPayload {
    pub fn block_number(&self) -> Result<u64> {
        self.block_number
            .parse()
            .with_context(|| format!("invalid block_number {:?}", self.block_number))
    }

    pub fn gas_used(&self) -> Result<u64> {
        self.gas_used
            .parse()
            .with_context(|| format!("invalid gas_used {:?}", self.gas_used))
    }

    pub fn base_fee_per_gas(&self) -> Result<u64> {
        self.base_fee_per_gas
            .parse()
            .with_context(|| format!("invalid base_fee_per_gas {:?}", self.base_fee_per_gas))
    }

    /// Base fee burned by the block, from the payload's own values.
    pub fn base_fee(&self) -> Result<u128> {
        // u64 * u64 always fits in u128
        Ok(u128::from(self.base_fee_per_gas()?) * u128::from(self.gas_used()?))
    }
}

/// Response from `eth/v1/beacon/headers/head`
#[derive(Debug, Clone, Deserialize)]
pub struct HeaderResponse {
    pub data: HeaderData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeaderData {
    pub header: SignedHeader,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignedHeader {
    pub message: HeaderMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeaderMessage {
    pub slot: String,
}

impl HeaderResponse {
    pub fn slot(&self) -> Result<u64> {
        let slot = &self.data.header.message.slot;
        slot.parse()
            .with_context(|| format!("invalid head slot {slot:?}"))
    }
}

/// Response from `eth/v1/beacon/states/{state}/sync_committees`
#[derive(Debug, Clone, Deserialize)]
pub struct SyncCommitteeResponse {
    pub data: SyncCommitteeData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncCommitteeData {
    pub validators: Vec<String>,
}

/// Response from `eth/v1/beacon/states/{state}/validators/{index}`
#[derive(Debug, Clone, Deserialize)]
pub struct ValidatorResponse {
    pub data: ValidatorData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidatorData {
    pub validator: ValidatorInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidatorInfo {
    pub pubkey: String,
}
