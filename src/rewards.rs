use crate::beacon::types::{ExecutionPayload, SignedBeaconBlock};
use crate::beacon::BeaconApi;
use crate::error::ApiError;
use crate::execution::ExecutionApi;
use alloy_consensus::transaction::SignerRecoverable;
use alloy_consensus::{Transaction, TxEnvelope};
use alloy_eips::eip2718::Decodable2718;
use alloy_primitives::B256;
use anyhow::anyhow;
use futures::future::try_join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::debug;

/// How the block was most likely built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockOrigin {
    /// Built internally by the validator node; the reward is the priority
    /// fees (total transaction fees minus the burned base fee).
    Internal,
    /// Delivered by an external MEV relay; the reward is the builder's
    /// payout transaction to the fee recipient.
    MevRelay,
}

impl BlockOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockOrigin::Internal => "built internally in the validator node",
            BlockOrigin::MevRelay => "produced by a MEV relay",
        }
    }
}

/// Effective block reward in wei plus the origin classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardResult {
    pub reward_wei: u128,
    pub origin: BlockOrigin,
}

/// Fetch the beacon block for `slot`, disambiguating an absent block into
/// "future" vs "missed" by comparing against the current head slot. The
/// beacon API reports both cases identically, so only the head comparison
/// can tell them apart.
pub async fn resolve_slot(
    beacon: &dyn BeaconApi,
    slot: u64,
) -> Result<SignedBeaconBlock, ApiError> {
    match beacon.block_by_slot(slot).await.map_err(ApiError::upstream)? {
        Some(block) => Ok(block),
        None => {
            let head = beacon.head_slot().await.map_err(ApiError::upstream)?;
            if slot > head {
                Err(ApiError::FutureSlot(slot))
            } else {
                Err(ApiError::SlotMissed(slot))
            }
        }
    }
}

/// Compute the effective reward for the block at `slot`.
///
/// `max_concurrent_receipts` caps the receipt fan-out per request
/// (0 = unbounded, one in-flight fetch per transaction).
pub async fn block_reward(
    beacon: &dyn BeaconApi,
    execution: &dyn ExecutionApi,
    slot: u64,
    max_concurrent_receipts: usize,
) -> Result<RewardResult, ApiError> {
    let block = resolve_slot(beacon, slot).await?;
    let payload = &block.message.body.execution_payload;

    let number = payload.block_number().map_err(ApiError::upstream)?;
    let base_fee = payload.base_fee().map_err(ApiError::upstream)?;

    let execution_block = execution
        .block_by_number(number)
        .await
        .map_err(ApiError::upstream)?
        .ok_or_else(|| ApiError::upstream(anyhow!("execution block {number} not found")))?;

    debug!(
        "slot {slot}: execution block {number} with {} transactions",
        execution_block.transactions.len()
    );

    let mev_payout = mev_payout(payload)?;
    let total_fees = aggregate_fees(
        execution,
        &execution_block.transactions,
        max_concurrent_receipts,
    )
    .await?;

    classify(total_fees, base_fee, mev_payout)
}

/// Scan the payload's raw transactions for one whose recovered sender is
/// the block's fee recipient. A relay-built block pays the proposer with an
/// ordinary transfer from the builder, which is also the fee recipient.
///
/// The scan walks transactions in on-chain order and stops at the first
/// match, so ties resolve deterministically to the lowest index.
fn mev_payout(payload: &ExecutionPayload) -> Result<Option<u128>, ApiError> {
    for (index, raw) in payload.transactions.iter().enumerate() {
        let envelope = TxEnvelope::decode_2718_exact(raw)
            .map_err(|e| ApiError::upstream(anyhow!("transaction {index} is undecodable: {e}")))?;

        // Recovery picks the signature scheme from the envelope's own
        // chain id, so pre-EIP-155 and typed transactions both work.
        let sender = envelope.recover_signer().map_err(|e| {
            ApiError::upstream(anyhow!("sender recovery failed for transaction {index}: {e}"))
        })?;

        if sender == payload.fee_recipient {
            debug!("transaction {index} pays out from the fee recipient");
            let value = u128::try_from(envelope.value()).map_err(|_| {
                ApiError::computation(format!("payout of transaction {index} exceeds u128"))
            })?;
            return Ok(Some(value));
        }
    }
    Ok(None)
}

/// Sum `gasUsed * effectiveGasPrice` over every transaction, fetching one
/// receipt per transaction concurrently. Each fetch yields its fee and a
/// single reducer sums them, so no shared accumulator is needed; any
/// failure aborts the join and cancels the in-flight siblings, discarding
/// all partial work.
async fn aggregate_fees(
    execution: &dyn ExecutionApi,
    transactions: &[B256],
    max_concurrent: usize,
) -> Result<u128, ApiError> {
    let semaphore = (max_concurrent > 0).then(|| Arc::new(Semaphore::new(max_concurrent)));

    let fetches = transactions.iter().map(|hash| {
        let semaphore = semaphore.clone();
        let hash = *hash;
        async move {
            let _permit = match &semaphore {
                Some(s) => Some(s.acquire().await.map_err(ApiError::upstream)?),
                None => None,
            };
            let receipt = execution
                .transaction_receipt(hash)
                .await
                .map_err(ApiError::upstream)?;
            receipt
                .fee_wei()
                .ok_or_else(|| ApiError::computation(format!("fee of transaction {hash} overflows")))
        }
    });

    let fees = try_join_all(fetches).await?;

    let mut total: u128 = 0;
    for fee in fees {
        total = total
            .checked_add(fee)
            .ok_or_else(|| ApiError::computation("total transaction fees overflow"))?;
    }
    Ok(total)
}

/// Combine the aggregated fees, the payload base fee, and the MEV signal
/// into the final reward. All arithmetic stays in wei; Gwei conversion
/// belongs to the presentation layer.
pub fn classify(
    total_fees: u128,
    base_fee: u128,
    mev_payout: Option<u128>,
) -> Result<RewardResult, ApiError> {
    match mev_payout {
        Some(value) => Ok(RewardResult {
            reward_wei: value,
            origin: BlockOrigin::MevRelay,
        }),
        None => {
            // A vanilla block whose fees do not cover its own base fee
            // means the upstream data is inconsistent.
            let reward = total_fees.checked_sub(base_fee).ok_or_else(|| {
                ApiError::computation(format!(
                    "transaction fees {total_fees} below base fee {base_fee}"
                ))
            })?;
            Ok(RewardResult {
                reward_wei: reward,
                origin: BlockOrigin::Internal,
            })
        }
    }
}
