mod client;
pub mod types;

pub use client::ExecutionClient;

use anyhow::Result;
use async_trait::async_trait;
use alloy_primitives::B256;
use types::{ExecutionBlock, TransactionReceipt};

/// Capability interface over the execution-layer JSON-RPC endpoint.
#[async_trait]
pub trait ExecutionApi: Send + Sync {
    /// `None` when the execution layer does not know the block.
    async fn block_by_number(&self, number: u64) -> Result<Option<ExecutionBlock>>;

    /// A missing receipt for a transaction taken from a canonical block is
    /// an upstream inconsistency, so this surfaces it as an error.
    async fn transaction_receipt(&self, hash: B256) -> Result<TransactionReceipt>;
}
