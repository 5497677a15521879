mod client;
pub mod types;

pub use client::BeaconClient;

use anyhow::Result;
use async_trait::async_trait;
use std::fmt;
use types::SignedBeaconBlock;

/// State identifier for beacon state queries: either the chain head or a
/// historical slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateId {
    Head,
    Slot(u64),
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateId::Head => write!(f, "head"),
            StateId::Slot(slot) => write!(f, "{slot}"),
        }
    }
}

/// Capability interface over the consensus-layer REST API.
///
/// `block_by_slot` and `sync_committee` return `None` when the upstream
/// reports the slot/state as unknown; distinguishing "future" from "missed"
/// is the caller's job (it needs the head slot for that).
#[async_trait]
pub trait BeaconApi: Send + Sync {
    async fn block_by_slot(&self, slot: u64) -> Result<Option<SignedBeaconBlock>>;

    async fn head_slot(&self) -> Result<u64>;

    async fn sync_committee(&self, state: StateId) -> Result<Option<Vec<String>>>;

    async fn validator_pubkey(&self, state: StateId, index: &str) -> Result<String>;
}
