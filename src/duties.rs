use crate::beacon::{BeaconApi, StateId};
use crate::error::ApiError;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Resolve the sync-committee duty pubkeys for `slot`.
///
/// The head slot is fetched once and drives two decisions: disambiguating
/// an absent committee state (future vs missed) and selecting the state the
/// per-validator lookups query (`head` for in-flight slots, the historical
/// slot otherwise). The mode is decided here, never per index.
pub async fn sync_duties(
    beacon: Arc<dyn BeaconApi>,
    slot: u64,
    stagger: Duration,
) -> Result<Vec<String>, ApiError> {
    let head = beacon.head_slot().await.map_err(ApiError::upstream)?;

    let committee = match beacon
        .sync_committee(StateId::Slot(slot))
        .await
        .map_err(ApiError::upstream)?
    {
        Some(indices) => indices,
        None if slot > head => return Err(ApiError::FutureSlot(slot)),
        None => return Err(ApiError::SlotMissed(slot)),
    };

    let state = if slot > head {
        StateId::Head
    } else {
        StateId::Slot(slot)
    };
    debug!(
        "slot {slot}: resolving {} committee members at state {state}",
        committee.len()
    );

    resolve_pubkeys(beacon, committee, state, stagger).await
}

/// Concurrently resolve each validator index to its public key.
///
/// One task per index, dispatched with a small stagger to avoid hammering
/// the upstream API. Every task is awaited before the result is produced
/// (counting join); completion order is arbitrary, so callers must treat
/// the output as a set. Any lookup failure fails the whole request — a
/// silently shrunken set would be indistinguishable from a smaller
/// committee.
pub async fn resolve_pubkeys(
    beacon: Arc<dyn BeaconApi>,
    indices: Vec<String>,
    state: StateId,
    stagger: Duration,
) -> Result<Vec<String>, ApiError> {
    let total = indices.len();
    let mut lookups = JoinSet::new();

    for index in indices {
        if !stagger.is_zero() {
            tokio::time::sleep(stagger).await;
        }
        let beacon = Arc::clone(&beacon);
        lookups.spawn(async move { beacon.validator_pubkey(state, &index).await });
    }

    let mut pubkeys = Vec::with_capacity(total);
    let mut failed = 0usize;
    while let Some(joined) = lookups.join_next().await {
        match joined {
            Ok(Ok(pubkey)) => pubkeys.push(pubkey),
            Ok(Err(e)) => {
                warn!("validator lookup failed: {e:#}");
                failed += 1;
            }
            Err(e) => {
                warn!("validator lookup task panicked: {e}");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(ApiError::Resolution { failed, total });
    }
    Ok(pubkeys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beacon::types::SignedBeaconBlock;
    use anyhow::{bail, Result};
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    struct FakeBeacon {
        head: u64,
        committees: HashMap<u64, Vec<String>>,
        pubkeys: HashMap<String, String>,
        failing: HashSet<String>,
        queried_states: Mutex<Vec<StateId>>,
    }

    impl FakeBeacon {
        fn new(head: u64) -> Self {
            Self {
                head,
                committees: HashMap::new(),
                pubkeys: HashMap::new(),
                failing: HashSet::new(),
                queried_states: Mutex::new(Vec::new()),
            }
        }

        fn with_committee(mut self, slot: u64, indices: &[&str]) -> Self {
            self.committees
                .insert(slot, indices.iter().map(|s| s.to_string()).collect());
            self
        }

        fn with_pubkey(mut self, index: &str, pubkey: &str) -> Self {
            self.pubkeys.insert(index.to_string(), pubkey.to_string());
            self
        }
    }

    #[async_trait]
    impl BeaconApi for FakeBeacon {
        async fn block_by_slot(&self, _slot: u64) -> Result<Option<SignedBeaconBlock>> {
            bail!("not used in duty tests")
        }

        async fn head_slot(&self) -> Result<u64> {
            Ok(self.head)
        }

        async fn sync_committee(&self, state: StateId) -> Result<Option<Vec<String>>> {
            match state {
                StateId::Slot(slot) => Ok(self.committees.get(&slot).cloned()),
                StateId::Head => Ok(self.committees.get(&self.head).cloned()),
            }
        }

        async fn validator_pubkey(&self, state: StateId, index: &str) -> Result<String> {
            self.queried_states.lock().unwrap().push(state);
            if self.failing.contains(index) {
                bail!("lookup failed for validator {index}");
            }
            self.pubkeys
                .get(index)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("unknown validator {index}"))
        }
    }

    #[tokio::test]
    async fn test_resolves_all_pubkeys_as_a_set() {
        let beacon = Arc::new(
            FakeBeacon::new(100)
                .with_committee(50, &["12", "45", "78"])
                .with_pubkey("12", "0xaa")
                .with_pubkey("45", "0xbb")
                .with_pubkey("78", "0xcc"),
        );

        let mut pubkeys = sync_duties(beacon, 50, Duration::ZERO).await.unwrap();
        pubkeys.sort();
        assert_eq!(pubkeys, vec!["0xaa", "0xbb", "0xcc"]);
    }

    #[tokio::test]
    async fn test_historical_slot_queries_slot_state() {
        let beacon = Arc::new(
            FakeBeacon::new(100)
                .with_committee(50, &["12"])
                .with_pubkey("12", "0xaa"),
        );

        sync_duties(Arc::clone(&beacon) as Arc<dyn BeaconApi>, 50, Duration::ZERO)
            .await
            .unwrap();

        let states = beacon.queried_states.lock().unwrap();
        assert_eq!(states.as_slice(), &[StateId::Slot(50)]);
    }

    #[tokio::test]
    async fn test_future_slot_with_known_committee_queries_head() {
        // The committee for the upcoming period can be known ahead of the
        // slot itself; validator state must then come from head.
        let beacon = Arc::new(
            FakeBeacon::new(100)
                .with_committee(105, &["12"])
                .with_pubkey("12", "0xaa"),
        );

        sync_duties(Arc::clone(&beacon) as Arc<dyn BeaconApi>, 105, Duration::ZERO)
            .await
            .unwrap();

        let states = beacon.queried_states.lock().unwrap();
        assert_eq!(states.as_slice(), &[StateId::Head]);
    }

    #[tokio::test]
    async fn test_one_failed_lookup_fails_the_request() {
        let mut fake = FakeBeacon::new(100)
            .with_committee(50, &["12", "45", "78"])
            .with_pubkey("12", "0xaa")
            .with_pubkey("78", "0xcc");
        fake.failing.insert("45".to_string());
        let beacon = Arc::new(fake);

        let err = sync_duties(beacon, 50, Duration::ZERO).await.unwrap_err();
        assert!(matches!(err, ApiError::Resolution { failed: 1, total: 3 }));
    }

    #[tokio::test]
    async fn test_unknown_future_state_is_future_slot() {
        let beacon = Arc::new(FakeBeacon::new(100));
        let err = sync_duties(beacon, 105, Duration::ZERO).await.unwrap_err();
        assert!(matches!(err, ApiError::FutureSlot(105)));
    }

    #[tokio::test]
    async fn test_unknown_past_state_is_missed_slot() {
        let beacon = Arc::new(FakeBeacon::new(100));
        let err = sync_duties(beacon, 50, Duration::ZERO).await.unwrap_err();
        assert!(matches!(err, ApiError::SlotMissed(50)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stagger_delays_dispatches() {
        let beacon = Arc::new(
            FakeBeacon::new(100)
                .with_committee(50, &["12", "45"])
                .with_pubkey("12", "0xaa")
                .with_pubkey("45", "0xbb"),
        );

        let start = tokio::time::Instant::now();
        sync_duties(beacon, 50, Duration::from_millis(10))
            .await
            .unwrap();
        // Two dispatches, each preceded by the stagger interval
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
