use crate::beacon::BeaconApi;
use crate::duties;
use crate::error::ApiError;
use crate::execution::ExecutionApi;
use crate::rewards;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Shared per-process state handed to every request handler. The data
/// sources sit behind their capability traits so tests can swap in fakes.
#[derive(Clone)]
pub struct AppState {
    pub beacon: Arc<dyn BeaconApi>,
    pub execution: Arc<dyn ExecutionApi>,
    /// Delay between successive validator lookup dispatches.
    pub lookup_stagger: Duration,
    /// Cap on concurrent receipt fetches per request (0 = unbounded).
    pub max_concurrent_receipts: usize,
}

#[derive(Debug, Serialize)]
pub struct BlockRewardResponse {
    /// Reward in Gwei.
    pub reward: f64,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SyncDutiesResponse {
    pub sync_committee: Vec<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/blockreward/{slot}", get(block_reward_handler))
        .route("/syncduties/{slot}", get(sync_duties_handler))
        .with_state(state)
}

/// Bind and serve the API until the process is terminated.
pub async fn serve(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn block_reward_handler(
    State(state): State<AppState>,
    Path(slot): Path<u64>,
) -> Result<Json<BlockRewardResponse>, ApiError> {
    let result = rewards::block_reward(
        &*state.beacon,
        &*state.execution,
        slot,
        state.max_concurrent_receipts,
    )
    .await?;

    Ok(Json(BlockRewardResponse {
        // Gwei conversion happens only here, at the presentation boundary
        reward: result.reward_wei as f64 / 1e9,
        status: result.origin.as_str(),
    }))
}

async fn sync_duties_handler(
    State(state): State<AppState>,
    Path(slot): Path<u64>,
) -> Result<Json<SyncDutiesResponse>, ApiError> {
    let sync_committee =
        duties::sync_duties(Arc::clone(&state.beacon), slot, state.lookup_stagger).await?;
    Ok(Json(SyncDutiesResponse { sync_committee }))
}
