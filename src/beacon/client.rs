use super::types::*;
use super::{BeaconApi, StateId};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Client for the beacon-chain REST API.
#[derive(Clone)]
pub struct BeaconClient {
    client: Client,
    base_url: String,
}

impl BeaconClient {
    /// Create a new client with a custom per-request timeout in milliseconds.
    pub fn with_timeout(base_url: &str, timeout_ms: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// GET a REST path and decode the JSON body. Returns `None` on 404 so
    /// callers can tell "absent" apart from "broken".
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("failed to fetch {path}"))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            bail!("beacon API returned {} for {path}", response.status());
        }

        let body = response
            .json()
            .await
            .with_context(|| format!("failed to decode response for {path}"))?;
        Ok(Some(body))
    }
}

#[async_trait]
impl BeaconApi for BeaconClient {
    async fn block_by_slot(&self, slot: u64) -> Result<Option<SignedBeaconBlock>> {
        let response: Option<BlockResponse> =
            self.get_json(&format!("eth/v2/beacon/blocks/{slot}")).await?;
        Ok(response.map(|r| r.data))
    }

    async fn head_slot(&self) -> Result<u64> {
        let response: Option<HeaderResponse> =
            self.get_json("eth/v1/beacon/headers/head").await?;
        response
            .context("beacon API has no head header")?
            .slot()
    }

    async fn sync_committee(&self, state: StateId) -> Result<Option<Vec<String>>> {
        let response: Option<SyncCommitteeResponse> = self
            .get_json(&format!("eth/v1/beacon/states/{state}/sync_committees"))
            .await?;
        Ok(response.map(|r| r.data.validators))
    }

    async fn validator_pubkey(&self, state: StateId, index: &str) -> Result<String> {
        let response: Option<ValidatorResponse> = self
            .get_json(&format!("eth/v1/beacon/states/{state}/validators/{index}"))
            .await?;
        Ok(response
            .with_context(|| format!("validator {index} not found at state {state}"))?
            .data
            .validator
            .pubkey)
    }
}
