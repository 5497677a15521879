use super::types::{ExecutionBlock, TransactionReceipt};
use super::ExecutionApi;
use anyhow::{Context, Result};
use async_trait::async_trait;
use alloy_primitives::{B256, U64};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

static REQUEST_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Serialize)]
struct JsonRpcRequest<P: Serialize> {
    jsonrpc: &'static str,
    id: u64,
    method: String,
    params: P,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    #[allow(dead_code)]
    jsonrpc: String,
    #[allow(dead_code)]
    id: u64,
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// JSON-RPC client for the execution-layer endpoint.
#[derive(Clone)]
pub struct ExecutionClient {
    client: Client,
    endpoint: String,
}

impl ExecutionClient {
    /// Create a new client with a custom per-request timeout in milliseconds.
    pub fn with_timeout(endpoint: &str, timeout_ms: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            endpoint: endpoint.to_string(),
        }
    }

    /// Issue one JSON-RPC call; a `null` result comes back as `None`.
    async fn call_opt<P, R>(&self, method: &str, params: P) -> Result<Option<R>>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: REQUEST_ID.fetch_add(1, Ordering::SeqCst),
            method: method.to_string(),
            params,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("failed to send {method} request"))?;

        let rpc_response: JsonRpcResponse<R> = response
            .json()
            .await
            .with_context(|| format!("failed to parse {method} response"))?;

        if let Some(error) = rpc_response.error {
            anyhow::bail!("RPC error {}: {}", error.code, error.message);
        }

        Ok(rpc_response.result)
    }

    async fn call<P, R>(&self, method: &str, params: P) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        self.call_opt(method, params)
            .await?
            .with_context(|| format!("{method} response missing result"))
    }

    /// Connectivity probe; also tells us which chain we are talking to.
    pub async fn chain_id(&self) -> Result<u64> {
        let id: U64 = self.call("eth_chainId", Vec::<()>::new()).await?;
        Ok(id.to::<u64>())
    }
}

#[async_trait]
impl ExecutionApi for ExecutionClient {
    async fn block_by_number(&self, number: u64) -> Result<Option<ExecutionBlock>> {
        self.call_opt("eth_getBlockByNumber", (format!("{number:#x}"), false))
            .await
    }

    async fn transaction_receipt(&self, hash: B256) -> Result<TransactionReceipt> {
        self.call_opt("eth_getTransactionReceipt", (hash,))
            .await?
            .with_context(|| format!("no receipt for transaction {hash}"))
    }
}
