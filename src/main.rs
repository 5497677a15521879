mod beacon;
mod duties;
mod error;
mod execution;
mod rewards;
mod server;

use anyhow::{Context, Result};
use beacon::BeaconClient;
use clap::Parser;
use execution::ExecutionClient;
use server::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Beacon Slot API - block rewards and sync-committee duties per slot
#[derive(Parser, Debug)]
#[command(name = "beacon-slot-api")]
#[command(about = "HTTP API answering block reward and sync duty questions about beacon-chain slots")]
struct Args {
    /// Execution-layer JSON-RPC endpoint URL
    #[arg(long, env = "EXECUTION_RPC_ENDPOINT")]
    execution_endpoint: String,

    /// Beacon-chain REST API base URL
    #[arg(long, env = "BEACON_API_ENDPOINT")]
    beacon_endpoint: String,

    /// Address to serve the API on
    #[arg(short, long, default_value = "0.0.0.0:8080")]
    listen_addr: SocketAddr,

    /// Delay in milliseconds between successive validator lookup dispatches
    #[arg(long, default_value_t = 10)]
    lookup_stagger_ms: u64,

    /// Maximum concurrent receipt fetches per request (0 = unbounded)
    #[arg(long, default_value_t = 64)]
    max_concurrent_receipts: usize,

    /// Timeout in milliseconds for each upstream call
    #[arg(long, default_value_t = 30_000)]
    upstream_timeout_ms: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting Beacon Slot API");
    info!("Execution endpoint: {}", args.execution_endpoint);
    info!("Beacon endpoint: {}", args.beacon_endpoint);

    let execution =
        ExecutionClient::with_timeout(&args.execution_endpoint, args.upstream_timeout_ms);
    let beacon = BeaconClient::with_timeout(&args.beacon_endpoint, args.upstream_timeout_ms);

    // The service is useless without the execution client, so a failed
    // probe at startup is fatal.
    let chain_id = execution
        .chain_id()
        .await
        .context("failed to connect to execution client")?;
    info!("Connected to execution client (chain id {chain_id})");

    let state = AppState {
        beacon: Arc::new(beacon),
        execution: Arc::new(execution),
        lookup_stagger: Duration::from_millis(args.lookup_stagger_ms),
        max_concurrent_receipts: args.max_concurrent_receipts,
    };

    server::serve(args.listen_addr, state).await
}
