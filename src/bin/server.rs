//! Certificate hash batching server.
//!
//! Reads configuration from flags, the environment and an optional `.env`
//! file, connects to the RootSeal contract, and serves the batching API until
//! Ctrl+C.
//!
//! Run with:
//!   CONTRACT_ADDRESS=0x... cargo run --bin server

use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use root_seal::adapters::ethereum::EthereumRootRegistry;
use root_seal::batcher::CertificateBatcher;
use root_seal::config::ServiceConfig;
use root_seal::server;

#[tokio::main]
async fn main() {
    // A missing .env is fine; values may come from flags or the real environment.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ServiceConfig::parse();

    // ── Validate config ───────────────────────────────────────────────────────
    let contract = config.validate().unwrap_or_else(|e| {
        error!("cannot load config: {e}");
        std::process::exit(1);
    });
    info!(artifact = %config.contract_artifact.display(), "contract ABI loaded");

    // ── Chain adapter ─────────────────────────────────────────────────────────
    let registry = match config.private_key.as_deref() {
        Some(key) => EthereumRootRegistry::with_private_key(&config.rpc_url, key, contract),
        None => EthereumRootRegistry::with_node_account(&config.rpc_url, contract).await,
    }
    .unwrap_or_else(|e| {
        error!(rpc_url = %config.rpc_url, "cannot create RPC adapter: {e}");
        std::process::exit(1);
    })
    .with_confirmations(config.confirmations)
    .with_receipt_timeout(config.receipt_timeout());
    info!(contract = %registry.contract(), rpc_url = %config.rpc_url, "connected to RootSeal contract");

    // ── HTTP server ───────────────────────────────────────────────────────────
    let batcher = Arc::new(CertificateBatcher::new(registry));
    let (handle, bound_addr) = server::start_server(batcher, config.listen_addr())
        .await
        .unwrap_or_else(|e| {
            error!("cannot start server: {e}");
            std::process::exit(1);
        });
    info!(%bound_addr, "HTTP server listening");

    tokio::signal::ctrl_c().await.ok();
    info!("shutting down");
    handle.shutdown();
}
