//! # Merit-Chain Node
//!
//! The main entry point. Wires a node from environment-driven
//! configuration with the in-memory store and loopback relay adapters;
//! deployments swap adapters behind the same ports.
//!
//! ## Startup Sequence
//!
//! 1. Initialize logging (env-filterable)
//! 2. Load configuration from `MERIT_*` environment variables
//! 3. Register with the relay under the derived identity
//! 4. Bootstrap the role state (genesis creation / chain replay)
//! 5. Spawn the phase ticker and periodic tasks, enter the event loop
//! 6. Ctrl+C flips the shutdown watch for a graceful stop

use anyhow::{Context, Result};
use node_runtime::adapters::{AutoReviewProducer, LoopbackHub, MemoryLedgerStore};
use node_runtime::config::load_config;
use node_runtime::identity::create_identity;
use node_runtime::runtime::NodeRuntime;
use rand::Rng;
use shared_types::ReviewScores;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(true)
        .init();

    let mut config = load_config();

    // Pin the seed so every identity derivation in this process agrees.
    if config.seed_hex.is_none() {
        let mut seed = [0u8; 32];
        rand::thread_rng().fill(&mut seed);
        config.seed_hex = Some(hex::encode(seed));
    }

    let (_keypair, identity) =
        create_identity(&config).context("failed to derive node identity")?;

    // A standalone process gets its own hub; multi-node deployments
    // replace this with a networked relay adapter.
    let hub = LoopbackHub::new();
    let (relay, inbox) = hub.register(identity, &config.room);
    let store = Arc::new(MemoryLedgerStore::new());

    let mut runtime = NodeRuntime::new(config, Arc::new(relay), store).await?;
    runtime.attach_inbound(inbox);

    // Demo review producer: scores every achievement 4/5 across the board.
    let producer = Arc::new(AutoReviewProducer::new(
        runtime.events_sender(),
        ReviewScores {
            overall: 4,
            originality: 4,
            creativity: 4,
            relevance: 4,
            presentation: 4,
        },
    ));
    runtime.set_review_producer(producer);

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
    });

    runtime.run(shutdown_rx).await
}
