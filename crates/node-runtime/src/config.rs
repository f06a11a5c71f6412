//! # Node Configuration
//!
//! Local, per-node settings. Network-wide consensus parameters live in
//! [`shared_types::ChainParams`]; everything here may differ between
//! nodes without breaking phase agreement.

use shared_types::{ChainParams, NodeRole};
use tracing::warn;

/// Per-node runtime configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// The role this node plays.
    pub role: NodeRole,
    /// Display name embedded in the identity.
    pub display_name: String,
    /// Seed material for the signing key (hex). Random when absent.
    pub seed_hex: Option<String>,
    /// The relay room this chain's traffic is scoped to.
    pub room: String,
    /// Network-wide chain parameters.
    pub params: ChainParams,
    /// Phase-check tick, milliseconds (sub-second).
    pub tick_ms: u64,
    /// Chain-head broadcast period, milliseconds.
    pub head_broadcast_ms: u64,
    /// Candidate re-broadcast period during Consensus, milliseconds.
    pub candidate_rebroadcast_ms: u64,
    /// Dedup-cache / pending-request sweep period, milliseconds.
    pub sweep_interval_ms: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            role: NodeRole::Full,
            display_name: "merit-node".to_string(),
            seed_hex: None,
            room: "merit-main".to_string(),
            params: ChainParams::default(),
            tick_ms: 250,
            head_broadcast_ms: 10_000,
            candidate_rebroadcast_ms: 2_000,
            sweep_interval_ms: 10_000,
        }
    }
}

impl NodeConfig {
    /// Configuration for tests: millisecond phases, fast periodic tasks.
    pub fn for_testing() -> Self {
        Self {
            role: NodeRole::Full,
            display_name: "test-node".to_string(),
            seed_hex: None,
            room: "merit-test".to_string(),
            params: ChainParams::for_testing(),
            tick_ms: 10,
            head_broadcast_ms: 200,
            candidate_rebroadcast_ms: 50,
            sweep_interval_ms: 500,
        }
    }
}

/// Load configuration from the environment (`MERIT_*` variables),
/// falling back to defaults.
pub fn load_config() -> NodeConfig {
    let mut config = NodeConfig::default();

    if let Ok(role) = std::env::var("MERIT_ROLE") {
        match role.as_str() {
            "full" => config.role = NodeRole::Full,
            "light" => config.role = NodeRole::Light,
            other => warn!("MERIT_ROLE must be 'full' or 'light', got '{other}'"),
        }
    }
    if let Ok(name) = std::env::var("MERIT_NAME") {
        config.display_name = name;
    }
    if let Ok(seed) = std::env::var("MERIT_SEED") {
        if hex::decode(&seed).is_ok() {
            config.seed_hex = Some(seed);
        } else {
            warn!("MERIT_SEED must be hex-encoded; generating a random key");
        }
    }
    if let Ok(room) = std::env::var("MERIT_ROOM") {
        config.room = room;
    }
    if let Ok(genesis) = std::env::var("MERIT_GENESIS_MS") {
        if let Ok(ms) = genesis.parse() {
            config.params.genesis_ms = ms;
        }
    }

    config
}
