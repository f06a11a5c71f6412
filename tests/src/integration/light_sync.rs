//! A light node joining late catches up to the canonical chain through
//! the request/response protocol, without trusting any single message.

use crate::harness::{now_ms, sleep_until_ms, spawn_node};
use node_runtime::adapters::LoopbackHub;
use node_runtime::config::NodeConfig;
use shared_types::{NodeRole, GENESIS_HEIGHT};
use std::time::Duration;

#[tokio::test(flavor = "multi_thread")]
async fn test_light_node_catches_up_after_joining_late() {
    let hub = LoopbackHub::new();
    let mut config = NodeConfig::for_testing();
    config.room = "light-sync".to_string();
    config.params.genesis_ms = now_ms() + 300;
    let genesis = config.params.genesis_ms;

    let full = spawn_node(config.clone(), &hub).await;

    // Let the full node finalize the first edition (an empty block).
    sleep_until_ms(genesis + 1_050).await;

    // The light node joins afterwards and has to catch up.
    let mut light_config = config.clone();
    light_config.role = NodeRole::Light;
    light_config.display_name = "light-node".to_string();
    let light = spawn_node(light_config, &hub).await;

    // The full node keeps finalizing editions while the light node
    // syncs; wait until the two views coincide.
    let mut light_head = light.head.clone();
    let synced = tokio::time::timeout(Duration::from_secs(8), async {
        loop {
            light_head.changed().await.unwrap();
            let observed = light_head.borrow().clone();
            let canonical = full.head.borrow().clone();
            if let (Some(observed), Some(canonical)) = (observed, canonical) {
                if observed.height >= GENESIS_HEIGHT + 1
                    && observed.height == canonical.height
                    && observed.hash == canonical.hash
                {
                    return observed;
                }
            }
        }
    })
    .await
    .expect("light node never converged on the canonical head");

    assert!(synced.height >= GENESIS_HEIGHT + 1);

    let _ = full.shutdown.send(true);
    let _ = light.shutdown.send(true);
}
