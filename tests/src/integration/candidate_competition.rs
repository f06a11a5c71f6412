//! Candidate competition between two full nodes: the candidate with
//! more entries wins network-wide, whichever node assembled it.

use crate::harness::{now_ms, sleep_until_ms, spawn_node, TestClient};
use node_runtime::adapters::LoopbackHub;
use node_runtime::config::NodeConfig;
use shared_types::{WireMessage, GENESIS_HEIGHT};
use std::time::Duration;

#[tokio::test(flavor = "multi_thread")]
async fn test_biggest_candidate_wins_across_nodes() {
    let hub = LoopbackHub::new();
    let mut config = NodeConfig::for_testing();
    config.room = "competition".to_string();
    config.params.genesis_ms = now_ms() + 300;
    let genesis = config.params.genesis_ms;

    let node_a = spawn_node(config.clone(), &hub).await;
    let node_b = spawn_node(config.clone(), &hub).await;

    let mut client = TestClient::join(&hub, &config.room, &config.params.chain_id);

    // Two transactions delivered to node A only: its candidate carries
    // two entries, node B's carries none.
    sleep_until_ms(genesis + 100).await;
    client
        .send_to(
            node_a.address,
            WireMessage::NewTransaction(client.transaction([0x77; 20], 1)),
        )
        .await;
    client
        .send_to(
            node_a.address,
            WireMessage::NewTransaction(client.transaction([0x77; 20], 2)),
        )
        .await;

    // The winning block carries both transactions.
    let block = client
        .wait_for(Duration::from_secs(3), |message| match message {
            WireMessage::NewBlock(block) => Some(block.clone()),
            _ => None,
        })
        .await
        .expect("no NEW_BLOCK observed");
    assert_eq!(block.header.height, GENESIS_HEIGHT + 1);
    assert_eq!(block.transactions.len(), 2);

    // Both nodes converge on the same head, regardless of which one
    // assembled the winner.
    let mut head_a = node_a.head.clone();
    let mut head_b = node_b.head.clone();
    let converged = tokio::time::timeout(Duration::from_secs(3), async {
        let a = head_a
            .wait_for(|h| h.as_ref().is_some_and(|h| h.height >= GENESIS_HEIGHT + 1))
            .await
            .unwrap()
            .clone()
            .unwrap();
        let b = head_b
            .wait_for(|h| h.as_ref().is_some_and(|h| h.height >= GENESIS_HEIGHT + 1))
            .await
            .unwrap()
            .clone()
            .unwrap();
        (a, b)
    })
    .await
    .expect("nodes did not converge in time");

    assert_eq!(converged.0.hash, converged.1.hash);
    assert_eq!(converged.0.hash, block.header.hash);

    let _ = node_a.shutdown.send(true);
    let _ = node_b.shutdown.send(true);
}
