//! End-to-end edition lifecycle over the wire: submit an achievement,
//! review it, and observe the finalized block and the author's reward.

use crate::harness::{now_ms, sleep_until_ms, spawn_node, TestClient};
use mc_01_commitments::merkle_root;
use mc_02_state_trie::verify_account_proof;
use node_runtime::adapters::LoopbackHub;
use node_runtime::config::NodeConfig;
use shared_types::protocol::AccountRequest;
use shared_types::{WireMessage, GENESIS_HEIGHT};
use std::time::Duration;
use uuid::Uuid;

#[tokio::test(flavor = "multi_thread")]
async fn test_edition_lifecycle_rewards_reviewed_achievement() {
    let hub = LoopbackHub::new();
    let mut config = NodeConfig::for_testing();
    config.room = "lifecycle".to_string();
    config.params.genesis_ms = now_ms() + 300;
    let genesis = config.params.genesis_ms;

    let node = spawn_node(config.clone(), &hub).await;

    let author = TestClient::join(&hub, &config.room, &config.params.chain_id);
    let mut reviewer = TestClient::join(&hub, &config.room, &config.params.chain_id);

    // Submission phase of edition 0 (window [0, 400) ms).
    sleep_until_ms(genesis + 50).await;
    let achievement = author.achievement(0, "ran a marathon");
    author
        .broadcast(WireMessage::NewAchievement(achievement.clone()))
        .await;

    // Review phase (window [400, 700) ms).
    sleep_until_ms(genesis + 450).await;
    let review = reviewer.review(&achievement, 4);
    reviewer.broadcast(WireMessage::NewReview(review)).await;

    // The finalized block is announced as NEW_BLOCK gossip.
    let block = reviewer
        .wait_for(Duration::from_secs(3), |message| match message {
            WireMessage::NewBlock(block) => Some(block.clone()),
            _ => None,
        })
        .await
        .expect("no NEW_BLOCK observed");

    assert_eq!(block.header.height, GENESIS_HEIGHT + 1);
    assert_eq!(block.achievements.len(), 1);
    assert_eq!(block.achievements[0].signature, achievement.signature);
    assert_eq!(
        block.header.achievements_root,
        merkle_root(&[achievement.signature])
    );

    // Fetch the author's account with its trie proof over the wire.
    let request_id = Uuid::new_v4();
    reviewer
        .send_to(
            node.address,
            WireMessage::AccountRequest(AccountRequest {
                request_id,
                address: author.identity.address,
            }),
        )
        .await;

    let response = reviewer
        .wait_for(Duration::from_secs(2), |message| match message {
            WireMessage::AccountResponse(response) if response.request_id == request_id => {
                Some(response.clone())
            }
            _ => None,
        })
        .await
        .expect("no account response");

    let account = response.account.expect("author account exists");
    assert_eq!(account.balance, config.params.achievement_reward);
    assert_eq!(account.accepted_achievement_count, 1);
    assert_eq!(response.height, block.header.height);
    assert!(verify_account_proof(
        &account,
        &response.proof,
        &block.header.accounts_root
    ));

    let _ = node.shutdown.send(true);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unreviewed_achievement_earns_nothing() {
    let hub = LoopbackHub::new();
    let mut config = NodeConfig::for_testing();
    config.room = "lifecycle-unreviewed".to_string();
    config.params.genesis_ms = now_ms() + 300;
    let genesis = config.params.genesis_ms;

    let node = spawn_node(config.clone(), &hub).await;
    let mut author = TestClient::join(&hub, &config.room, &config.params.chain_id);

    sleep_until_ms(genesis + 50).await;
    let achievement = author.achievement(0, "unwitnessed feat");
    author
        .broadcast(WireMessage::NewAchievement(achievement.clone()))
        .await;

    // No review arrives; the edition's block must not carry it.
    let block = author
        .wait_for(Duration::from_secs(3), |message| match message {
            WireMessage::NewBlock(block) => Some(block.clone()),
            _ => None,
        })
        .await
        .expect("no NEW_BLOCK observed");

    assert!(block.achievements.is_empty());
    assert!(block.reviews.is_empty());

    let _ = node.shutdown.send(true);
}
