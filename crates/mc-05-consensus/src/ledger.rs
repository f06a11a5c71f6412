//! # Account-State Application
//!
//! The account effects of finalizing a block, applied to the sparse
//! address trie. Used twice: on a scratch copy during candidate assembly
//! (to compute `accounts_root`) and on the authoritative trie at
//! finalization. Both paths must be bit-identical, so everything lives in
//! this one function.

use mc_02_state_trie::SparseAddressTrie;
use shared_types::{Account, Address, Block, ChainParams};

/// Apply a block's account effects in canonical order.
///
/// 1. Transactions: debit sender (saturating at zero), credit recipient,
///    bump sender nonce
/// 2. Achievements: credit the author the achievement reward, bump the
///    author's accepted count
/// 3. Reviews: credit the reviewer the review reward, bump the reviewer's
///    included count
///
/// Accounts are created lazily on first touch and never deleted.
pub fn apply_block(trie: &mut SparseAddressTrie, block: &Block, params: &ChainParams) {
    for tx in &block.transactions {
        update_account(trie, tx.sender_address, |account| {
            account.balance = account.balance.saturating_sub(tx.amount);
            account.nonce += 1;
        });
        update_account(trie, tx.recipient_address, |account| {
            account.balance = account.balance.saturating_add(tx.amount);
        });
    }

    for achievement in &block.achievements {
        update_account(trie, achievement.author_address, |account| {
            account.balance = account.balance.saturating_add(params.achievement_reward);
            account.accepted_achievement_count += 1;
        });
    }

    for review in &block.reviews {
        update_account(trie, review.reviewer_address, |account| {
            account.balance = account.balance.saturating_add(params.review_reward);
            account.included_review_count += 1;
        });
    }
}

fn update_account(
    trie: &mut SparseAddressTrie,
    address: Address,
    mutate: impl FnOnce(&mut Account),
) {
    let mut account = trie
        .account(&address)
        .cloned()
        .unwrap_or_else(|| Account::new(address));
    mutate(&mut account);
    trie.insert(account);
}
