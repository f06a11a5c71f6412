//! # Per-Edition Pending Pools
//!
//! The engine's in-memory pending sets, keyed by entity signature so a
//! re-gossiped entity lands exactly once. Phase transitions clear the
//! achievement pool (Submission start), the review pool (Review start),
//! and everything (Announcement finalization).

use shared_types::{Achievement, Review, Signature, Transaction};
use std::collections::HashMap;

/// Pending transactions, achievements, and reviews for the current edition.
#[derive(Debug, Default)]
pub struct EditionPools {
    transactions: HashMap<Signature, Transaction>,
    achievements: HashMap<Signature, Achievement>,
    reviews: HashMap<Signature, Review>,
}

impl EditionPools {
    /// Empty pools.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pending transaction. Returns false on duplicate.
    pub fn add_transaction(&mut self, tx: Transaction) -> bool {
        self.transactions.insert(tx.signature, tx).is_none()
    }

    /// Add a pending achievement. Returns false on duplicate.
    pub fn add_achievement(&mut self, achievement: Achievement) -> bool {
        self.achievements
            .insert(achievement.signature, achievement)
            .is_none()
    }

    /// Add a pending review. Returns false on duplicate.
    ///
    /// A reviewer's re-submission has a fresh signature, so both versions
    /// pool; the acceptance rule later keeps only the latest per reviewer.
    pub fn add_review(&mut self, review: Review) -> bool {
        self.reviews.insert(review.signature, review).is_none()
    }

    /// Pending transactions (unordered).
    pub fn transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.values()
    }

    /// Pending achievements (unordered).
    pub fn achievements(&self) -> impl Iterator<Item = &Achievement> {
        self.achievements.values()
    }

    /// Pending reviews (unordered).
    pub fn reviews(&self) -> Vec<Review> {
        self.reviews.values().cloned().collect()
    }

    /// Counts as (transactions, achievements, reviews).
    pub fn counts(&self) -> (usize, usize, usize) {
        (
            self.transactions.len(),
            self.achievements.len(),
            self.reviews.len(),
        )
    }

    /// Clear the pending achievement set (Submission start).
    pub fn clear_achievements(&mut self) {
        self.achievements.clear();
    }

    /// Clear the pending review set (Review start).
    pub fn clear_reviews(&mut self) {
        self.reviews.clear();
    }

    /// Clear every pool (edition end, regardless of outcome).
    pub fn clear_all(&mut self) {
        self.transactions.clear();
        self.achievements.clear();
        self.reviews.clear();
    }
}
