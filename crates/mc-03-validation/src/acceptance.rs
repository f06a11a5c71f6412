//! # Review Acceptance Rule
//!
//! Decides which achievements may enter a block:
//!
//! 1. Group reviews by the achievement they reference
//! 2. Per achievement, keep only the most recent review per distinct
//!    reviewer address (a later timestamp supersedes; an equal timestamp
//!    from the same reviewer also supersedes, so re-submissions win)
//! 3. Require at least `min_reviewers` surviving reviews
//! 4. Accept iff the median `overall` score meets `accept_threshold`
//!
//! The median is the element at index `n / 2` of the ascending-sorted
//! score list.

use shared_types::{Address, Review, Signature};
use std::collections::{HashMap, HashSet};

/// Reduce an achievement's reviews to the latest per distinct reviewer.
fn latest_per_reviewer<'a>(reviews: &[&'a Review]) -> HashMap<Address, &'a Review> {
    let mut latest: HashMap<Address, &Review> = HashMap::new();
    for review in reviews {
        latest
            .entry(review.reviewer_address)
            .and_modify(|current| {
                if review.timestamp_ms >= current.timestamp_ms {
                    *current = review;
                }
            })
            .or_insert(review);
    }
    latest
}

/// The median `overall` score of the surviving reviews.
///
/// Returns `None` for an empty slice.
pub fn median_overall(reviews: &[&Review]) -> Option<u8> {
    if reviews.is_empty() {
        return None;
    }
    let mut overalls: Vec<u8> = reviews.iter().map(|r| r.scores.overall).collect();
    overalls.sort_unstable();
    Some(overalls[overalls.len() / 2])
}

/// Whether one achievement's review set passes the acceptance rule.
///
/// An achievement with no reviews at all never passes, regardless of
/// `min_reviewers`.
pub fn achievement_accepted(reviews: &[&Review], min_reviewers: usize, accept_threshold: u8) -> bool {
    let latest = latest_per_reviewer(reviews);
    if latest.is_empty() || latest.len() < min_reviewers {
        return false;
    }

    let surviving: Vec<&Review> = latest.into_values().collect();
    match median_overall(&surviving) {
        Some(median) => median >= accept_threshold,
        None => false,
    }
}

/// The set of achievement signatures accepted by a review list.
pub fn accepted_achievement_signatures(
    reviews: &[Review],
    min_reviewers: usize,
    accept_threshold: u8,
) -> HashSet<Signature> {
    let mut by_achievement: HashMap<Signature, Vec<&Review>> = HashMap::new();
    for review in reviews {
        by_achievement
            .entry(review.achievement_signature)
            .or_default()
            .push(review);
    }

    by_achievement
        .into_iter()
        .filter(|(_, group)| achievement_accepted(group, min_reviewers, accept_threshold))
        .map(|(signature, _)| signature)
        .collect()
}
