//! # Bounded-Lifetime Dedup Cache
//!
//! Keys gossip by entity signature or block hash so re-broadcasts land
//! exactly once. Entries expire after a retention window; the periodic
//! sweep only ever removes entries, so it is safe to run alongside
//! message handling.

use shared_types::Hash;
use std::collections::HashMap;

/// Dedup cache keyed by 32-byte identity, with insert-time tracking.
#[derive(Debug, Default)]
pub struct SeenCache {
    entries: HashMap<Hash, u64>,
    retention_ms: u64,
}

impl SeenCache {
    /// Default retention: ten minutes.
    pub const DEFAULT_RETENTION_MS: u64 = 600_000;

    /// A cache with the default retention window.
    pub fn new() -> Self {
        Self::with_retention(Self::DEFAULT_RETENTION_MS)
    }

    /// A cache with a custom retention window.
    pub fn with_retention(retention_ms: u64) -> Self {
        Self {
            entries: HashMap::new(),
            retention_ms,
        }
    }

    /// Record a key. Returns false when the key was already present
    /// (the caller drops the duplicate).
    pub fn insert_if_new(&mut self, key: Hash, now_ms: u64) -> bool {
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, now_ms);
        true
    }

    /// Whether a key is currently cached.
    pub fn contains(&self, key: &Hash) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of cached keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Evict entries older than the retention window. Removal-only.
    pub fn sweep(&mut self, now_ms: u64) {
        let threshold = now_ms.saturating_sub(self.retention_ms);
        self.entries.retain(|_, &mut inserted| inserted > threshold);
    }
}
