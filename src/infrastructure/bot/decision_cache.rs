//! Decision cache
//!
//! Remembers provider decisions by state fingerprint so an identical
//! position does not pay for a second round trip. Expiry and size bounds are
//! left to moka; the cache only adds hit/miss accounting on top.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use moka::notification::RemovalCause;
use serde::Serialize;
use tracing::debug;

use super::strategies::Decision;

/// Hit/miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: u64,
}

/// TTL + capacity bounded map from state fingerprint to decision
///
/// Cheap to share: every method takes `&self`.
pub struct DecisionCache {
    entries: Cache<u64, Decision>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl DecisionCache {
    pub fn new(ttl: Duration, capacity: u64) -> Self {
        let entries = Cache::builder()
            .max_capacity(capacity.max(1))
            .time_to_live(ttl)
            .eviction_listener(|key: Arc<u64>, _decision: Decision, cause: RemovalCause| {
                debug!(key = *key, ?cause, "Cached decision evicted");
            })
            .build();
        Self {
            entries,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub async fn get(&self, key: u64) -> Option<Decision> {
        let found = self.entries.get(&key).await;
        let counter = if found.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    pub async fn insert(&self, key: u64, decision: Decision) {
        self.entries.insert(key, decision).await;
    }

    /// Forget one entry, e.g. after it failed re-validation
    pub async fn invalidate(&self, key: u64) -> bool {
        self.entries.remove(&key).await.is_some()
    }

    /// Counters plus the entry count after pending evictions have run
    pub async fn stats(&self) -> CacheStats {
        self.entries.run_pending_tasks().await;
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.entry_count(),
        }
    }
}
