//! Short-lived in-memory response cache.
//!
//! Maps a request fingerprint to the untyped JSON payload the upstream
//! returned. Entries expire lazily: a lookup that finds a stale entry removes
//! it and reports a miss. There is no background sweeper and no capacity
//! bound, so the map only shrinks when stale keys are asked for again.
//!
//! Reads share the lock; writes and stale-entry removal take it exclusively.
//! The lock is never held across an `.await`.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;

/// Freshness window for cached upstream responses.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug)]
struct CacheEntry {
    payload: Value,
    inserted_at: Instant,
}

/// Concurrency-safe TTL cache of upstream payloads.
///
/// # Examples
///
/// ```
/// use reelgate::cache::Cache;
/// use serde_json::json;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let cache = Cache::default();
/// cache.set("/genre/movie/list?language=en-US", json!({ "genres": [] }));
/// assert_eq!(
///     cache.get("/genre/movie/list?language=en-US"),
///     Some(json!({ "genres": [] }))
/// );
/// # }
/// ```
#[derive(Debug)]
pub struct Cache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl Default for Cache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl Cache {
    /// Empty cache whose entries stay fresh for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Returns a copy of the payload under `key` if it is younger than the TTL.
    ///
    /// A stale entry is removed as a side effect.
    pub fn get(&self, key: &str) -> Option<Value> {
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            match entries.get(key) {
                None => return None,
                Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                    return Some(entry.payload.clone());
                }
                Some(_) => {}
            }
        }

        // Re-check under the write lock: a fresh `set` may have landed in between.
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries
            .get(key)
            .is_some_and(|entry| entry.inserted_at.elapsed() >= self.ttl)
        {
            entries.remove(key);
            tracing::debug!(key, "evicted stale cache entry");
        }
        None
    }

    /// Stores `payload` under `key`, replacing any previous entry and restarting its clock.
    pub fn set(&self, key: impl Into<String>, payload: Value) {
        let entry = CacheEntry {
            payload,
            inserted_at: Instant::now(),
        };
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), entry);
    }

    /// Drops the entry under `key`, fresh or not. Returns whether one existed.
    pub fn remove(&self, key: &str) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
            .is_some()
    }

    /// Number of stored entries, stale ones included until they are looked up.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
