//! Short-lived memoization with per-entry expiry.
//!
//! Every invalidation bumps a generation counter. A value computed before an
//! invalidation can be written with [`TtlCache::set_if_current`], which drops
//! it instead of resurrecting stale data.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

struct CacheState<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    generation: u64,
}

impl<K, V> CacheState<K, V> {
    fn sweep(&mut self, now: Instant) {
        self.entries.retain(|_, e| e.expires_at > now);
    }
}

/// A map whose entries disappear `ttl` after they were set.
pub struct TtlCache<K, V> {
    ttl: Duration,
    state: RwLock<CacheState<K, V>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            state: RwLock::new(CacheState {
                entries: HashMap::new(),
                generation: 0,
            }),
        }
    }

    /// The live value for `key`, if any. Expired entries are dropped lazily.
    pub async fn get(&self, key: &K) -> Option<V> {
        {
            let state = self.state.read().await;
            match state.entries.get(key) {
                Some(entry) if entry.expires_at > Instant::now() => {
                    return Some(entry.value.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }
        self.state.write().await.entries.remove(key);
        None
    }

    /// Invalidation counter; changes whenever entries are evicted.
    pub async fn generation(&self) -> u64 {
        self.state.read().await.generation
    }

    pub async fn set(&self, key: K, value: V) {
        let mut state = self.state.write().await;
        self.insert(&mut state, key, value);
    }

    /// Insert only if no invalidation happened since `generation` was read.
    /// Returns whether the value was cached.
    pub async fn set_if_current(&self, key: K, value: V, generation: u64) -> bool {
        let mut state = self.state.write().await;
        if state.generation != generation {
            return false;
        }
        self.insert(&mut state, key, value)
    }

    fn insert(&self, state: &mut CacheState<K, V>, key: K, value: V) -> bool {
        if self.ttl.is_zero() {
            return false;
        }
        let now = Instant::now();
        state.sweep(now);
        state.entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: now + self.ttl,
            },
        );
        true
    }

    pub async fn evict(&self, key: &K) -> Option<V> {
        let mut state = self.state.write().await;
        state.generation += 1;
        state.entries.remove(key).map(|e| e.value)
    }

    /// Keep only entries whose key satisfies `keep`.
    pub async fn retain(&self, mut keep: impl FnMut(&K) -> bool) {
        let mut state = self.state.write().await;
        state.generation += 1;
        state.entries.retain(|k, _| keep(k));
    }

    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.generation += 1;
        state.entries.clear();
    }

    /// Number of stored entries, expired ones included until the next write.
    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.entries.is_empty()
    }
}
