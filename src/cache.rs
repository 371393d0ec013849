//! Bounded result cache sitting in front of the index mapper. Any index
//! mutation invalidates it wholesale — a cached result is only ever as
//! fresh as the moment it was computed.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;

use crate::index::mapper::Hit;

/// Identifies one cached search: the raw query text plus a fingerprint of
/// the options that shaped it (fuzzy distance, fields, sort order, ...).
pub type CacheKey = (String, String);

#[derive(Debug, Clone)]
struct Entry {
    hits: Vec<Hit>,
    inserted_at: Instant,
}

/// Hit/miss/eviction counters, plus per-key access counts available via
/// [`Cache::analyze`].
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Which entry is sacrificed when the cache is full and a new key arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheStrategy {
    /// Evict the least-recently-used entry. The usual choice.
    #[default]
    Lru,
    /// Evict the most-recently-used entry, keeping the `max_size` entries
    /// that have gone the longest untouched.
    Mru,
}

/// A bounded cache of search results, with a parallel access-count table
/// for MRU-style analysis and a TTL that invalidates stale entries even
/// when the cache is not otherwise full. `entries` is always ordered
/// most-recently-used first by the underlying `lru::LruCache`; the
/// [`CacheStrategy`] only changes which end gets evicted on overflow.
pub struct Cache {
    entries: LruCache<CacheKey, Entry>,
    access_counts: HashMap<CacheKey, u64>,
    ttl: Duration,
    strategy: CacheStrategy,
    stats: CacheStats,
}

impl Cache {
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        Self::with_strategy(max_size, ttl, CacheStrategy::Lru)
    }

    pub fn with_strategy(max_size: usize, ttl: Duration, strategy: CacheStrategy) -> Self {
        let capacity = NonZeroUsize::new(max_size.max(1)).expect("max_size clamped to at least 1");
        Self {
            entries: LruCache::new(capacity),
            access_counts: HashMap::new(),
            ttl,
            strategy,
            stats: CacheStats::default(),
        }
    }

    /// Default knobs: 1000 entries, 5 minute TTL, LRU strategy.
    pub fn with_defaults() -> Self {
        Self::new(1000, Duration::from_secs(5 * 60))
    }

    pub fn get(&mut self, key: &CacheKey) -> Option<Vec<Hit>> {
        let Some(entry) = self.entries.get(key) else {
            self.stats.misses += 1;
            return None;
        };
        if entry.inserted_at.elapsed() > self.ttl {
            self.entries.pop(key);
            self.access_counts.remove(key);
            self.stats.misses += 1;
            return None;
        }
        self.stats.hits += 1;
        *self.access_counts.entry(key.clone()).or_insert(0) += 1;
        Some(entry.hits.clone())
    }

    pub fn set(&mut self, key: CacheKey, hits: Vec<Hit>) {
        let at_capacity = self.entries.len() >= self.entries.cap().get() && !self.entries.contains(&key);
        if at_capacity {
            self.stats.evictions += 1;
            if self.strategy == CacheStrategy::Mru {
                // `lru::LruCache` only exposes `pop_lru` (back of the
                // ordering); the most-recently-used entry sits at the front,
                // so it has to be found and removed by key instead.
                if let Some((mru_key, _)) = self.entries.iter().next() {
                    let mru_key = mru_key.clone();
                    self.entries.pop(&mru_key);
                    self.access_counts.remove(&mru_key);
                }
            }
        }
        self.entries.put(
            key,
            Entry {
                hits,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Invalidates every cached entry. Called by the engine on any index
    /// mutation (add/update/remove/import/reindex).
    pub fn clear(&mut self) {
        self.entries.clear();
        self.access_counts.clear();
    }

    /// Drops entries whose TTL has expired without touching fresh ones.
    pub fn prune(&mut self) {
        let expired: Vec<CacheKey> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.inserted_at.elapsed() > self.ttl)
            .map(|(key, _)| key.clone())
            .collect();
        for key in expired {
            self.entries.pop(&key);
            self.access_counts.remove(&key);
        }
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Per-key access counts, most-accessed first.
    pub fn analyze(&self) -> Vec<(CacheKey, u64)> {
        let mut counts: Vec<_> = self.access_counts.iter().map(|(k, v)| (k.clone(), *v)).collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(q: &str) -> CacheKey {
        (q.to_string(), "default".to_string())
    }

    #[test]
    fn miss_then_hit() {
        let mut cache = Cache::with_defaults();
        assert!(cache.get(&key("rust")).is_none());
        cache.set(key("rust"), vec![Hit { doc_id: "d-1".into(), score: 1.0, matches: Vec::new() }]);
        assert!(cache.get(&key("rust")).is_some());
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn expired_entries_are_treated_as_misses() {
        let mut cache = Cache::new(10, Duration::from_millis(0));
        cache.set(key("rust"), vec![Hit { doc_id: "d-1".into(), score: 1.0, matches: Vec::new() }]);
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get(&key("rust")).is_none());
    }

    #[test]
    fn clear_drops_everything() {
        let mut cache = Cache::with_defaults();
        cache.set(key("rust"), vec![]);
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get(&key("rust")).is_none());
    }

    #[test]
    fn eviction_is_counted_when_full() {
        let mut cache = Cache::new(1, Duration::from_secs(60));
        cache.set(key("a"), vec![]);
        cache.set(key("b"), vec![]);
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn mru_strategy_evicts_the_most_recently_touched_entry() {
        let mut cache = Cache::with_strategy(2, Duration::from_secs(60), CacheStrategy::Mru);
        cache.set(key("a"), vec![]);
        cache.set(key("b"), vec![]);
        // Touching "b" makes it the most-recently-used of the two.
        assert!(cache.get(&key("b")).is_some());
        cache.set(key("c"), vec![]);

        assert!(cache.get(&key("a")).is_some());
        assert!(cache.get(&key("b")).is_none());
        assert!(cache.get(&key("c")).is_some());
    }
}
