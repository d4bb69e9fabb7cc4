//! Generic TTL + capacity-bounded cache
//!
//! Each component owns its cache instances (file-content, symbol,
//! git-result), configured independently. The cache is advisory: a miss is
//! always a correct answer, so internal anomalies degrade to a forced miss
//! rather than an error. Concurrent readers and writers are safe; a racing
//! eviction may be lost, which is acceptable, but entries are never
//! observable half-written.

use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::config::CacheSettings;

/// Counters reported by [`TtlCache::stats`].
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub entry_count: usize,
    pub approx_size_bytes: u64,
}

struct Entry<V> {
    value: V,
    expires_at: Option<Instant>,
    /// Monotonic access tick; smallest tick is the LRU victim.
    last_used: u64,
    charge: u64,
}

/// Key→value store with least-recently-used eviction and lazy TTL expiry.
///
/// A TTL-expired entry counts as a miss and is evicted on access, not by a
/// background sweep.
pub struct TtlCache<K, V> {
    entries: DashMap<K, Entry<V>>,
    capacity: usize,
    default_ttl: Option<Duration>,
    tick: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    approx_bytes: AtomicU64,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(capacity: usize, default_ttl: Option<Duration>) -> Self {
        Self {
            entries: DashMap::new(),
            capacity: capacity.max(1),
            default_ttl,
            tick: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            approx_bytes: AtomicU64::new(0),
        }
    }

    pub fn from_settings(settings: &CacheSettings) -> Self {
        Self::new(settings.capacity, settings.ttl_seconds.map(Duration::from_secs))
    }

    /// Look up a key, refreshing its recency on a hit.
    pub fn get(&self, key: &K) -> Option<V> {
        let expired = {
            match self.entries.get_mut(key) {
                Some(mut entry) => {
                    let now = Instant::now();
                    if entry.expires_at.is_some_and(|at| at <= now) {
                        true
                    } else {
                        entry.last_used = self.tick.fetch_add(1, Ordering::Relaxed);
                        let value = entry.value.clone();
                        drop(entry);
                        self.hits.fetch_add(1, Ordering::Relaxed);
                        return Some(value);
                    }
                }
                None => {
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    return None;
                }
            }
        };
        if expired {
            if let Some((_, entry)) = self.entries.remove(key) {
                self.approx_bytes.fetch_sub(entry.charge, Ordering::Relaxed);
            }
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        None
    }

    /// Insert with the cache's default TTL and a size-of-value charge.
    pub fn put(&self, key: K, value: V) {
        let charge = (std::mem::size_of::<K>() + std::mem::size_of::<V>()) as u64;
        self.put_sized(key, value, charge);
    }

    /// Insert with an explicit byte charge for size accounting.
    pub fn put_sized(&self, key: K, value: V, charge: u64) {
        let entry = Entry {
            value,
            expires_at: self.default_ttl.map(|ttl| Instant::now() + ttl),
            last_used: self.tick.fetch_add(1, Ordering::Relaxed),
            charge,
        };
        if let Some(old) = self.entries.insert(key, entry) {
            self.approx_bytes.fetch_sub(old.charge, Ordering::Relaxed);
        }
        self.approx_bytes.fetch_add(charge, Ordering::Relaxed);
        self.evict_over_capacity();
    }

    /// Drop one key. A no-op for absent keys.
    pub fn invalidate(&self, key: &K) {
        if let Some((_, entry)) = self.entries.remove(key) {
            self.approx_bytes.fetch_sub(entry.charge, Ordering::Relaxed);
        }
    }

    /// Drop every entry. Other cache instances are unaffected.
    pub fn clear(&self) {
        self.entries.clear();
        self.approx_bytes.store(0, Ordering::Relaxed);
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        CacheStats {
            hits,
            misses,
            hit_rate: if total == 0 { 0.0 } else { hits as f64 / total as f64 },
            entry_count: self.entries.len(),
            approx_size_bytes: self.approx_bytes.load(Ordering::Relaxed),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Evict least-recently-used entries until within capacity. The victim
    /// scan and the removal are separate steps, so a concurrent access can
    /// win the race and keep its entry alive.
    fn evict_over_capacity(&self) {
        while self.entries.len() > self.capacity {
            let victim = self
                .entries
                .iter()
                .min_by_key(|entry| entry.last_used)
                .map(|entry| entry.key().clone());
            match victim {
                Some(key) => {
                    if let Some((_, entry)) = self.entries.remove(&key) {
                        self.approx_bytes.fetch_sub(entry.charge, Ordering::Relaxed);
                    } else {
                        break;
                    }
                }
                None => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn put_then_get_returns_value() {
        let cache: TtlCache<String, u32> = TtlCache::new(8, None);
        cache.put("a".to_string(), 1);
        assert_eq!(cache.get(&"a".to_string()), Some(1));
    }

    #[test]
    fn miss_on_absent_key() {
        let cache: TtlCache<String, u32> = TtlCache::new(8, None);
        assert_eq!(cache.get(&"missing".to_string()), None);
        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 0);
    }

    #[test]
    fn invalidate_removes_entry() {
        let cache: TtlCache<String, u32> = TtlCache::new(8, None);
        cache.put("a".to_string(), 1);
        cache.invalidate(&"a".to_string());
        assert_eq!(cache.get(&"a".to_string()), None);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn ttl_expiry_counts_as_miss_and_evicts() {
        let cache: TtlCache<String, u32> = TtlCache::new(8, Some(Duration::from_millis(20)));
        cache.put("a".to_string(), 1);
        assert_eq!(cache.get(&"a".to_string()), Some(1));
        sleep(Duration::from_millis(40));
        assert_eq!(cache.get(&"a".to_string()), None);
        assert_eq!(cache.len(), 0);
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn lru_eviction_at_capacity() {
        let cache: TtlCache<String, u32> = TtlCache::new(2, None);
        cache.put("a".to_string(), 1);
        cache.put("b".to_string(), 2);
        // Touch "a" so "b" becomes least recently used.
        assert_eq!(cache.get(&"a".to_string()), Some(1));
        cache.put("c".to_string(), 3);

        assert_eq!(cache.stats().entry_count, 2);
        assert_eq!(cache.get(&"b".to_string()), None);
        assert_eq!(cache.get(&"a".to_string()), Some(1));
        assert_eq!(cache.get(&"c".to_string()), Some(3));
    }

    #[test]
    fn clear_resets_entries_not_counters() {
        let cache: TtlCache<String, u32> = TtlCache::new(8, None);
        cache.put("a".to_string(), 1);
        assert_eq!(cache.get(&"a".to_string()), Some(1));
        cache.clear();
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.stats().approx_size_bytes, 0);
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn hit_rate_reflects_accesses() {
        let cache: TtlCache<u32, u32> = TtlCache::new(8, None);
        cache.put(1, 10);
        cache.get(&1);
        cache.get(&1);
        cache.get(&2);
        cache.get(&3);
        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 2);
        assert!((stats.hit_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn size_accounting_tracks_puts_and_replacements() {
        let cache: TtlCache<String, String> = TtlCache::new(8, None);
        cache.put_sized("a".to_string(), "one".to_string(), 100);
        assert_eq!(cache.stats().approx_size_bytes, 100);
        cache.put_sized("a".to_string(), "two".to_string(), 40);
        assert_eq!(cache.stats().approx_size_bytes, 40);
        cache.invalidate(&"a".to_string());
        assert_eq!(cache.stats().approx_size_bytes, 0);
    }

    #[test]
    fn concurrent_access_is_safe() {
        use std::sync::Arc;
        let cache: Arc<TtlCache<u32, u32>> = Arc::new(TtlCache::new(32, None));
        let mut handles = Vec::new();
        for t in 0..4u32 {
            let cache = Arc::clone(&cache);
            handles.push(std::thread::spawn(move || {
                for i in 0..200u32 {
                    cache.put(t * 1000 + i, i);
                    cache.get(&(t * 1000 + i));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(cache.len() <= 32);
    }
}
