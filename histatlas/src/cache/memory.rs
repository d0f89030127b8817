//! Fixed-capacity in-memory cache with strict LRU eviction.
//!
//! Backed by the `lru` crate's ordered hash map: iteration order equals
//! access order, and both `get` and `put` hits move the entry to the
//! most-recently-used end. When full, `put` of a new key evicts exactly one
//! entry, the structurally-first (least recently used) one.
//!
//! The cache itself is not synchronized; the loader owns it behind a mutex
//! and never holds the guard across an await point.

use std::borrow::Borrow;
use std::hash::Hash;
use std::num::NonZeroUsize;

use lru::LruCache;

use super::CacheStats;

/// In-memory LRU cache.
///
/// Values are typically `Arc`s: an evicted value stays valid for anyone who
/// already holds a clone, it is just no longer retrievable by key.
pub struct MemoryCache<K: Hash + Eq, V> {
    inner: LruCache<K, V>,
    stats: CacheStats,
}

impl<K: Hash + Eq, V: Clone> MemoryCache<K, V> {
    /// Create a cache holding at most `capacity` entries.
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            inner: LruCache::new(capacity),
            stats: CacheStats::default(),
        }
    }

    /// Look up a value, promoting it to most-recently-used.
    pub fn get<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.inner.get(key) {
            Some(value) => {
                self.stats.hits += 1;
                Some(value.clone())
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Insert or overwrite a value, promoting it to most-recently-used.
    ///
    /// Returns the key of the entry evicted to make room, if any.
    pub fn put(&mut self, key: K, value: V) -> Option<K> {
        let replacing = self.inner.contains(&key);
        self.stats.inserts += 1;
        match self.inner.push(key, value) {
            Some((evicted, _)) if !replacing => {
                self.stats.evictions += 1;
                Some(evicted)
            }
            _ => None,
        }
    }

    /// Check for a key without changing recency order.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.contains(key)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.cap().get()
    }

    /// Keys ordered from least to most recently used.
    pub fn keys_by_recency(&self) -> Vec<&K> {
        self.inner.iter().rev().map(|(key, _)| key).collect()
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.entry_count = self.inner.len();
        stats
    }

    /// Remove all entries. Counters are kept.
    pub fn clear(&mut self) {
        self.inner.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn cache(capacity: usize) -> MemoryCache<String, u32> {
        MemoryCache::new(NonZeroUsize::new(capacity).unwrap())
    }

    fn keys(cache: &MemoryCache<String, u32>) -> Vec<&str> {
        cache
            .keys_by_recency()
            .into_iter()
            .map(String::as_str)
            .collect()
    }

    #[test]
    fn test_memory_cache_new() {
        let cache = cache(3);
        assert_eq!(cache.capacity(), 3);
        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_put_and_get() {
        let mut cache = cache(3);
        cache.put("a".to_string(), 1);

        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.get("b"), None);
        assert!(cache.contains("a"));
    }

    #[test]
    fn test_eviction_drops_first_inserted() {
        let mut cache = cache(3);
        for (i, key) in ["a", "b", "c"].iter().enumerate() {
            assert_eq!(cache.put(key.to_string(), i as u32), None);
        }

        let evicted = cache.put("d".to_string(), 3);
        assert_eq!(evicted.as_deref(), Some("a"));
        assert!(!cache.contains("a"));
        assert_eq!(keys(&cache), vec!["b", "c", "d"]);
    }

    #[test]
    fn test_get_promotes_entry() {
        let mut cache = cache(3);
        cache.put("a".to_string(), 1);
        cache.put("b".to_string(), 2);
        cache.put("c".to_string(), 3);
        cache.get("a");

        let evicted = cache.put("d".to_string(), 4);
        assert_eq!(evicted.as_deref(), Some("b"));
        assert_eq!(keys(&cache), vec!["c", "a", "d"]);
    }

    #[test]
    fn test_put_existing_overwrites_and_promotes() {
        let mut cache = cache(2);
        cache.put("a".to_string(), 1);
        cache.put("b".to_string(), 2);

        assert_eq!(cache.put("a".to_string(), 10), None);
        assert_eq!(cache.len(), 2);
        assert_eq!(keys(&cache), vec!["b", "a"]);
        assert_eq!(cache.get("a"), Some(10));
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_contains_does_not_promote() {
        let mut cache = cache(2);
        cache.put("a".to_string(), 1);
        cache.put("b".to_string(), 2);
        assert!(cache.contains("a"));

        cache.put("c".to_string(), 3);
        assert!(!cache.contains("a"));
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let mut cache = cache(10);
        for i in 0..100 {
            cache.put(format!("period_{}", i), i);
            assert!(cache.len() <= 10);
        }
        assert_eq!(cache.stats().evictions, 90);
    }

    #[test]
    fn test_statistics() {
        let mut cache = cache(2);
        cache.put("a".to_string(), 1);
        cache.get("a");
        cache.get("a");
        cache.get("missing");

        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.inserts, 1);
        assert_eq!(stats.entry_count, 1);
    }

    #[test]
    fn test_clear() {
        let mut cache = cache(2);
        cache.put("a".to_string(), 1);
        cache.clear();

        assert!(cache.is_empty());
        assert!(!cache.contains("a"));
    }

    #[test]
    fn test_evicted_value_stays_valid_for_holder() {
        let mut cache: MemoryCache<String, Arc<Vec<u8>>> =
            MemoryCache::new(NonZeroUsize::new(1).unwrap());
        let data = Arc::new(vec![1, 2, 3]);
        cache.put("a".to_string(), Arc::clone(&data));
        let held = cache.get("a").unwrap();

        cache.put("b".to_string(), Arc::new(vec![4]));
        assert!(!cache.contains("a"));
        assert_eq!(*held, vec![1, 2, 3]);
    }
}
