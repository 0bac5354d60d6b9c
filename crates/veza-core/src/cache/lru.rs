//! Bounded LRU cache.
//!
//! Thread-safe LRU with O(1) amortized operations on top of `IndexMap`
//! (insertion order preserved: front = LRU, back = MRU). A single mutex
//! guards the map; statistics are atomics so monitoring reads stay
//! lock-free.

#![allow(clippy::cast_precision_loss)] // hit-rate is a monitoring figure

use indexmap::IndexMap;
use parking_lot::Mutex;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};

/// Cache statistics for monitoring.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of evictions.
    pub evictions: u64,
}

impl CacheStats {
    /// Hit rate in [0.0, 1.0].
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Thread-safe bounded LRU cache.
#[derive(Debug)]
pub struct LruCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    capacity: usize,
    inner: Mutex<IndexMap<K, V>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Creates a new LRU cache holding at most `capacity` entries.
    ///
    /// A zero capacity disables the cache: every `get` misses and `insert`
    /// is a no-op.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(IndexMap::with_capacity(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Maximum number of entries.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Returns true if the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Inserts a key-value pair, evicting the LRU entry at capacity.
    pub fn insert(&self, key: K, value: V) {
        if self.capacity == 0 {
            return;
        }
        let mut inner = self.inner.lock();

        // Re-inserting an existing key refreshes its recency.
        if inner.shift_remove(&key).is_some() {
            inner.insert(key, value);
            return;
        }

        if inner.len() >= self.capacity {
            // Front of the IndexMap is the least recently used entry.
            if inner.shift_remove_index(0).is_some() {
                self.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }

        inner.insert(key, value);
    }

    /// Returns a clone of the cached value, refreshing its recency.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        let mut inner = self.inner.lock();
        match inner.shift_remove(key) {
            Some(v) => {
                inner.insert(key.clone(), v.clone());
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(v)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Returns a clone of the cached value without touching recency.
    #[must_use]
    pub fn peek(&self, key: &K) -> Option<V> {
        self.inner.lock().get(key).cloned()
    }

    /// Drops all entries.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Snapshot of hit/miss/eviction counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}
