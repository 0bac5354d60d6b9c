//! Tests for the bounded LRU cache.

use super::LruCache;

#[test]
fn test_insert_and_get() {
    let cache: LruCache<u32, Vec<u32>> = LruCache::new(4);
    cache.insert(7, vec![1, 2, 3]);
    assert_eq!(cache.get(&7), Some(vec![1, 2, 3]));
    assert_eq!(cache.get(&8), None);
}

#[test]
fn test_eviction_order_is_lru() {
    let cache: LruCache<u32, u32> = LruCache::new(2);
    cache.insert(1, 10);
    cache.insert(2, 20);
    // Touch 1 so 2 becomes the LRU entry.
    assert_eq!(cache.get(&1), Some(10));
    cache.insert(3, 30);

    assert_eq!(cache.peek(&2), None);
    assert_eq!(cache.peek(&1), Some(10));
    assert_eq!(cache.peek(&3), Some(30));
    assert_eq!(cache.stats().evictions, 1);
}

#[test]
fn test_reinsert_refreshes_recency() {
    let cache: LruCache<u32, u32> = LruCache::new(2);
    cache.insert(1, 10);
    cache.insert(2, 20);
    cache.insert(1, 11);
    cache.insert(3, 30);

    // 2 was the LRU entry after 1 was re-inserted.
    assert_eq!(cache.peek(&2), None);
    assert_eq!(cache.peek(&1), Some(11));
}

#[test]
fn test_zero_capacity_disables_cache() {
    let cache: LruCache<u32, u32> = LruCache::new(0);
    cache.insert(1, 10);
    assert_eq!(cache.get(&1), None);
    assert!(cache.is_empty());
}

#[test]
fn test_stats_hit_rate() {
    let cache: LruCache<u32, u32> = LruCache::new(4);
    cache.insert(1, 10);
    let _ = cache.get(&1);
    let _ = cache.get(&1);
    let _ = cache.get(&2);

    let stats = cache.stats();
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.misses, 1);
    assert!((stats.hit_rate() - 2.0 / 3.0).abs() < 1e-9);
}

#[test]
fn test_len_never_exceeds_capacity() {
    let cache: LruCache<u32, u32> = LruCache::new(8);
    for i in 0..100 {
        cache.insert(i, i);
    }
    assert_eq!(cache.len(), 8);
}
