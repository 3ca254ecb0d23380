//! Fixed-capacity in-memory TTL cache shared across request handlers
//!
//! Two instances exist for the process lifetime: one for search result
//! pages, one for formatted forecasts. Entries expire a fixed time after
//! insertion and expired entries count as absent on read. When the cache is
//! full the least recently *inserted* entry is evicted (re-inserting a key
//! refreshes both its value and its position).

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

struct Inner<V> {
    map: HashMap<String, Entry<V>>,
    // Keys in insertion order, oldest first
    order: VecDeque<String>,
}

/// Time-expiring key/value store with bounded entry count
pub struct TtlCache<V> {
    inner: RwLock<Inner<V>>,
    capacity: usize,
    ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
    /// Create a cache holding at most `capacity` entries for `ttl` each
    #[must_use]
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            inner: RwLock::new(Inner {
                map: HashMap::new(),
                order: VecDeque::new(),
            }),
            capacity,
            ttl,
        }
    }

    /// Look up `key`, treating expired entries as absent
    pub async fn get(&self, key: &str) -> Option<V> {
        {
            let inner = self.inner.read().await;
            match inner.map.get(key) {
                Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                    return Some(entry.value.clone());
                }
                Some(_) => {} // expired, drop below under the write lock
                None => return None,
            }
        }

        let mut inner = self.inner.write().await;
        match inner.map.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                // A concurrent put refreshed the entry in between
                Some(entry.value.clone())
            }
            Some(_) => {
                inner.map.remove(key);
                inner.order.retain(|k| k != key);
                None
            }
            None => None,
        }
    }

    /// Insert or overwrite `key`, evicting the oldest entries when full
    pub async fn put(&self, key: &str, value: V) {
        let mut inner = self.inner.write().await;
        if inner.map.contains_key(key) {
            inner.order.retain(|k| k != key);
        }
        inner.order.push_back(key.to_string());
        inner.map.insert(
            key.to_string(),
            Entry {
                value,
                inserted_at: Instant::now(),
            },
        );
        while inner.map.len() > self.capacity {
            let Some(oldest) = inner.order.pop_front() else {
                break;
            };
            inner.map.remove(&oldest);
        }
    }

    /// Number of entries currently stored, expired ones included
    pub async fn len(&self) -> usize {
        self.inner.read().await.map.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_get() {
        let cache = TtlCache::new(10, Duration::from_secs(60));
        cache.put("a", 1u32).await;
        assert_eq!(cache.get("a").await, Some(1));
        assert_eq!(cache.get("b").await, None);
    }

    #[tokio::test]
    async fn test_overwrite_replaces_value() {
        let cache = TtlCache::new(10, Duration::from_secs(60));
        cache.put("a", 1u32).await;
        cache.put("a", 2u32).await;
        assert_eq!(cache.get("a").await, Some(2));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_expired_entry_is_absent() {
        let cache = TtlCache::new(10, Duration::from_millis(20));
        cache.put("a", 1u32).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(cache.get("a").await, None);
        // The expired entry was dropped on read
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_capacity_evicts_least_recently_inserted() {
        let cache = TtlCache::new(2, Duration::from_secs(60));
        cache.put("a", 1u32).await;
        cache.put("b", 2u32).await;
        cache.put("c", 3u32).await;
        assert_eq!(cache.get("a").await, None);
        assert_eq!(cache.get("b").await, Some(2));
        assert_eq!(cache.get("c").await, Some(3));
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn test_reinsert_refreshes_eviction_order() {
        let cache = TtlCache::new(2, Duration::from_secs(60));
        cache.put("a", 1u32).await;
        cache.put("b", 2u32).await;
        // Re-inserting "a" makes "b" the oldest entry
        cache.put("a", 10u32).await;
        cache.put("c", 3u32).await;
        assert_eq!(cache.get("a").await, Some(10));
        assert_eq!(cache.get("b").await, None);
        assert_eq!(cache.get("c").await, Some(3));
    }

    #[tokio::test]
    async fn test_reads_do_not_refresh_eviction_order() {
        let cache = TtlCache::new(2, Duration::from_secs(60));
        cache.put("a", 1u32).await;
        cache.put("b", 2u32).await;
        // Reading "a" must not save it: eviction is insertion-ordered, not LRU
        assert_eq!(cache.get("a").await, Some(1));
        cache.put("c", 3u32).await;
        assert_eq!(cache.get("a").await, None);
        assert_eq!(cache.get("b").await, Some(2));
    }
}
