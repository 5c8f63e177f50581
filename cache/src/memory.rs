//! Bounded in-process cache.
//!
//! A FIFO map: when an insertion pushes the size over capacity, the single
//! oldest-inserted entry is evicted. Reads do not refresh an entry's
//! position, so this is deliberately not an LRU.
//!
//! Entries never expire. A write that asks for an explicit ttl is not stored
//! at all; only the external backend can honour per-entry expiry.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use gateway_store::CacheBackend;

pub struct BoundedMemoryCache {
    inner: Mutex<Entries>,
    capacity: usize,
}

#[derive(Default)]
struct Entries {
    values: HashMap<String, String>,
    order: VecDeque<String>,
}

impl BoundedMemoryCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Entries::default()),
            capacity,
        }
    }

    /// Synchronous lookup.
    pub fn lookup(&self, key: &str) -> Option<String> {
        let entries = self.inner.lock().ok()?;
        entries.values.get(key).cloned()
    }

    /// Synchronous insert. Returns `false` when the write was skipped
    /// (explicit ttl, or zero capacity).
    ///
    /// Re-inserting an existing key replaces its value but keeps its original
    /// eviction position.
    pub fn insert(&self, key: &str, value: &str, ttl: Option<Duration>) -> bool {
        if let Some(ttl) = ttl {
            tracing::debug!(key, ttl_secs = ttl.as_secs(), "memory cache skips ttl writes");
            return false;
        }
        if self.capacity == 0 {
            return false;
        }
        let Ok(mut entries) = self.inner.lock() else {
            tracing::warn!(key, "memory cache lock poisoned, dropping write");
            return false;
        };
        if let Some(existing) = entries.values.get_mut(key) {
            *existing = value.to_string();
            return true;
        }
        entries.values.insert(key.to_string(), value.to_string());
        entries.order.push_back(key.to_string());
        if entries.order.len() > self.capacity {
            if let Some(evicted) = entries.order.pop_front() {
                entries.values.remove(&evicted);
            }
        }
        true
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.inner.lock().map(|e| e.values.len()).unwrap_or(0)
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for BoundedMemoryCache {
    fn default() -> Self {
        Self::new(crate::DEFAULT_MEMORY_CAPACITY)
    }
}

#[async_trait]
impl CacheBackend for BoundedMemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        self.lookup(key)
    }

    async fn put(&self, key: &str, value: &str, ttl: Option<Duration>) {
        self.insert(key, value, ttl);
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_lookup() {
        let cache = BoundedMemoryCache::new(10);
        assert_eq!(cache.lookup("hash"), None);
        assert!(cache.insert("hash", "work", None));
        assert_eq!(cache.lookup("hash").as_deref(), Some("work"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn overflow_evicts_first_inserted() {
        let cache = BoundedMemoryCache::new(800);
        for i in 0..801 {
            cache.insert(&format!("key-{i}"), &format!("value-{i}"), None);
        }
        assert_eq!(cache.len(), 800);
        assert_eq!(cache.lookup("key-0"), None);
        for i in 1..801 {
            assert_eq!(
                cache.lookup(&format!("key-{i}")),
                Some(format!("value-{i}")),
                "key-{i} should survive"
            );
        }
    }

    #[test]
    fn reads_do_not_refresh_position() {
        let cache = BoundedMemoryCache::new(2);
        cache.insert("a", "1", None);
        cache.insert("b", "2", None);
        assert!(cache.lookup("a").is_some());
        cache.insert("c", "3", None); // still evicts "a"
        assert_eq!(cache.lookup("a"), None);
        assert!(cache.lookup("b").is_some());
        assert!(cache.lookup("c").is_some());
    }

    #[test]
    fn ttl_write_is_not_stored() {
        let cache = BoundedMemoryCache::new(10);
        assert!(!cache.insert("k", "v", Some(Duration::from_secs(60))));
        assert_eq!(cache.lookup("k"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn rewrite_keeps_eviction_position() {
        let cache = BoundedMemoryCache::new(2);
        cache.insert("a", "1", None);
        cache.insert("b", "2", None);
        cache.insert("a", "updated", None);
        assert_eq!(cache.lookup("a").as_deref(), Some("updated"));
        cache.insert("c", "3", None);
        assert_eq!(cache.lookup("a"), None);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn zero_capacity_stores_nothing() {
        let cache = BoundedMemoryCache::new(0);
        assert!(!cache.insert("k", "v", None));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn trait_put_with_ttl_then_get_is_absent() {
        let cache = BoundedMemoryCache::default();
        let backend: &dyn CacheBackend = &cache;
        backend.put("k", "v", Some(Duration::from_secs(60))).await;
        assert_eq!(backend.get("k").await, None);
        backend.put("k", "v", None).await;
        assert_eq!(backend.get("k").await.as_deref(), Some("v"));
    }
}
