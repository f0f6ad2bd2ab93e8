//! In-memory LRU response store.

use super::{CachedResponse, ResponseCache};
use crate::error::Result;
use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;

/// LRU store bounded by the total size of its entries.
///
/// An entry larger than the whole budget is not stored.
pub struct MemoryCache {
    inner: Mutex<Inner>,
    max_bytes: u64,
}

struct Inner {
    entries: LruCache<String, CachedResponse>,
    total_bytes: u64,
}

impl MemoryCache {
    /// Create a store holding at most `max_bytes`.
    pub fn new(max_bytes: u64) -> Self {
        MemoryCache {
            inner: Mutex::new(Inner {
                entries: LruCache::unbounded(),
                total_bytes: 0,
            }),
            max_bytes,
        }
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current footprint in bytes.
    pub fn total_bytes(&self) -> u64 {
        self.inner.lock().total_bytes
    }
}

#[async_trait]
impl ResponseCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<CachedResponse>> {
        Ok(self.inner.lock().entries.get(key).cloned())
    }

    async fn put(&self, key: &str, entry: CachedResponse) -> Result<()> {
        let size = entry.size();
        let mut inner = self.inner.lock();

        if let Some(previous) = inner.entries.pop(key) {
            inner.total_bytes -= previous.size();
        }
        if size > self.max_bytes {
            tracing::debug!(key, size, "response larger than cache budget, not stored");
            return Ok(());
        }

        while inner.total_bytes + size > self.max_bytes {
            match inner.entries.pop_lru() {
                Some((evicted_key, evicted)) => {
                    tracing::debug!(key = %evicted_key, "evicting cached response");
                    inner.total_bytes -= evicted.size();
                }
                None => break,
            }
        }

        inner.entries.put(key.to_string(), entry);
        inner.total_bytes += size;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        if let Some(previous) = inner.entries.pop(key) {
            inner.total_bytes -= previous.size();
        }
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.total_bytes = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::sample_entry;

    #[tokio::test]
    async fn test_put_and_get() {
        let cache = MemoryCache::new(1024);
        cache.put("GET a", sample_entry("alpha", "max-age=60")).await.unwrap();

        let entry = cache.get("GET a").await.unwrap().unwrap();
        assert_eq!(&entry.body[..], b"alpha");
        assert!(cache.get("GET b").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_replace_keeps_accounting() {
        let cache = MemoryCache::new(1024);
        cache.put("k", sample_entry("one", "max-age=60")).await.unwrap();
        let first = cache.total_bytes();
        cache.put("k", sample_entry("two", "max-age=60")).await.unwrap();
        assert_eq!(cache.total_bytes(), first);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_evicts_least_recently_used() {
        let entry_size = sample_entry("0123456789", "max-age=60").size();
        let cache = MemoryCache::new(entry_size * 2);

        cache.put("a", sample_entry("0123456789", "max-age=60")).await.unwrap();
        cache.put("b", sample_entry("0123456789", "max-age=60")).await.unwrap();
        // touch "a" so "b" becomes the eviction candidate
        cache.get("a").await.unwrap();
        cache.put("c", sample_entry("0123456789", "max-age=60")).await.unwrap();

        assert!(cache.get("a").await.unwrap().is_some());
        assert!(cache.get("b").await.unwrap().is_none());
        assert!(cache.get("c").await.unwrap().is_some());
        assert!(cache.total_bytes() <= entry_size * 2);
    }

    #[tokio::test]
    async fn test_oversized_entry_not_stored() {
        let cache = MemoryCache::new(4);
        cache.put("big", sample_entry("way too large", "max-age=60")).await.unwrap();
        assert!(cache.is_empty());
        assert_eq!(cache.total_bytes(), 0);
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let cache = MemoryCache::new(1024);
        cache.put("a", sample_entry("a", "max-age=60")).await.unwrap();
        cache.put("b", sample_entry("b", "max-age=60")).await.unwrap();

        cache.remove("a").await.unwrap();
        assert_eq!(cache.len(), 1);

        cache.clear().await.unwrap();
        assert!(cache.is_empty());
        assert_eq!(cache.total_bytes(), 0);
    }
}
