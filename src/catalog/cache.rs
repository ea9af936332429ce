use lru::LruCache;
use serde_json::Value;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use tokio::time::{Duration, Instant};

/// Bounded response cache with a fixed time-to-live.
///
/// Keys are request descriptions (path plus query, credentials excluded).
/// Uses `tokio::time::Instant` so paused-clock tests can step past the TTL.
pub struct ResponseCache {
    entries: Mutex<LruCache<String, (Instant, Value)>>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    /// Returns a fresh entry. Expired entries are evicted on lookup.
    pub fn get(&self, key: &str) -> Option<Value> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let fresh = match entries.get(key) {
            Some((stored_at, value)) if stored_at.elapsed() < self.ttl => Some(value.clone()),
            Some(_) => None,
            None => return None,
        };
        if fresh.is_none() {
            entries.pop(key);
            tracing::debug!(key, "Cache entry expired");
        }
        fresh
    }

    pub fn insert(&self, key: String, value: Value) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.put(key, (Instant::now(), value));
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = ResponseCache::new(4, Duration::from_secs(300));
        cache.insert("trending/all/week?page=1".to_string(), json!({"page": 1}));

        tokio::time::advance(Duration::from_secs(299)).await;
        assert_eq!(cache.get("trending/all/week?page=1"), Some(json!({"page": 1})));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.get("trending/all/week?page=1"), None);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_least_recently_used_evicted() {
        let cache = ResponseCache::new(2, Duration::from_secs(60));
        cache.insert("a".to_string(), json!(1));
        cache.insert("b".to_string(), json!(2));
        assert!(cache.get("a").is_some());

        cache.insert("c".to_string(), json!(3));
        assert!(cache.get("b").is_none());
        assert!(cache.get("a").is_some());
        assert!(cache.get("c").is_some());
    }

    #[tokio::test]
    async fn test_zero_capacity_holds_one() {
        let cache = ResponseCache::new(0, Duration::from_secs(60));
        cache.insert("a".to_string(), json!(1));
        cache.insert("b".to_string(), json!(2));
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}
