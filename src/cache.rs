//! In-memory result cache with per-entry expiry.
//!
//! Entries are immutable once written. Expired entries read as absent and
//! are dropped lazily. Concurrent misses on the same key are not coalesced.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::RwLock;

/// A cached value with its validity window.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub value: T,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Thread-safe TTL cache.
pub struct ResultCache<T> {
    entries: RwLock<HashMap<String, CacheEntry<T>>>,
}

impl<T: Clone> ResultCache<T> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Look up a live entry.
    pub fn get(&self, key: &str) -> Option<CacheEntry<T>> {
        self.get_at(key, Utc::now())
    }

    /// Look up an entry as of `now`.
    pub fn get_at(&self, key: &str, now: DateTime<Utc>) -> Option<CacheEntry<T>> {
        {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            match entries.get(key) {
                None => return None,
                Some(entry) if !entry.is_expired(now) => return Some(entry.clone()),
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if entries.get(key).is_some_and(|e| e.is_expired(now)) {
            entries.remove(key);
        }
        None
    }

    /// Store `value` for `ttl`. A non-positive ttl stores nothing.
    pub fn put(&self, key: &str, value: T, ttl: Duration) -> Option<CacheEntry<T>> {
        self.put_at(key, value, ttl, Utc::now())
    }

    /// Store `value` as of `now`. Returns the stored entry.
    pub fn put_at(
        &self,
        key: &str,
        value: T,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Option<CacheEntry<T>> {
        if ttl <= Duration::zero() {
            return None;
        }

        let entry = CacheEntry {
            value,
            created_at: now,
            expires_at: now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
        };
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), entry.clone());
        Some(entry)
    }

    /// Remove every expired entry. Returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone> Default for ResultCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_put_then_get() {
        let cache = ResultCache::new();
        let now = Utc::now();
        cache.put_at("k", "value".to_string(), Duration::seconds(60), now);

        let entry = cache.get_at("k", now).unwrap();
        assert_eq!(entry.value, "value");
        assert_eq!(entry.created_at, now);
        assert_eq!(entry.expires_at, now + Duration::seconds(60));
    }

    #[test]
    fn test_expired_entry_is_absent() {
        let cache = ResultCache::new();
        let now = Utc::now();
        cache.put_at("k", 1u32, Duration::seconds(60), now);

        assert!(cache.get_at("k", now + Duration::seconds(59)).is_some());
        assert!(cache.get_at("k", now + Duration::seconds(60)).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_non_positive_ttl_disables_caching() {
        let cache = ResultCache::new();
        assert!(cache.put("k", 1u32, Duration::zero()).is_none());
        assert!(cache.put("k", 1u32, Duration::seconds(-5)).is_none());
        assert!(cache.get("k").is_none());
    }

    #[test]
    fn test_huge_ttl_saturates() {
        let cache = ResultCache::new();
        let now = Utc::now();
        let entry = cache.put_at("k", 1u32, Duration::MAX, now).unwrap();

        assert_eq!(entry.expires_at, DateTime::<Utc>::MAX_UTC);
        assert!(cache.get_at("k", now + Duration::days(365 * 1000)).is_some());
    }

    #[test]
    fn test_missing_key() {
        let cache: ResultCache<u32> = ResultCache::new();
        assert!(cache.get("nope").is_none());
    }

    #[test]
    fn test_overwrite_replaces_entry() {
        let cache = ResultCache::new();
        cache.put("k", 1u32, Duration::seconds(60));
        cache.put("k", 2u32, Duration::seconds(60));
        assert_eq!(cache.get("k").unwrap().value, 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_purge_expired() {
        let cache = ResultCache::new();
        let past = Utc::now() - Duration::seconds(120);
        cache.put_at("old", 1u32, Duration::seconds(60), past);
        cache.put("fresh", 2u32, Duration::seconds(60));

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("fresh").is_some());
    }

    #[tokio::test]
    async fn test_concurrent_access() {
        let cache = Arc::new(ResultCache::new());
        let mut handles = Vec::new();

        for i in 0..16u32 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                let key = format!("key-{}", i % 4);
                cache.put(&key, i, Duration::seconds(60));
                cache.get(&key).is_some()
            }));
        }

        for handle in handles {
            assert!(handle.await.unwrap());
        }
        assert_eq!(cache.len(), 4);
    }
}
