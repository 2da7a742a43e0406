//! In-process `CacheBackend` with per-entry TTL. Used by the test suite and
//! when no REDIS_URL is configured.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use super::{glob_match, CacheBackend, CacheError};

struct Entry {
    value: String,
    expires_at: Instant,
}

#[derive(Default)]
pub struct MemoryCache {
    entries: DashMap<String, Entry>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn live_keys(&self, pattern: &str) -> Vec<String> {
        let now = Instant::now();
        self.entries
            .iter()
            .filter(|entry| entry.expires_at > now && glob_match(pattern, entry.key()))
            .map(|entry| entry.key().clone())
            .collect()
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > Instant::now() {
                return Ok(Some(entry.value.clone()));
            }
            drop(entry);
            self.entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), CacheError> {
        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + Duration::from_secs(ttl_seconds),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn keys_matching(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        Ok(self.live_keys(pattern))
    }

    async fn delete_matching(&self, pattern: &str) -> Result<u64, CacheError> {
        let keys = self.live_keys(pattern);
        let mut removed = 0;
        for key in keys {
            if self.entries.remove(&key).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_then_get_round_trips() {
        let cache = MemoryCache::new();
        cache.set("k", "payload", 60).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("payload"));
    }

    #[tokio::test]
    async fn test_zero_ttl_entry_is_already_expired() {
        let cache = MemoryCache::new();
        cache.set("k", "payload", 0).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let cache = MemoryCache::new();
        cache.set("k", "v", 60).await.unwrap();
        cache.delete("k").await.unwrap();
        cache.delete("k").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_matching_leaves_non_matching_keys() {
        let cache = MemoryCache::new();
        cache.set("api:/api/jobs?page=1", "a", 60).await.unwrap();
        cache.set("api:/api/jobs/42", "b", 60).await.unwrap();
        cache.set("api:/api/profile", "c", 60).await.unwrap();

        let removed = cache.delete_matching("api:/api/jobs*").await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(cache.get("api:/api/jobs?page=1").await.unwrap(), None);
        assert_eq!(cache.get("api:/api/jobs/42").await.unwrap(), None);
        assert_eq!(cache.get("api:/api/profile").await.unwrap().as_deref(), Some("c"));
    }

    #[tokio::test]
    async fn test_delete_matching_with_no_matches_is_noop() {
        let cache = MemoryCache::new();
        cache.set("x", "v", 60).await.unwrap();
        assert_eq!(cache.delete_matching("api:*").await.unwrap(), 0);
        assert_eq!(cache.get("x").await.unwrap().as_deref(), Some("v"));
    }

    // Two concurrent writers racing the same key: one value wins whole.
    #[tokio::test]
    async fn test_last_writer_wins_on_set_race() {
        let cache = std::sync::Arc::new(MemoryCache::new());
        let a = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.set("k", "first", 60).await })
        };
        let b = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.set("k", "second", 60).await })
        };
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        let value = cache.get("k").await.unwrap().unwrap();
        assert!(value == "first" || value == "second");
    }
}
