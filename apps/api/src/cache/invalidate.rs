//! Cache Invalidator — removes affected keys after successful writes.
//!
//! Runs synchronously after the write commits and before the response goes
//! out, so an acknowledged write is never followed by a stale read of the
//! keys named here. Failures are logged and swallowed: a missed
//! invalidation leaves entries to age out by TTL, it never rolls back the
//! write.

use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use super::response::user_scope_key;
use super::CacheBackend;

#[derive(Clone)]
pub struct CacheInvalidator {
    backend: Arc<dyn CacheBackend>,
}

impl CacheInvalidator {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    /// Deletes exactly one entry; no-op when absent.
    pub async fn invalidate(&self, key: &str) {
        match self.backend.delete(key).await {
            Ok(()) => debug!("Invalidated {key}"),
            Err(e) => warn!("Failed to invalidate {key}: {e}"),
        }
    }

    /// Deletes every key matching the glob in one batch; no-op when none
    /// match.
    pub async fn invalidate_pattern(&self, pattern: &str) {
        match self.backend.delete_matching(pattern).await {
            Ok(removed) => debug!("Invalidated {removed} keys matching {pattern}"),
            Err(e) => warn!("Failed to invalidate pattern {pattern}: {e}"),
        }
    }

    /// Job create/update/delete: every cached jobs listing or detail URL,
    /// plus every recommendation (job data feeds recommendations).
    pub async fn after_job_write(&self) {
        self.invalidate_pattern("api:/api/jobs*").await;
        self.invalidate_pattern("recommendation:*").await;
    }

    /// Profile write for one user: their profile URL, the shared
    /// current-user-profile key, and their recommendations.
    pub async fn after_profile_write(&self, user_id: Uuid) {
        self.invalidate(&format!("api:/api/profile/{user_id}")).await;
        self.invalidate("api:/api/profile").await;
        self.invalidate_pattern(&format!("recommendation:{user_id}:*"))
            .await;
    }

    /// Application write for one user: the logical applications-list key.
    pub async fn after_application_write(&self, user_id: Uuid) {
        self.invalidate(&user_scope_key(user_id, "applications")).await;
    }

    /// Saved-job write for one user: the logical saved-jobs-list key.
    pub async fn after_saved_job_write(&self, user_id: Uuid) {
        self.invalidate(&user_scope_key(user_id, "saved-jobs")).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;

    async fn seeded() -> (Arc<MemoryCache>, CacheInvalidator, Uuid, Uuid) {
        let backend = Arc::new(MemoryCache::new());
        let user = Uuid::new_v4();
        let other = Uuid::new_v4();
        for key in [
            "api:/api/jobs?page=1&limit=10".to_string(),
            "api:/api/jobs/11111111-1111-1111-1111-111111111111".to_string(),
            "api:/api/profile".to_string(),
            format!("api:/api/profile/{user}"),
            format!("api:/api/profile/{other}"),
            format!("recommendation:{user}:go,rust"),
            format!("recommendation:{other}:python"),
            format!("user:{user}:applications"),
            format!("user:{user}:saved-jobs"),
        ] {
            backend.set(&key, "cached", 300).await.unwrap();
        }
        let invalidator = CacheInvalidator::new(backend.clone());
        (backend, invalidator, user, other)
    }

    #[tokio::test]
    async fn test_exact_invalidation_deletes_one_key() {
        let (backend, invalidator, user, other) = seeded().await;
        invalidator
            .invalidate(&format!("api:/api/profile/{user}"))
            .await;
        assert!(backend
            .get(&format!("api:/api/profile/{user}"))
            .await
            .unwrap()
            .is_none());
        assert!(backend
            .get(&format!("api:/api/profile/{other}"))
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_exact_invalidation_of_absent_key_is_noop() {
        let (_, invalidator, _, _) = seeded().await;
        invalidator.invalidate("api:/never-cached").await;
    }

    #[tokio::test]
    async fn test_job_write_clears_job_urls_and_all_recommendations() {
        let (backend, invalidator, user, other) = seeded().await;
        invalidator.after_job_write().await;

        assert!(backend.get("api:/api/jobs?page=1&limit=10").await.unwrap().is_none());
        assert!(backend
            .get("api:/api/jobs/11111111-1111-1111-1111-111111111111")
            .await
            .unwrap()
            .is_none());
        assert!(backend
            .get(&format!("recommendation:{user}:go,rust"))
            .await
            .unwrap()
            .is_none());
        assert!(backend
            .get(&format!("recommendation:{other}:python"))
            .await
            .unwrap()
            .is_none());
        // Profile keys are untouched by a job write.
        assert!(backend.get("api:/api/profile").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_profile_write_clears_own_keys_only() {
        let (backend, invalidator, user, other) = seeded().await;
        invalidator.after_profile_write(user).await;

        assert!(backend
            .get(&format!("api:/api/profile/{user}"))
            .await
            .unwrap()
            .is_none());
        assert!(backend.get("api:/api/profile").await.unwrap().is_none());
        assert!(backend
            .get(&format!("recommendation:{user}:go,rust"))
            .await
            .unwrap()
            .is_none());

        assert!(backend
            .get(&format!("api:/api/profile/{other}"))
            .await
            .unwrap()
            .is_some());
        assert!(backend
            .get(&format!("recommendation:{other}:python"))
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_application_and_saved_job_writes_clear_logical_keys() {
        let (backend, invalidator, user, _) = seeded().await;

        invalidator.after_application_write(user).await;
        assert!(backend
            .get(&format!("user:{user}:applications"))
            .await
            .unwrap()
            .is_none());
        assert!(backend
            .get(&format!("user:{user}:saved-jobs"))
            .await
            .unwrap()
            .is_some());

        invalidator.after_saved_job_write(user).await;
        assert!(backend
            .get(&format!("user:{user}:saved-jobs"))
            .await
            .unwrap()
            .is_none());
    }
}
