//! Response Cache — an explicit get-or-store wrapper around read handlers.
//!
//! The handler's computed payload is passed to the cache directly; there is
//! no interception of the response path. Three key namespaces exist side by
//! side and must stay distinct: `api:` keyed by the literal request URL,
//! `recommendation:` keyed by user + skill set, and logical `user:` keys for
//! per-user resource lists.

use std::future::Future;
use std::sync::Arc;

use axum::http::Uri;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use super::CacheBackend;

#[derive(Clone)]
pub struct ResponseCache {
    backend: Arc<dyn CacheBackend>,
}

impl ResponseCache {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    /// Serves `key` from cache when present; otherwise runs `handler` and,
    /// if and only if it succeeds, stores the payload under `key` for
    /// `ttl_seconds`. Backend failures degrade to a miss or a skipped store
    /// and never fail the request.
    pub async fn get_or_store<E, F, Fut>(
        &self,
        key: &str,
        ttl_seconds: u64,
        handler: F,
    ) -> Result<Value, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, E>>,
    {
        match self.backend.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str::<Value>(&raw) {
                Ok(payload) => {
                    debug!("Cache hit for {key}");
                    return Ok(payload);
                }
                Err(e) => warn!("Discarding unparseable cache entry {key}: {e}"),
            },
            Ok(None) => {}
            Err(e) => warn!("Cache read for {key} failed, treating as miss: {e}"),
        }

        let payload = handler().await?;

        match serde_json::to_string(&payload) {
            Ok(serialized) => {
                if let Err(e) = self.backend.set(key, &serialized, ttl_seconds).await {
                    warn!("Cache store for {key} failed, serving fresh result: {e}");
                }
            }
            Err(e) => warn!("Payload for {key} is not serializable, not caching: {e}"),
        }

        Ok(payload)
    }
}

/// `api:` key for a request: full path plus the query string exactly as
/// received, parameter order preserved.
pub fn request_key(uri: &Uri) -> String {
    match uri.query() {
        Some(query) => format!("api:{}?{}", uri.path(), query),
        None => format!("api:{}", uri.path()),
    }
}

/// `recommendation:` key: user plus their skill set, sorted
/// case-insensitively so the same set always derives the same key.
pub fn recommendation_key(user_id: Uuid, skills: &[String]) -> String {
    let mut skills: Vec<&String> = skills.iter().collect();
    skills.sort_by_key(|s| s.to_lowercase());
    let joined = skills
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(",");
    format!("recommendation:{user_id}:{joined}")
}

/// Logical per-user resource key, e.g. `user:{id}:applications`. Not
/// namespaced under `api:` on purpose.
pub fn user_scope_key(user_id: Uuid, resource: &str) -> String {
    format!("user:{user_id}:{resource}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheError, MemoryCache};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_request_key_preserves_query_verbatim() {
        let uri: Uri = "/api/jobs?limit=5&page=2".parse().unwrap();
        assert_eq!(request_key(&uri), "api:/api/jobs?limit=5&page=2");

        let reordered: Uri = "/api/jobs?page=2&limit=5".parse().unwrap();
        assert_ne!(request_key(&uri), request_key(&reordered));

        let bare: Uri = "/api/jobs".parse().unwrap();
        assert_eq!(request_key(&bare), "api:/api/jobs");
    }

    #[test]
    fn test_recommendation_key_is_order_insensitive() {
        let user = Uuid::new_v4();
        let a = recommendation_key(user, &["Rust".into(), "go".into(), "SQL".into()]);
        let b = recommendation_key(user, &["SQL".into(), "Rust".into(), "go".into()]);
        assert_eq!(a, b);
        assert_eq!(a, format!("recommendation:{user}:go,Rust,SQL"));
    }

    #[test]
    fn test_user_scope_key_has_no_api_prefix() {
        let user = Uuid::new_v4();
        assert_eq!(
            user_scope_key(user, "applications"),
            format!("user:{user}:applications")
        );
    }

    #[tokio::test]
    async fn test_miss_stores_then_hit_short_circuits() {
        let cache = ResponseCache::new(Arc::new(MemoryCache::new()));
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let payload: Result<Value, CacheError> = cache
                .get_or_store("api:/api/jobs", 60, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(json!({"results": [1, 2, 3]}))
                })
                .await;
            assert_eq!(payload.unwrap(), json!({"results": [1, 2, 3]}));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_handler_is_not_cached() {
        let backend = Arc::new(MemoryCache::new());
        let cache = ResponseCache::new(backend.clone());

        let result: Result<Value, CacheError> = cache
            .get_or_store("api:/api/jobs", 60, || async {
                Err(CacheError::Unavailable("boom".into()))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(backend.get("api:/api/jobs").await.unwrap(), None);

        // The next call runs the handler again and caches its success.
        let result: Result<Value, CacheError> = cache
            .get_or_store("api:/api/jobs", 60, || async { Ok(json!([1])) })
            .await;
        assert_eq!(result.unwrap(), json!([1]));
        assert!(backend.get("api:/api/jobs").await.unwrap().is_some());
    }

    struct FailingBackend;

    #[async_trait]
    impl CacheBackend for FailingBackend {
        async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            Err(CacheError::Unavailable("down".into()))
        }
        async fn set(&self, _key: &str, _value: &str, _ttl: u64) -> Result<(), CacheError> {
            Err(CacheError::Unavailable("down".into()))
        }
        async fn delete(&self, _key: &str) -> Result<(), CacheError> {
            Err(CacheError::Unavailable("down".into()))
        }
        async fn keys_matching(&self, _pattern: &str) -> Result<Vec<String>, CacheError> {
            Err(CacheError::Unavailable("down".into()))
        }
        async fn delete_matching(&self, _pattern: &str) -> Result<u64, CacheError> {
            Err(CacheError::Unavailable("down".into()))
        }
    }

    #[tokio::test]
    async fn test_unreachable_backend_passes_request_through() {
        let cache = ResponseCache::new(Arc::new(FailingBackend));
        let payload: Result<Value, CacheError> = cache
            .get_or_store("api:/api/jobs", 60, || async { Ok(json!({"ok": true})) })
            .await;
        assert_eq!(payload.unwrap(), json!({"ok": true}));
    }
}
