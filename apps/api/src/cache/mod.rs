//! Cache backend abstraction and key-matching.
//!
//! The backend contract mirrors what the invalidation layer needs: single
//! key get/set/delete plus glob enumeration and batch pattern deletes.
//! Backend failures never fail a request; callers log and degrade.

pub mod invalidate;
pub mod memory;
pub mod redis;
pub mod response;

use async_trait::async_trait;
use thiserror::Error;

pub use invalidate::CacheInvalidator;
pub use memory::MemoryCache;
pub use redis::RedisCache;
pub use response::ResponseCache;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] ::redis::RedisError),

    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Stores `value` under `key`, expiring after `ttl_seconds`.
    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    async fn keys_matching(&self, pattern: &str) -> Result<Vec<String>, CacheError>;

    /// Deletes every key matching the glob; returns how many were removed.
    /// Not atomic as a whole: a concurrent read between enumeration and
    /// deletion may still observe an entry, bounded by TTL.
    async fn delete_matching(&self, pattern: &str) -> Result<u64, CacheError>;
}

/// Redis-style glob matching, restricted to the `*` and `?` forms the
/// invalidation rules use.
pub fn glob_match(pattern: &str, key: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let key: Vec<char> = key.chars().collect();

    // Iterative backtracking over the single most recent `*`.
    let (mut p, mut k) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;

    while k < key.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == key[k]) {
            p += 1;
            k += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star = Some((p, k));
            p += 1;
        } else if let Some((star_p, star_k)) = star {
            p = star_p + 1;
            k = star_k + 1;
            star = Some((star_p, star_k + 1));
        } else {
            return false;
        }
    }
    while p < pattern.len() && pattern[p] == '*' {
        p += 1;
    }
    p == pattern.len()
}
